//! The application shell and its two threads.
//!
//! `App::run` owns startup: logging, subsystem banners, settings, then
//! either the winit event loop (windowed) or an inline render loop
//! (headless). The logical thread runs [`Engine::run`] and publishes
//! frames; the main thread consumes them through a [`RenderLoop`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

use silkweed_ecs::Engine;
use silkweed_graphics::{
    Extent2d, FrameSlot, RenderDevice, RenderResources, create_headless_device,
};

use crate::args::{AppArgs, WindowMode};
use crate::render_loop::{MISS_SLEEP, RenderLoop};

#[cfg(feature = "glow-window")]
use crate::gl_window::GlWindow;

/// Application shell tying a built [`Engine`] to a render loop.
///
/// The engine must have been built with a `LogicalRenderer` over the same
/// slot passed to [`run`](Self::run), and any materials its world uses must
/// come from the same resource bundle. The shell only wires threads and the
/// window; it does not create scene content.
pub struct App<A>
where
    A: AppArgs,
{
    args: A,
    engine: Option<Engine>,
    resources: Arc<RenderResources>,
    slot: Arc<FrameSlot>,
    stop: Arc<AtomicBool>,
    logical: Option<JoinHandle<Engine>>,
    window: Option<Window>,
    device: Option<Box<dyn RenderDevice>>,
    render_loop: Option<RenderLoop>,
    #[cfg(feature = "glow-window")]
    gl: Option<GlWindow>,
}

impl<A> App<A>
where
    A: AppArgs + 'static,
{
    /// Run the application.
    ///
    /// This is the main entry point. It initializes logging, logs the
    /// subsystem banners, stores the parsed settings in the world, then
    /// runs until the window closes, the stop flag is raised or the frame
    /// limit is reached.
    pub fn run(engine: Engine, resources: Arc<RenderResources>, slot: Arc<FrameSlot>, args: A) {
        // Initialize logging; a host that already installed a logger wins.
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();

        silkweed_core::init();
        silkweed_graphics::init();
        crate::init();

        let settings = args.settings();
        log::info!("settings loaded: {} entries", settings.len());

        let mut engine = engine;
        engine.world_mut().insert_resource(settings);

        if args.headless() {
            Self::run_headless(engine, resources, slot, &args);
            return;
        }

        let event_loop = match EventLoop::new() {
            Ok(event_loop) => event_loop,
            Err(error) => {
                log::error!("failed to create event loop: {error}");
                return;
            }
        };

        let stop = engine.stop_flag();
        let mut app = Self {
            args,
            engine: Some(engine),
            resources,
            slot,
            stop,
            logical: None,
            window: None,
            device: None,
            render_loop: None,
            #[cfg(feature = "glow-window")]
            gl: None,
        };
        if let Err(error) = event_loop.run_app(&mut app) {
            log::error!("event loop error: {error}");
        }
        app.shutdown();
    }

    /// Headless run: logical thread plus an inline render loop, no window.
    fn run_headless(engine: Engine, resources: Arc<RenderResources>, slot: Arc<FrameSlot>, args: &A) {
        log::info!("running headless");
        let stop = engine.stop_flag();
        let logical = spawn_logical(engine);

        let target_size = Extent2d::new(args.window_width(), args.window_height());
        let mut render_loop = RenderLoop::new(slot, resources, target_size);
        let mut device = create_headless_device();
        render_loop.run(device.as_mut(), &stop, args.max_frames());

        stop.store(true, Ordering::Relaxed);
        join_logical(logical);
    }

    /// Create the window plus whichever device this build can offer.
    fn init_window(&mut self, event_loop: &ActiveEventLoop, attributes: WindowAttributes) -> bool {
        #[cfg(feature = "glow-window")]
        {
            let Some((window, gl, device)) =
                GlWindow::create(event_loop, attributes, self.args.vsync())
            else {
                return false;
            };
            self.install_window(window, device);
            self.gl = Some(gl);
            true
        }

        #[cfg(not(feature = "glow-window"))]
        {
            let window = match event_loop.create_window(attributes) {
                Ok(window) => window,
                Err(error) => {
                    log::error!("failed to create window: {error}");
                    return false;
                }
            };
            log::info!("window created without a GL backend, drawing to the dummy device");
            self.install_window(window, create_headless_device());
            true
        }
    }

    fn install_window(&mut self, window: Window, device: Box<dyn RenderDevice>) {
        let size = window.inner_size();
        self.render_loop = Some(RenderLoop::new(
            Arc::clone(&self.slot),
            Arc::clone(&self.resources),
            Extent2d::new(size.width.max(1), size.height.max(1)),
        ));
        self.window = Some(window);
        self.device = Some(device);
    }

    /// Handle a resize event from the OS.
    fn handle_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        #[cfg(feature = "glow-window")]
        if let Some(gl) = &self.gl {
            gl.resize(width, height);
        }
        if let Some(render_loop) = &mut self.render_loop {
            render_loop.resize(Extent2d::new(width, height));
            log::debug!("render target resized to {width}x{height}");
        }
    }

    /// Pump the render loop once, presenting when a frame was drawn.
    fn redraw(&mut self) {
        let (Some(render_loop), Some(device)) =
            (self.render_loop.as_mut(), self.device.as_mut())
        else {
            return;
        };
        if render_loop.pump(device.as_mut()) {
            #[cfg(feature = "glow-window")]
            if let Some(gl) = &self.gl {
                gl.swap_buffers();
            }
        } else {
            std::thread::sleep(MISS_SLEEP);
        }
    }

    fn frame_limit_reached(&self) -> bool {
        match (self.args.max_frames(), &self.render_loop) {
            (Some(limit), Some(render_loop)) if render_loop.frames_rendered() >= limit => {
                log::info!("reached max frames limit ({limit}), exiting");
                true
            }
            _ => false,
        }
    }

    /// Stop the logical thread and log the final counters. Idempotent.
    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let Some(handle) = self.logical.take() else {
            return;
        };
        join_logical(handle);
        if let Some(render_loop) = &self.render_loop {
            let stats = self.slot.stats();
            log::info!(
                "render side done: {} drawn, {} published, {} dropped",
                render_loop.frames_rendered(),
                stats.published,
                stats.dropped
            );
        }
    }
}

impl<A> ApplicationHandler for App<A>
where
    A: AppArgs + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let mut attributes = Window::default_attributes()
            .with_title(self.args.window_title())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.args.window_width(),
                self.args.window_height(),
            ));

        match self.args.window_mode() {
            WindowMode::Windowed => {}
            WindowMode::Borderless => {
                attributes = attributes
                    .with_fullscreen(Some(winit::window::Fullscreen::Borderless(None)));
            }
            WindowMode::Fullscreen => {
                if let Some(monitor) = event_loop.primary_monitor() {
                    if let Some(mode) = monitor.video_modes().next() {
                        attributes = attributes
                            .with_fullscreen(Some(winit::window::Fullscreen::Exclusive(mode)));
                    }
                }
            }
        }

        if !self.init_window(event_loop, attributes) {
            log::error!("failed to initialize the window, exiting");
            event_loop.exit();
            return;
        }

        // The logical thread starts only once the render side exists, so
        // the first published frames have somewhere to go.
        if let Some(engine) = self.engine.take() {
            self.logical = Some(spawn_logical(engine));
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested");
                self.shutdown();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                self.handle_resize(size.width, size.height);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape)
                {
                    log::info!("escape pressed");
                    self.shutdown();
                    event_loop.exit();
                }
            }

            WindowEvent::RedrawRequested => {
                self.redraw();
                if self.frame_limit_reached() {
                    self.shutdown();
                    event_loop.exit();
                } else if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn spawn_logical(mut engine: Engine) -> JoinHandle<Engine> {
    std::thread::spawn(move || {
        if let Err(error) = engine.run() {
            log::error!("logical thread stopped with error: {error}");
        }
        engine
    })
}

fn join_logical(handle: JoinHandle<Engine>) {
    match handle.join() {
        Ok(engine) => log::info!(
            "logical thread joined: state {}, {} ticks",
            engine.state(),
            engine.world().current_tick()
        ),
        Err(_) => log::error!("logical thread panicked"),
    }
}
