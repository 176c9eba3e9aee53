//! Real GL window plumbing behind the `glow-window` feature.
//!
//! glutin owns context and swapchain creation; winit owns the window. The
//! device leaves this module as a plain `RenderDevice`, so nothing outside
//! it knows which backend is live.

use std::ffi::CString;
use std::num::NonZeroU32;

use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ContextAttributesBuilder, PossiblyCurrentContext};
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use glutin_winit::DisplayBuilder;
use glutin_winit::GlWindow as _;

use winit::event_loop::ActiveEventLoop;
use winit::raw_window_handle::HasWindowHandle;
use winit::window::{Window, WindowAttributes};

use silkweed_graphics::RenderDevice;
use silkweed_graphics::backend::GlowDevice;

/// A live GL surface and its current context.
pub(crate) struct GlWindow {
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
}

impl GlWindow {
    /// Create the window, a current GL context and a device over it.
    ///
    /// Every step logs its own failure and bails; the caller only learns
    /// that windowed startup did not happen.
    pub(crate) fn create(
        event_loop: &ActiveEventLoop,
        attributes: WindowAttributes,
        vsync: bool,
    ) -> Option<(Window, Self, Box<dyn RenderDevice>)> {
        let template = ConfigTemplateBuilder::new().with_depth_size(24);
        let builder = DisplayBuilder::new().with_window_attributes(Some(attributes));
        let (window, config) = match builder.build(event_loop, template, |configs| {
            // glutin yields at least one config for a template it accepted
            configs
                .reduce(|best, candidate| {
                    if candidate.num_samples() < best.num_samples() {
                        candidate
                    } else {
                        best
                    }
                })
                .expect("no matching GL config")
        }) {
            Ok((Some(window), config)) => (window, config),
            Ok((None, _)) => {
                log::error!("display builder produced no window");
                return None;
            }
            Err(error) => {
                log::error!("failed to create GL display: {error}");
                return None;
            }
        };

        let display = config.display();
        let raw_handle = match window.window_handle() {
            Ok(handle) => handle.as_raw(),
            Err(error) => {
                log::error!("failed to get window handle: {error}");
                return None;
            }
        };

        let context_attributes = ContextAttributesBuilder::new().build(Some(raw_handle));
        let not_current = match unsafe { display.create_context(&config, &context_attributes) } {
            Ok(context) => context,
            Err(error) => {
                log::error!("failed to create GL context: {error}");
                return None;
            }
        };

        let surface_attributes =
            match window.build_surface_attributes(SurfaceAttributesBuilder::default()) {
                Ok(attributes) => attributes,
                Err(error) => {
                    log::error!("failed to build surface attributes: {error}");
                    return None;
                }
            };
        let surface = match unsafe { display.create_window_surface(&config, &surface_attributes) }
        {
            Ok(surface) => surface,
            Err(error) => {
                log::error!("failed to create GL surface: {error}");
                return None;
            }
        };

        let context = match not_current.make_current(&surface) {
            Ok(context) => context,
            Err(error) => {
                log::error!("failed to make GL context current: {error}");
                return None;
            }
        };

        let interval = if vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(error) = surface.set_swap_interval(&context, interval) {
            log::warn!("failed to set swap interval: {error}");
        }

        let device = unsafe {
            GlowDevice::new(|symbol| match CString::new(symbol) {
                Ok(symbol) => display.get_proc_address(&symbol),
                Err(_) => std::ptr::null(),
            })
        };

        Some((window, Self { surface, context }, Box::new(device)))
    }

    /// Resize the swapchain; zero dimensions are ignored.
    pub(crate) fn resize(&self, width: u32, height: u32) {
        if let (Some(width), Some(height)) = (NonZeroU32::new(width), NonZeroU32::new(height)) {
            self.surface.resize(&self.context, width, height);
        }
    }

    /// Present the last drawn frame.
    pub(crate) fn swap_buffers(&self) {
        if let Err(error) = self.surface.swap_buffers(&self.context) {
            log::warn!("swap_buffers failed: {error}");
        }
    }
}
