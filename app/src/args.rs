//! Command line arguments and settings wiring.
//!
//! Uses clap for CLI parsing with help text, validation and clear error
//! messages. Parsed arguments feed the [`GlobalSettings`] store that the
//! shell and the engine wiring read at startup.

use clap::Parser;
use silkweed_core::settings::{
    GlobalSettings, RESOURCE_ROOT, WINDOW_FULLSCREEN, WINDOW_HEIGHT, WINDOW_VSYNC, WINDOW_WIDTH,
};

/// Window mode enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowMode {
    /// Windowed mode with decorations.
    #[default]
    Windowed,
    /// Borderless fullscreen.
    Borderless,
    /// Exclusive fullscreen.
    Fullscreen,
}

/// Trait for parsing command line arguments.
///
/// Implement this trait to customize how your application handles command
/// line arguments. The trait provides defaults for all methods except
/// `parse`, making it easy to override only the options you need.
///
/// # Example
///
/// ```ignore
/// use silkweed_app::{AppArgs, WindowMode};
///
/// struct MyArgs {
///     fullscreen: bool,
/// }
///
/// impl AppArgs for MyArgs {
///     fn parse() -> Self {
///         let args: Vec<String> = std::env::args().collect();
///         Self {
///             fullscreen: args.contains(&"--fullscreen".to_string()),
///         }
///     }
///
///     fn window_mode(&self) -> WindowMode {
///         if self.fullscreen {
///             WindowMode::Borderless
///         } else {
///             WindowMode::Windowed
///         }
///     }
/// }
/// ```
pub trait AppArgs: Sized {
    /// Parse command line arguments.
    fn parse() -> Self;

    /// Get the window mode.
    ///
    /// Default: `WindowMode::Windowed`
    fn window_mode(&self) -> WindowMode {
        WindowMode::Windowed
    }

    /// Get the initial window width.
    ///
    /// Default: 1280
    fn window_width(&self) -> u32 {
        1280
    }

    /// Get the initial window height.
    ///
    /// Default: 720
    fn window_height(&self) -> u32 {
        720
    }

    /// Get the window title.
    ///
    /// Default: "Silkweed App"
    fn window_title(&self) -> &str {
        "Silkweed App"
    }

    /// Get whether VSync is enabled.
    ///
    /// Default: true
    fn vsync(&self) -> bool {
        true
    }

    /// Get whether to run without a window.
    ///
    /// In headless mode the shell skips winit entirely and consumes frames
    /// with the recording dummy device on the calling thread.
    ///
    /// Default: false
    fn headless(&self) -> bool {
        false
    }

    /// Get the maximum number of frames to render before auto-exit.
    ///
    /// This is useful for automated testing to verify that the application
    /// can start, simulate and render without errors.
    ///
    /// Default: `None` (run indefinitely)
    fn max_frames(&self) -> Option<u64> {
        None
    }

    /// Get the root directory for file-backed assets.
    ///
    /// Default: "assets"
    fn resource_root(&self) -> &str {
        "assets"
    }

    /// Raw `key=value` overrides applied to the settings store last.
    ///
    /// Default: empty
    fn setting_overrides(&self) -> &[String] {
        &[]
    }

    /// Build the settings store: well-known keys first, raw overrides last.
    fn settings(&self) -> GlobalSettings {
        let mut settings = GlobalSettings::new();
        settings.set(WINDOW_WIDTH, i64::from(self.window_width()));
        settings.set(WINDOW_HEIGHT, i64::from(self.window_height()));
        settings.set(
            WINDOW_FULLSCREEN,
            self.window_mode() != WindowMode::Windowed,
        );
        settings.set(WINDOW_VSYNC, self.vsync());
        settings.set(RESOURCE_ROOT, self.resource_root());
        settings.apply_overrides(self.setting_overrides().iter().map(String::as_str));
        settings
    }
}

// ============================================================================
// Default implementation backed by clap
// ============================================================================

/// Silkweed engine application arguments.
#[derive(Parser, Debug)]
#[command(
    name = "Silkweed App",
    about = "Silkweed Engine application",
    long_about = "A Silkweed Engine application.\n\n\
        The shell runs two threads: a fixed-timestep logical thread that\n\
        simulates the world and publishes frames, and a render thread that\n\
        consumes them. With --headless no window is opened and frames are\n\
        drawn by the recording dummy device.\n\
        \n\
        EXAMPLES:\n\
          # Windowed run\n\
          ./app --width 1920 --height 1080\n\
        \n\
          # Headless smoke test\n\
          ./app --headless --max-frames 100\n\
        \n\
          # Override any setting\n\
          ./app --set window.vsync=false --set resources.root=data",
    version
)]
struct ClapArgs {
    /// Run in borderless fullscreen mode.
    #[arg(long)]
    fullscreen: bool,

    /// Initial window width in pixels.
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial window height in pixels.
    #[arg(long, default_value = "720")]
    height: u32,

    /// Disable vertical sync (may cause tearing).
    #[arg(long)]
    no_vsync: bool,

    /// Run without a window; frames go to the recording dummy device.
    #[arg(long)]
    headless: bool,

    /// Exit after rendering N frames (useful for testing).
    #[arg(long)]
    max_frames: Option<u64>,

    /// Root directory for file-backed assets.
    #[arg(long, default_value = "assets")]
    resources: String,

    /// Apply a key=value settings override (repeatable).
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
}

/// Default command line arguments implementation.
///
/// Uses clap for CLI parsing with help text. Values can also be set in
/// code through the `with_*` builders, which is how demos pin their own
/// defaults before honoring user flags.
///
/// # Examples
///
/// ```bash
/// # Show help
/// ./my_app --help
///
/// # Run in fullscreen without vsync
/// ./my_app --fullscreen --no-vsync
///
/// # Run headless for 100 frames then exit (useful for testing)
/// ./my_app --headless --max-frames 100
/// ```
#[derive(Debug, Clone)]
pub struct DefaultAppArgs {
    window_mode: WindowMode,
    width: u32,
    height: u32,
    title: String,
    vsync: bool,
    headless: bool,
    max_frames: Option<u64>,
    resource_root: String,
    overrides: Vec<String>,
}

impl Default for DefaultAppArgs {
    fn default() -> Self {
        Self {
            window_mode: WindowMode::Windowed,
            width: 1280,
            height: 720,
            title: "Silkweed App".to_string(),
            vsync: true,
            headless: false,
            max_frames: None,
            resource_root: "assets".to_string(),
            overrides: Vec::new(),
        }
    }
}

impl DefaultAppArgs {
    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the window size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Force headless mode on or off.
    #[must_use]
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the maximum number of frames.
    #[must_use]
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }
}

impl From<ClapArgs> for DefaultAppArgs {
    fn from(args: ClapArgs) -> Self {
        if args.fullscreen && args.headless {
            log::warn!("--fullscreen has no effect in headless mode");
        }
        Self {
            window_mode: if args.fullscreen {
                WindowMode::Borderless
            } else {
                WindowMode::Windowed
            },
            width: args.width,
            height: args.height,
            title: "Silkweed App".to_string(),
            vsync: !args.no_vsync,
            headless: args.headless,
            max_frames: args.max_frames,
            resource_root: args.resources,
            overrides: args.set,
        }
    }
}

impl AppArgs for DefaultAppArgs {
    fn parse() -> Self {
        ClapArgs::parse().into()
    }

    fn window_mode(&self) -> WindowMode {
        self.window_mode
    }

    fn window_width(&self) -> u32 {
        self.width
    }

    fn window_height(&self) -> u32 {
        self.height
    }

    fn window_title(&self) -> &str {
        &self.title
    }

    fn vsync(&self) -> bool {
        self.vsync
    }

    fn headless(&self) -> bool {
        self.headless
    }

    fn max_frames(&self) -> Option<u64> {
        self.max_frames
    }

    fn resource_root(&self) -> &str {
        &self.resource_root
    }

    fn setting_overrides(&self) -> &[String] {
        &self.overrides
    }
}
