//! # Silkweed App
//!
//! Application shell for Silkweed: command-line parsing, settings wiring
//! and the two-thread run loop (fixed-timestep logical thread plus a
//! render thread consuming published frames).
//!
//! ## Overview
//!
//! - [`AppArgs`] / [`DefaultAppArgs`] - clap-backed argument parsing that
//!   feeds [`GlobalSettings`](silkweed_core::GlobalSettings)
//! - [`RenderLoop`] - headless-capable frame consumption loop
//! - [`App`] - winit shell that spawns the logical thread and drives the
//!   render loop; `--headless` skips the window entirely
//!
//! ## Example
//!
//! ```ignore
//! use silkweed_app::{App, AppArgs, DefaultAppArgs};
//!
//! fn main() {
//!     let args = DefaultAppArgs::parse();
//!     let (engine, resources, slot) = build_scene();
//!     App::run(engine, resources, slot, args);
//! }
//! ```

mod app;
mod args;
#[cfg(feature = "glow-window")]
mod gl_window;
mod render_loop;

pub use app::App;
pub use args::{AppArgs, DefaultAppArgs, WindowMode};
pub use render_loop::{DEFAULT_UPLOAD_BUDGET, RenderLoop};

/// App library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the app version at startup.
pub fn init() {
    log::info!("Silkweed App v{} initialized", VERSION);
}
