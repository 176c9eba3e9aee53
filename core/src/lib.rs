//! # Silkweed Engine Core
//!
//! Core crate for Silkweed Engine: math aliases, the time-budgeted worker
//! queue, the background task runner, the fixed-timestep clock and the
//! global settings store.

pub mod math;
pub mod settings;
pub mod task_runner;
pub mod time;
pub mod worker_queue;

pub use settings::{GlobalSettings, SettingValue};
pub use task_runner::TaskRunner;
pub use time::TickClock;
pub use worker_queue::WorkerQueue;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core version at startup.
pub fn init() {
    log::info!("Silkweed Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
