//! Fixed-timestep accumulation for the logical loop.

use std::time::Duration;

/// Accumulates wall-clock time and emits whole fixed-dt ticks.
///
/// When more than one tick's worth of time has passed, several ticks are
/// emitted back-to-back up to the catch-up cap; backlog beyond the cap is
/// discarded so one long stall cannot snowball into a tick avalanche.
pub struct TickClock {
    fixed_dt: Duration,
    max_catch_up: u32,
    accumulator: Duration,
    total_ticks: u64,
}

impl TickClock {
    pub fn new(fixed_dt: Duration, max_catch_up: u32) -> Self {
        debug_assert!(!fixed_dt.is_zero());
        Self {
            fixed_dt,
            max_catch_up: max_catch_up.max(1),
            accumulator: Duration::ZERO,
            total_ticks: 0,
        }
    }

    /// Standard 60 Hz clock with a 5-tick catch-up cap.
    pub fn sixty_hz() -> Self {
        Self::new(Duration::from_secs(1) / 60, 5)
    }

    pub fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    pub fn dt_seconds(&self) -> f32 {
        self.fixed_dt.as_secs_f32()
    }

    /// Total ticks emitted over the clock's lifetime.
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Add elapsed wall-clock time, returning how many fixed ticks to run now.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;
        let mut ticks = 0;
        while self.accumulator >= self.fixed_dt && ticks < self.max_catch_up {
            self.accumulator -= self.fixed_dt;
            ticks += 1;
        }
        if self.accumulator >= self.fixed_dt {
            log::trace!(
                "dropping {:?} of tick backlog after {} catch-up ticks",
                self.accumulator,
                ticks
            );
            self.accumulator = Duration::ZERO;
        }
        self.total_ticks += u64::from(ticks);
        ticks
    }
}
