use std::fmt;

/// Lifecycle phase of an [`Engine`](super::Engine).
///
/// The machine only walks forward: `Initialized -> Starting -> Running ->
/// Stopping -> Stopped`. Skipping a phase or moving backwards is rejected
/// with [`EngineError::IllegalTransition`](super::EngineError::IllegalTransition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    Initialized,
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl EngineState {
    /// Whether the machine may move from `self` to `next`.
    pub fn can_transition_to(self, next: EngineState) -> bool {
        matches!(
            (self, next),
            (EngineState::Initialized, EngineState::Starting)
                | (EngineState::Starting, EngineState::Running)
                | (EngineState::Running, EngineState::Stopping)
                | (EngineState::Stopping, EngineState::Stopped)
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            EngineState::Initialized => "initialized",
            EngineState::Starting => "starting",
            EngineState::Running => "running",
            EngineState::Stopping => "stopping",
            EngineState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Event sent through the world for every completed state transition.
///
/// Subscribers observe these via `Events<EngineStateChanged>`; the channel is
/// registered by the engine builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStateChanged {
    pub from: EngineState,
    pub to: EngineState,
}
