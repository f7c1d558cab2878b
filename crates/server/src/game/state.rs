use std::fmt;

/// Lifecycle of one event. `Finished` and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventState {
    NotStarted,
    Started,
    Finished,
    Cancelled,
}

impl EventState {
    pub fn is_terminal(self) -> bool {
        matches!(self, EventState::Finished | EventState::Cancelled)
    }

    /// A waiting event counts as running.
    pub fn is_running(self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventState::NotStarted => "not started",
            EventState::Started => "started",
            EventState::Finished => "finished",
            EventState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}
