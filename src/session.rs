use std::time::{Duration, Instant};

/// Where a solve attempt currently is, derived from which timestamps are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Running,
    Stopped,
}

/// Start/stop instants of the current attempt.
///
/// `stopped_at` is only ever set while `started_at` is set, and never before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    started_at: Option<Instant>,
    stopped_at: Option<Instant>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn stopped_at(&self) -> Option<Instant> {
        self.stopped_at
    }

    pub fn phase(&self) -> Phase {
        match (self.started_at, self.stopped_at) {
            (Some(_), None) => Phase::Running,
            (Some(_), Some(_)) => Phase::Stopped,
            _ => Phase::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase() == Phase::Running
    }

    /// Begins a new attempt, discarding any previous stop. Ignored while running.
    pub fn start(&mut self, at: Instant) -> bool {
        if self.is_running() {
            return false;
        }
        self.started_at = Some(at);
        self.stopped_at = None;
        true
    }

    /// Ends the running attempt and returns its duration.
    ///
    /// Returns `None` (and changes nothing) unless the session is running, so a
    /// replayed stop never yields a second duration.
    pub fn stop(&mut self, at: Instant) -> Option<Duration> {
        let started_at = match (self.started_at, self.stopped_at) {
            (Some(started_at), None) => started_at,
            _ => return None,
        };
        let at = at.max(started_at);
        self.stopped_at = Some(at);
        Some(at - started_at)
    }

    /// Clears both timestamps. Only has an effect once the attempt has stopped.
    pub fn reset(&mut self) -> bool {
        if self.phase() != Phase::Stopped {
            return false;
        }
        self.started_at = None;
        self.stopped_at = None;
        true
    }

    /// Time since start while running, the final duration once stopped.
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        match (self.started_at, self.stopped_at) {
            (Some(started_at), None) => Some(now.saturating_duration_since(started_at)),
            (Some(started_at), Some(stopped_at)) => Some(stopped_at - started_at),
            _ => None,
        }
    }
}
