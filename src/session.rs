use std::time::{Duration, Instant};

/// Elapsed-time bookkeeping for one escape attempt.
///
/// The clock never ticks on its own: elapsed time is always derived from
/// `now - started_at`, and the tick driver samples it into `displayed_secs`.
#[derive(Debug, Clone)]
pub struct SessionClock {
    pub started_at: Instant,
    pub stopped_at: Option<Instant>,
    pub displayed_secs: u64,
}

impl SessionClock {
    pub fn start(now: Instant) -> Self {
        Self {
            started_at: now,
            stopped_at: None,
            displayed_secs: 0,
        }
    }

    /// Whole seconds between the session start and `now`, frozen once stopped.
    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        let end = self.stopped_at.unwrap_or(now);
        elapsed_secs(self.started_at, end)
    }

    /// Samples the clock. Returns true if the displayed value changed.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        if self.is_stopped() {
            return false;
        }
        let secs = self.elapsed_secs(now);
        if secs != self.displayed_secs {
            self.displayed_secs = secs;
            return true;
        }
        false
    }

    pub fn stop(&mut self, now: Instant) -> u64 {
        if self.stopped_at.is_none() {
            self.stopped_at = Some(now);
        }
        self.displayed_secs = self.elapsed_secs(now);
        self.displayed_secs
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped_at.is_some()
    }
}

pub fn elapsed_secs(started_at: Instant, now: Instant) -> u64 {
    now.checked_duration_since(started_at)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// `MM:SS`, minutes are not capped at 99.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub clock: SessionClock,
    pub completed: bool,
    pub attempts: Option<u32>,
}

impl SessionState {
    pub fn new(now: Instant, track_attempts: bool) -> Self {
        Self {
            clock: SessionClock::start(now),
            completed: false,
            attempts: track_attempts.then_some(0),
        }
    }

    pub fn count_attempt(&mut self) {
        if let Some(attempts) = self.attempts.as_mut() {
            *attempts += 1;
        }
    }
}
