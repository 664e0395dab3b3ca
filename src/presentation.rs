use std::time::{Duration, Instant};

use crate::config::Config;

pub const SHAKE_MS: u64 = 500;
pub const KEY_FEEDBACK_MS: u64 = 150;

/// A one-shot presentation step that fires at a fixed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// First stage after a correct code: the explosion over the open chest.
    Reveal,
    /// Second stage: the success summary modal.
    Summary,
    ShakeEnd,
    KeyRelease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub reveal: Duration,
    pub summary: Duration,
    pub shake: Duration,
    pub key_feedback: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            reveal: Duration::from_millis(500),
            summary: Duration::from_millis(1000),
            shake: Duration::from_millis(SHAKE_MS),
            key_feedback: Duration::from_millis(KEY_FEEDBACK_MS),
        }
    }
}

impl From<&Config> for Timings {
    fn from(cfg: &Config) -> Self {
        Self {
            reveal: Duration::from_millis(cfg.reveal_delay_ms),
            summary: Duration::from_millis(cfg.summary_delay_ms),
            ..Self::default()
        }
    }
}

/// Pending cues, polled from the tick. Nothing here runs on its own.
#[derive(Debug, Default)]
pub struct Stage {
    pending: Vec<(Instant, Cue)>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, cue: Cue, at: Instant) {
        self.pending.push((at, cue));
    }

    /// Replaces any pending instance of `cue`.
    pub fn reschedule(&mut self, cue: Cue, at: Instant) {
        self.cancel(cue);
        self.schedule(cue, at);
    }

    /// Both stages of a success, measured from the moment of success.
    pub fn success(&mut self, now: Instant, timings: &Timings) {
        self.schedule(Cue::Reveal, now + timings.reveal);
        self.schedule(Cue::Summary, now + timings.summary);
    }

    pub fn failure(&mut self, now: Instant, timings: &Timings) {
        self.reschedule(Cue::ShakeEnd, now + timings.shake);
    }

    /// Removes and returns every cue due at `now`, earliest first.
    pub fn due(&mut self, now: Instant) -> Vec<Cue> {
        let mut fired: Vec<(Instant, Cue)> = Vec::new();
        self.pending.retain(|&(at, cue)| {
            if at <= now {
                fired.push((at, cue));
                false
            } else {
                true
            }
        });
        fired.sort_by_key(|&(at, _)| at);
        fired.into_iter().map(|(_, cue)| cue).collect()
    }

    pub fn cancel(&mut self, cue: Cue) {
        self.pending.retain(|&(_, pending)| pending != cue);
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, cue: Cue) -> bool {
        self.pending.iter().any(|&(_, pending)| pending == cue)
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}
