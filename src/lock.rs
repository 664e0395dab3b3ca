use std::time::Instant;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::notify::CompletionEvent;
use crate::session::SessionState;
use crate::store::CompletionRecord;

pub const DEFAULT_CODE: &str = "4152314";

/// What a submit with fewer than N digits does.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ShortSubmitPolicy {
    /// Keep the buffer and do nothing.
    #[default]
    Ignore,
    /// Count the attempt, clear the buffer and report a failure.
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockAction {
    Digit(char),
    Clear,
    Submit,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPhase {
    Entering,
    Full,
    Locked,
}

/// Declarative results of a transition; the app turns these into IO and presentation.
#[derive(Debug, Clone, PartialEq)]
pub enum LockEffect {
    BufferChanged,
    Notify(CompletionEvent),
    PersistCompletion(CompletionRecord),
    Success {
        elapsed_secs: u64,
        attempts: Option<u32>,
    },
    Failure {
        attempts: Option<u32>,
    },
    ClearCompletion,
    ClockRestarted,
}

/// The digit buffer plus the code it is checked against.
#[derive(Debug, Clone)]
pub struct CodeBuffer {
    digits: String,
    target: String,
}

impl CodeBuffer {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            digits: String::new(),
            target: target.into(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.target.chars().count()
    }

    pub fn len(&self) -> usize {
        self.digits.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    fn push(&mut self, c: char) -> bool {
        if !c.is_ascii_digit() || self.is_full() {
            return false;
        }
        self.digits.push(c);
        true
    }

    fn clear(&mut self) {
        self.digits.clear();
    }

    fn matches(&self) -> bool {
        self.digits == self.target
    }

    /// Digits entered so far, padded with `pad` up to the code length.
    pub fn padded(&self, pad: char) -> String {
        let mut shown = self.digits.clone();
        shown.extend(std::iter::repeat(pad).take(self.capacity() - self.len()));
        shown
    }
}

/// Code entry controller: owns the buffer and the session, and is the only
/// place where the code is evaluated.
#[derive(Debug, Clone)]
pub struct LockController {
    pub buffer: CodeBuffer,
    pub session: SessionState,
    pub short_submit: ShortSubmitPolicy,
    track_attempts: bool,
}

impl LockController {
    pub fn new(
        code: impl Into<String>,
        short_submit: ShortSubmitPolicy,
        track_attempts: bool,
        now: Instant,
    ) -> Self {
        Self {
            buffer: CodeBuffer::new(code),
            session: SessionState::new(now, track_attempts),
            short_submit,
            track_attempts,
        }
    }

    pub fn phase(&self) -> LockPhase {
        if self.session.completed {
            LockPhase::Locked
        } else if self.buffer.is_full() {
            LockPhase::Full
        } else {
            LockPhase::Entering
        }
    }

    pub fn is_locked(&self) -> bool {
        self.session.completed
    }

    pub fn attempts(&self) -> Option<u32> {
        self.session.attempts
    }

    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        self.session.clock.elapsed_secs(now)
    }

    pub fn displayed_secs(&self) -> u64 {
        self.session.clock.displayed_secs
    }

    /// Samples the clock; stays frozen while locked.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        if self.is_locked() {
            return false;
        }
        self.session.clock.on_tick(now)
    }

    pub fn apply(&mut self, action: LockAction, now: Instant) -> Vec<LockEffect> {
        match action {
            LockAction::Digit(c) => self.digit(c),
            LockAction::Clear => self.clear(),
            LockAction::Submit => self.submit(now),
            LockAction::Reset => self.reset(now),
        }
    }

    fn digit(&mut self, c: char) -> Vec<LockEffect> {
        if self.is_locked() || !self.buffer.push(c) {
            return vec![];
        }
        vec![LockEffect::BufferChanged]
    }

    fn clear(&mut self) -> Vec<LockEffect> {
        if self.is_locked() {
            return vec![];
        }
        self.buffer.clear();
        vec![LockEffect::BufferChanged]
    }

    fn submit(&mut self, now: Instant) -> Vec<LockEffect> {
        if self.is_locked() {
            return vec![];
        }

        if !self.buffer.is_full() {
            return match self.short_submit {
                ShortSubmitPolicy::Ignore => vec![],
                ShortSubmitPolicy::Fail => {
                    self.session.count_attempt();
                    self.buffer.clear();
                    vec![
                        LockEffect::BufferChanged,
                        LockEffect::Failure {
                            attempts: self.attempts(),
                        },
                    ]
                }
            };
        }

        self.session.count_attempt();
        let matched = self.buffer.matches();
        self.buffer.clear();

        if !matched {
            tracing::debug!(attempts = ?self.attempts(), "wrong code submitted");
            return vec![
                LockEffect::BufferChanged,
                LockEffect::Failure {
                    attempts: self.attempts(),
                },
            ];
        }

        self.session.completed = true;
        let elapsed_secs = self.session.clock.stop(now);
        let attempts = self.attempts();
        tracing::info!(elapsed_secs, ?attempts, "lock opened");

        vec![
            LockEffect::BufferChanged,
            LockEffect::Notify(CompletionEvent::success(elapsed_secs, attempts)),
            LockEffect::PersistCompletion(CompletionRecord {
                elapsed_secs,
                attempts,
            }),
            LockEffect::Success {
                elapsed_secs,
                attempts,
            },
        ]
    }

    fn reset(&mut self, now: Instant) -> Vec<LockEffect> {
        self.buffer.clear();
        self.session = SessionState::new(now, self.track_attempts);
        tracing::info!("session reset");
        vec![
            LockEffect::BufferChanged,
            LockEffect::ClearCompletion,
            LockEffect::ClockRestarted,
        ]
    }
}
