//! Terminal input decoding: keys to intents, mouse to viewer gestures.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::lock::LockAction;
use crate::viewer::{Point, PointerId, ViewerInput, WheelDirection};

pub const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);
/// Movement (in cells) above which a press is a drag, not a tap.
pub const TAP_SLOP: f64 = 1.0;

pub const MOUSE_POINTER: PointerId = 0;
/// Stand-in for a second finger, pinned at the view centre while Ctrl is held.
pub const ANCHOR_POINTER: PointerId = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    Lock(LockAction),
    Viewer(ViewerInput),
    ToggleHint,
    CloseTop,
    Quit,
}

/// Which views are up when a key arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyContext {
    pub hint_open: bool,
    pub hint_fullscreen: bool,
    pub result_open: bool,
}

pub fn key_intent(key: &KeyEvent, ctx: KeyContext) -> Option<Intent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Intent::Quit);
    }

    match key.code {
        KeyCode::Char(c) if c.is_ascii_digit() => Some(Intent::Lock(LockAction::Digit(c))),
        KeyCode::Enter => Some(Intent::Lock(LockAction::Submit)),
        KeyCode::Backspace | KeyCode::Delete => Some(Intent::Lock(LockAction::Clear)),
        KeyCode::Esc => {
            if ctx.hint_open && ctx.hint_fullscreen {
                Some(Intent::Viewer(ViewerInput::Cancel))
            } else if ctx.hint_open || ctx.result_open {
                Some(Intent::CloseTop)
            } else {
                Some(Intent::Quit)
            }
        }
        KeyCode::Char('h') => Some(Intent::ToggleHint),
        KeyCode::Char('r') => Some(Intent::Lock(LockAction::Reset)),
        KeyCode::Char('q') if !ctx.hint_open && !ctx.result_open => Some(Intent::Quit),
        KeyCode::Char('q') => Some(Intent::CloseTop),
        KeyCode::Char('+') | KeyCode::Char('=') if ctx.hint_open => {
            Some(Intent::Viewer(ViewerInput::Wheel(WheelDirection::In)))
        }
        KeyCode::Char('-') if ctx.hint_open => {
            Some(Intent::Viewer(ViewerInput::Wheel(WheelDirection::Out)))
        }
        KeyCode::Char('f') if ctx.hint_open => Some(Intent::Viewer(ViewerInput::Tap)),
        _ => None,
    }
}

pub fn mouse_point(ev: &MouseEvent) -> Point {
    Point::new(ev.column as f64, ev.row as f64)
}

/// Pointer and wheel input for the hint view. Ctrl+drag pinches around `anchor`.
pub fn mouse_to_viewer(ev: &MouseEvent, anchor: Point) -> Vec<ViewerInput> {
    let at = mouse_point(ev);
    match ev.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let mut inputs = vec![ViewerInput::PointerDown {
                id: MOUSE_POINTER,
                at,
            }];
            if ev.modifiers.contains(KeyModifiers::CONTROL) {
                inputs.push(ViewerInput::PointerDown {
                    id: ANCHOR_POINTER,
                    at: anchor,
                });
            }
            inputs
        }
        MouseEventKind::Drag(MouseButton::Left) => vec![ViewerInput::PointerMove {
            id: MOUSE_POINTER,
            at,
        }],
        MouseEventKind::Up(MouseButton::Left) => vec![
            ViewerInput::PointerUp { id: ANCHOR_POINTER },
            ViewerInput::PointerUp { id: MOUSE_POINTER },
        ],
        MouseEventKind::ScrollUp => vec![ViewerInput::Wheel(WheelDirection::In)],
        MouseEventKind::ScrollDown => vec![ViewerInput::Wheel(WheelDirection::Out)],
        _ => vec![],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapEvent {
    Tap,
    DoubleTap,
}

/// Turns press/release pairs into taps and double taps.
///
/// A single tap is held back for [`DOUBLE_TAP_WINDOW`] so that the first half of
/// a double tap never toggles anything; [`TapRecognizer::poll`] releases it.
#[derive(Debug, Default)]
pub struct TapRecognizer {
    press: Option<Point>,
    dragged: bool,
    pending_since: Option<Instant>,
}

impl TapRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn down(&mut self, at: Point) {
        self.press = Some(at);
        self.dragged = false;
    }

    pub fn moved(&mut self, at: Point) {
        if let Some(start) = self.press {
            if start.distance(at) > TAP_SLOP {
                self.dragged = true;
            }
        }
    }

    pub fn up(&mut self, now: Instant) -> Option<TapEvent> {
        let pressed = self.press.take().is_some();
        if !pressed || self.dragged {
            return None;
        }
        match self.pending_since.take() {
            Some(first) if now.duration_since(first) <= DOUBLE_TAP_WINDOW => Some(TapEvent::DoubleTap),
            // an expired tap that was never polled goes out now
            Some(_) => {
                self.pending_since = Some(now);
                Some(TapEvent::Tap)
            }
            None => {
                self.pending_since = Some(now);
                None
            }
        }
    }

    pub fn poll(&mut self, now: Instant) -> Option<TapEvent> {
        match self.pending_since {
            Some(first) if now.duration_since(first) > DOUBLE_TAP_WINDOW => {
                self.pending_since = None;
                Some(TapEvent::Tap)
            }
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Feeds a mouse event; returns a double tap as soon as it is recognised.
    pub fn feed(&mut self, ev: &MouseEvent, now: Instant) -> Option<TapEvent> {
        match ev.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.down(mouse_point(ev));
                None
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.moved(mouse_point(ev));
                None
            }
            MouseEventKind::Up(MouseButton::Left) => self.up(now),
            _ => None,
        }
    }
}
