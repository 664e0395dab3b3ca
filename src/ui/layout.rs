//! Screen geometry shared by rendering and mouse hit testing.

use ratatui::layout::{Constraint, Direction, Layout, Margin, Position, Rect};

use crate::lock::LockAction;

pub const BUTTON_WIDTH: u16 = 7;
pub const BUTTON_HEIGHT: u16 = 3;
const BUTTON_GAP: u16 = 1;
pub const KEYPAD_WIDTH: u16 = BUTTON_WIDTH * 3 + BUTTON_GAP * 2;
pub const KEYPAD_HEIGHT: u16 = BUTTON_HEIGHT * 4;

const HINT_BUTTON_WIDTH: u16 = 10;
const RESULT_WIDTH: u16 = 40;
const RESULT_HEIGHT: u16 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypadKey {
    Digit(char),
    Clear,
    Submit,
}

pub const KEYPAD: [[KeypadKey; 3]; 4] = [
    [
        KeypadKey::Digit('1'),
        KeypadKey::Digit('2'),
        KeypadKey::Digit('3'),
    ],
    [
        KeypadKey::Digit('4'),
        KeypadKey::Digit('5'),
        KeypadKey::Digit('6'),
    ],
    [
        KeypadKey::Digit('7'),
        KeypadKey::Digit('8'),
        KeypadKey::Digit('9'),
    ],
    [KeypadKey::Clear, KeypadKey::Digit('0'), KeypadKey::Submit],
];

impl KeypadKey {
    pub fn label(self) -> String {
        match self {
            KeypadKey::Digit(c) => c.to_string(),
            KeypadKey::Clear => "C".to_string(),
            KeypadKey::Submit => "⏎".to_string(),
        }
    }

    pub fn action(self) -> LockAction {
        match self {
            KeypadKey::Digit(c) => LockAction::Digit(c),
            KeypadKey::Clear => LockAction::Clear,
            KeypadKey::Submit => LockAction::Submit,
        }
    }

    /// The button that lights up for a keyboard action, if any.
    pub fn for_action(action: LockAction) -> Option<Self> {
        match action {
            LockAction::Digit(c) if c.is_ascii_digit() => Some(KeypadKey::Digit(c)),
            LockAction::Digit(_) | LockAction::Reset => None,
            LockAction::Clear => Some(KeypadKey::Clear),
            LockAction::Submit => Some(KeypadKey::Submit),
        }
    }
}

/// Regions of the main screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainLayout {
    pub header: Rect,
    pub hint_button: Rect,
    pub chest: Rect,
    pub display: Rect,
    pub keypad: Rect,
    pub record: Rect,
    pub legend: Rect,
}

impl MainLayout {
    pub fn new(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),             // title, timer, hint button
                Constraint::Min(0),                // chest
                Constraint::Length(3),             // code display
                Constraint::Length(KEYPAD_HEIGHT), // keypad
                Constraint::Length(1),             // previous record
                Constraint::Length(1),             // legend
            ])
            .split(area);

        let header = chunks[0];
        let hint_width = HINT_BUTTON_WIDTH.min(header.width);
        let hint_button = Rect::new(
            header.x + header.width - hint_width,
            header.y,
            hint_width,
            header.height,
        );

        Self {
            header,
            hint_button,
            chest: chunks[1],
            display: centered_horizontally(chunks[2], KEYPAD_WIDTH),
            keypad: centered_horizontally(chunks[3], KEYPAD_WIDTH),
            record: chunks[4],
            legend: chunks[5],
        }
    }
}

fn centered_horizontally(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect::new(area.x + (area.width - width) / 2, area.y, width, area.height)
}

/// A `width` x `height` rect in the middle of `area`, shrunk to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

pub fn button_rect(keypad: Rect, row: usize, col: usize) -> Rect {
    let x = keypad.x + col as u16 * (BUTTON_WIDTH + BUTTON_GAP);
    let y = keypad.y + row as u16 * BUTTON_HEIGHT;
    Rect::new(x, y, BUTTON_WIDTH, BUTTON_HEIGHT).intersection(keypad)
}

pub fn key_at(keypad: Rect, column: u16, row: u16) -> Option<KeypadKey> {
    let pos = Position::new(column, row);
    KEYPAD.iter().enumerate().find_map(|(r, keys)| {
        keys.iter().enumerate().find_map(|(c, &key)| {
            let rect = button_rect(keypad, r, c);
            (!rect.is_empty() && rect.contains(pos)).then_some(key)
        })
    })
}

/// Outer frame of the hint view; fullscreen takes the whole terminal.
pub fn hint_frame(area: Rect, fullscreen: bool) -> Rect {
    if fullscreen {
        area
    } else {
        centered(area, area.width * 4 / 5, area.height * 4 / 5)
    }
}

/// Cells the hint art is drawn into.
pub fn hint_view(area: Rect, fullscreen: bool) -> Rect {
    let frame = hint_frame(area, fullscreen);
    if fullscreen {
        frame
    } else {
        frame.inner(Margin::new(1, 1))
    }
}

pub fn result_frame(area: Rect) -> Rect {
    centered(area, RESULT_WIDTH, RESULT_HEIGHT)
}
