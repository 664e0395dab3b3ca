pub mod layout;
pub mod overlay;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

use crate::app::App;
use crate::session::format_clock;
use layout::{button_rect, MainLayout, KEYPAD};

const CHEST_CLOSED: [&str; 5] = [
    r"   __________________   ",
    r"  /                  \  ",
    r" |=======[ () ]=======| ",
    r" |                    | ",
    r" |____________________| ",
];

const CHEST_OPEN: [&str; 5] = [
    r"  *   .   $   *   $   . ",
    r"  ____________________  ",
    r" |=======[ <> ]=======| ",
    r" |   $$   $$$$   $$   | ",
    r" |____________________| ",
];

const LEGEND: &str = "0-9 type · enter submit · backspace clear · (h)int · (r)eset · (esc) quit";

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layout = MainLayout::new(area);

        render_header(self, &layout, buf);
        render_chest(self, layout.chest, buf);
        render_display(self, layout.display, buf);
        render_keypad(self, layout.keypad, buf);

        let italic_dim = Style::default()
            .add_modifier(Modifier::ITALIC)
            .add_modifier(Modifier::DIM);
        let record = match &self.previous {
            Some(record) => Span::styled(record.to_string(), Style::default().fg(Color::Cyan)),
            None => Span::styled("no escape recorded yet", italic_dim),
        };
        Paragraph::new(record)
            .alignment(Alignment::Center)
            .render(layout.record, buf);
        Paragraph::new(Span::styled(LEGEND, italic_dim))
            .alignment(Alignment::Center)
            .render(layout.legend, buf);

        if self.explosion.is_active() {
            overlay::render_sparks(&self.explosion, area, buf);
        }
        if self.modals.success || self.modals.failure {
            overlay::render_result(self, area, buf);
        }
        if self.modals.hint {
            overlay::render_hint(self, area, buf);
        }
    }
}

fn render_header(app: &App, layout: &MainLayout, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);

    Paragraph::new(Span::styled(" LOCKBOX", bold.fg(Color::Yellow))).render(layout.header, buf);

    let mut clock = vec![Span::styled(
        format!("⏱ {}", format_clock(app.lock.displayed_secs())),
        bold,
    )];
    if let Some(attempts) = app.lock.attempts() {
        clock.push(Span::raw(format!("   attempts: {}", attempts)));
    }
    Paragraph::new(Line::from(clock))
        .alignment(Alignment::Center)
        .render(layout.header, buf);

    let hint_style = if app.modals.hint {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default().fg(Color::Cyan)
    };
    Paragraph::new(Span::styled("[ hint ]", hint_style))
        .alignment(Alignment::Right)
        .render(layout.hint_button, buf);
}

fn render_chest(app: &App, area: Rect, buf: &mut Buffer) {
    let (art, style) = if app.chest_open {
        (
            CHEST_OPEN,
            Style::default()
                .fg(Color::LightYellow)
                .add_modifier(Modifier::BOLD),
        )
    } else if app.shaking {
        (CHEST_CLOSED, Style::default().fg(Color::Red))
    } else {
        (CHEST_CLOSED, Style::default().fg(Color::Yellow))
    };

    let height = (art.len() as u16).min(area.height);
    let top = area.y + (area.height - height) / 2;
    let mut target = Rect::new(area.x, top, area.width, height);
    if app.shaking && area.width > 2 {
        // nudge the centre one cell left or right every tick
        target.width -= 2;
        if app.frame % 2 == 0 {
            target.x += 2;
        }
    }

    let lines: Vec<Line> = art
        .iter()
        .map(|row| Line::from(Span::styled(*row, style)))
        .collect();
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(target, buf);
}

fn render_display(app: &App, area: Rect, buf: &mut Buffer) {
    let block = Block::bordered()
        .title_top(Line::from(" code ").left_aligned())
        .border_style(Style::default().add_modifier(Modifier::DIM));

    let text = if app.lock.is_locked() {
        Span::styled(
            "unlocked",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        let padded = app.lock.buffer.padded('·');
        let spaced = padded
            .chars()
            .map(String::from)
            .collect::<Vec<_>>()
            .join(" ");
        let style = if app.shaking {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        Span::styled(spaced, style)
    };

    Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(block)
        .render(area, buf);
}

fn render_keypad(app: &App, area: Rect, buf: &mut Buffer) {
    let locked = app.lock.is_locked();

    for (r, keys) in KEYPAD.iter().enumerate() {
        for (c, &key) in keys.iter().enumerate() {
            let rect = button_rect(area, r, c);
            if rect.is_empty() {
                continue;
            }

            let style = if app.pressed == Some(key) {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else if locked {
                Style::default().add_modifier(Modifier::DIM)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };

            Paragraph::new(key.label())
                .alignment(Alignment::Center)
                .style(style)
                .block(Block::bordered().border_style(style))
                .render(rect, buf);
        }
    }
}
