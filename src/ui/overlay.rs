use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget},
};

use crate::app::App;
use crate::celebration::Explosion;
use crate::session::format_clock;
use crate::ui::layout;

const SPARK_COLORS: [Color; 6] = [
    Color::Yellow,
    Color::LightYellow,
    Color::Magenta,
    Color::Cyan,
    Color::Red,
    Color::Green,
];

const HINT_HELP: &str = " +/- zoom · drag pan · click fullscreen · esc close ";

/// Draws the explosion sparks on top of whatever is already in `buf`.
pub fn render_sparks(explosion: &Explosion, area: Rect, buf: &mut Buffer) {
    for spark in &explosion.sparks {
        if spark.x < 0.0 || spark.y < 0.0 {
            continue;
        }
        let (x, y) = (spark.x as u16, spark.y as u16);
        if x >= area.width || y >= area.height {
            continue;
        }

        let color = SPARK_COLORS[spark.color_index % SPARK_COLORS.len()];
        let life = spark.life();
        let style = if life > 0.7 {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else if life > 0.3 {
            Style::default().fg(color)
        } else {
            Style::default().fg(color).add_modifier(Modifier::DIM)
        };

        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_symbol(&spark.symbol.to_string());
            cell.set_style(style);
        }
    }
}

/// The success summary or the wrong-code notice.
pub fn render_result(app: &App, area: Rect, buf: &mut Buffer) {
    let frame = layout::result_frame(area);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let hint = Style::default()
        .add_modifier(Modifier::ITALIC)
        .add_modifier(Modifier::DIM);

    let (title, color, mut lines) = if app.modals.success {
        let secs = app.lock.displayed_secs();
        let mut lines = vec![
            Line::from(Span::styled("The chest is open!", bold.fg(Color::Green))),
            Line::from(""),
            Line::from(format!("time      {}", format_clock(secs))),
        ];
        if let Some(attempts) = app.lock.attempts() {
            lines.push(Line::from(format!("attempts  {}", attempts)));
        }
        (" unlocked ", Color::Green, lines)
    } else {
        let mut lines = vec![
            Line::from(Span::styled("Wrong code", bold.fg(Color::Red))),
            Line::from(""),
            Line::from("The lock does not budge."),
        ];
        if let Some(attempts) = app.lock.attempts() {
            lines.push(Line::from(format!("attempts  {}", attempts)));
        }
        (" locked ", Color::Red, lines)
    };
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        if app.modals.success {
            "(r) play again · (esc) close"
        } else {
            "(esc) close"
        },
        hint,
    )));

    Clear.render(frame, buf);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::bordered()
                .title_top(Line::from(title).centered())
                .border_style(Style::default().fg(color)),
        )
        .render(frame, buf);
}

/// The problem picture through the viewer transform.
pub fn render_hint(app: &App, area: Rect, buf: &mut Buffer) {
    let fullscreen = app.viewer.is_fullscreen();
    let frame = layout::hint_frame(area, fullscreen);
    let view = layout::hint_view(area, fullscreen);

    Clear.render(frame, buf);
    if !fullscreen {
        let zoom = format!(" problem · {:.0}% ", app.viewer.transform().scale * 100.0);
        Block::bordered()
            .title_top(Line::from(zoom).left_aligned())
            .title_bottom(Line::from(HINT_HELP).centered())
            .border_style(Style::default().fg(Color::Cyan))
            .render(frame, buf);
    }

    let transform = app.viewer.transform();
    let style = Style::default().fg(Color::White);
    for row in 0..view.height {
        for col in 0..view.width {
            let c = app.hint.sample(transform, view.width, view.height, col, row);
            if c == ' ' {
                continue;
            }
            if let Some(cell) = buf.cell_mut((view.x + col, view.y + row)) {
                cell.set_char(c);
                cell.set_style(style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::celebration::Spark;
    use crate::hint::HintArt;
    use crate::lock::LockAction;
    use crate::ui::tests::{rendered, test_app};
    use crate::viewer::{ViewerInput, WheelDirection};
    use std::time::Instant;

    #[test]
    fn test_success_modal_shows_time_and_attempts() {
        let mut app = test_app();
        let now = Instant::now();
        for c in "4152314".chars() {
            app.lock.apply(LockAction::Digit(c), now);
        }
        app.lock.apply(LockAction::Submit, now);
        app.modals.success = true;

        let text = rendered(&app, 80, 24);
        assert!(text.contains("The chest is open!"));
        assert!(text.contains("time      00:00"));
        assert!(text.contains("attempts  1"));
        assert!(text.contains("play again"));
    }

    #[test]
    fn test_failure_modal() {
        let mut app = test_app();
        let now = Instant::now();
        for c in "1234567".chars() {
            app.lock.apply(LockAction::Digit(c), now);
        }
        app.lock.apply(LockAction::Submit, now);
        app.modals.failure = true;

        let text = rendered(&app, 80, 24);
        assert!(text.contains("Wrong code"));
        assert!(text.contains("attempts  1"));
        assert!(!text.contains("play again"));
    }

    #[test]
    fn test_hint_modal_draws_art_and_zoom() {
        let mut app = test_app();
        app.hint = HintArt::from_text("XYZZY");
        app.open_hint();

        let text = rendered(&app, 80, 24);
        assert!(text.contains("XYZZY"));
        assert!(text.contains("problem · 100%"));

        app.viewer.handle(ViewerInput::Wheel(WheelDirection::In));
        let text = rendered(&app, 80, 24);
        assert!(text.contains("problem · 110%"));
    }

    #[test]
    fn test_fullscreen_hint_has_no_frame() {
        let mut app = test_app();
        app.hint = HintArt::from_text("XYZZY");
        app.open_hint();
        app.viewer.handle(ViewerInput::Tap);

        let text = rendered(&app, 80, 24);
        assert!(text.contains("XYZZY"));
        assert!(!text.contains("problem ·"));
        assert!(!text.contains("LOCKBOX"));
    }

    #[test]
    fn test_sparks_are_drawn_in_bounds() {
        let mut explosion = Explosion::new();
        explosion.start((5, 2), 10, 4, Instant::now());
        explosion.sparks.clear();
        explosion.sparks.push(Spark {
            x: 3.0,
            y: 1.0,
            vel_x: 0.0,
            vel_y: 0.0,
            symbol: '$',
            color_index: 0,
            age: 0.0,
            max_age: 2.0,
        });
        explosion.sparks.push(Spark {
            x: 50.0,
            y: -1.0,
            vel_x: 0.0,
            vel_y: 0.0,
            symbol: '*',
            color_index: 1,
            age: 0.0,
            max_age: 2.0,
        });

        let area = Rect::new(0, 0, 10, 4);
        let mut buffer = Buffer::empty(area);
        render_sparks(&explosion, area, &mut buffer);

        assert_eq!(buffer[(3, 1)].symbol(), "$");
        assert_eq!(buffer[(3, 1)].fg, Color::Yellow);
    }
}
