use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use typewave::session::{Phase, Session, Verdict};

use crate::{App, Screen};

const HORIZONTAL_MARGIN: u16 = 5;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen {
            Screen::Typing => render_typing(self, area, buf),
            Screen::Results => render_results(self, area, buf),
        }
    }
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let target = session.target_text();
    let mut prompt_occupied_lines =
        ((target.width() as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16;
    if target.width() <= max_chars_per_line as usize {
        prompt_occupied_lines = 1;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(
                ((area.height as f64 - prompt_occupied_lines as f64) / 2.0).max(0.0) as u16,
            ),
            Constraint::Length(2),
            Constraint::Length(prompt_occupied_lines),
            Constraint::Length(2),
        ])
        .split(area);

    let header = match session.phase {
        Phase::Idle => "start typing to begin".to_string(),
        _ => format!("{:.0}s", session.time_left()),
    };
    Paragraph::new(Span::styled(
        header,
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Line::from(prompt_spans(session)))
        .wrap(Wrap { trim: false })
        .render(chunks[2], buf);

    if session.phase == Phase::Running {
        let live = format!(
            "{} wpm   {:.0}% err",
            session.live_wpm(),
            session.live_error_rate()
        );
        Paragraph::new(Span::styled(
            live,
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }
}

fn prompt_spans(session: &Session) -> Vec<Span<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let green = bold.fg(Color::Green);
    let red = bold.fg(Color::Red);
    let dim = bold.add_modifier(Modifier::DIM);
    let cursor_style = dim.add_modifier(Modifier::UNDERLINED);

    session
        .slots
        .iter()
        .enumerate()
        .map(|(idx, slot)| {
            let style = match slot.verdict {
                Verdict::Correct => green,
                Verdict::Incorrect => red,
                Verdict::Pending if idx == session.cursor => cursor_style,
                Verdict::Pending => dim,
            };
            // Render a missed space as a visible mark so the error shows up.
            let shown = if slot.verdict == Verdict::Incorrect && slot.expected == ' ' {
                '·'
            } else {
                slot.expected
            };
            Span::styled(shown.to_string(), style)
        })
        .collect()
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let magenta = Style::default().fg(Color::Magenta);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let italic = Style::default().add_modifier(Modifier::ITALIC);

    let mut lines: Vec<Line> = Vec::new();

    if let Some(record) = app.session.outcome() {
        lines.push(Line::from(Span::styled(
            format!("{:.0} wpm", record.wpm),
            bold.fg(Color::Green),
        )));
        lines.push(Line::from(Span::styled(
            format!("{:.1}% error rate", record.error_rate),
            bold,
        )));
        lines.push(Line::from(format!(
            "{} errors over {:.0}s",
            record.error_count, record.duration_secs
        )));
    }

    if let Some(eval) = &app.evaluation {
        if let Some(def) = eval.notification {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("achievement unlocked: {}", def.name),
                magenta.add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(def.subtitle.to_string(), magenta)));
            if eval.newly_unlocked.len() > 1 {
                lines.push(Line::from(Span::styled(
                    format!("(+{} more)", eval.newly_unlocked.len() - 1),
                    magenta,
                )));
            }
        }
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("(r)etry / (q)uit", italic)));

    let height = lines.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}
