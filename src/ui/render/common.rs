//! Common rendering utilities

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::model::{StatusLevel, StatusMessage};
use crate::ui::theme;

/// Spinner animation frames
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Get the current spinner frame based on tick count
pub fn get_spinner_frame(tick: u64) -> &'static str {
    SPINNER_FRAMES[(tick as usize / 2) % SPINNER_FRAMES.len()]
}

/// Shorten `text` to at most `max` characters, marking the cut with "..."
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Bordered panel, highlighted when it has focus
pub fn panel(title: String, focused: bool) -> Block<'static> {
    let border = if focused {
        theme::BORDER_FOCUSED
    } else {
        theme::BORDER
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title)
        .title_style(Style::default().fg(theme::TEXT))
}

/// Status message spans for the help bar
pub fn status_spans(msg: &StatusMessage, tick_count: u64) -> Vec<Span<'static>> {
    let color = match msg.level {
        StatusLevel::Info => theme::INFO,
        StatusLevel::Success => theme::SUCCESS,
        StatusLevel::Warning => theme::WARNING,
        StatusLevel::Error => theme::ERROR,
    };
    // Info messages stand for work in progress
    let spinner = if msg.level == StatusLevel::Info {
        format!("{} ", get_spinner_frame(tick_count))
    } else {
        String::new()
    };
    vec![Span::styled(
        format!(" | {}{}", spinner, msg.text),
        Style::default().fg(color),
    )]
}

/// Area of `width` x `height` centered in `area`
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

/// Render loading screen
pub fn render_loading(frame: &mut Frame, message: &str, tick_count: u64) {
    let spinner = get_spinner_frame(tick_count);

    let text = vec![
        Line::from(vec![
            Span::styled(spinner, Style::default().fg(theme::ACCENT)),
            Span::styled(format!(" {}", message), Style::default().fg(theme::TEXT)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Press q or Ctrl+C to cancel",
            Style::default().fg(theme::TEXT_DIM),
        )),
    ];

    render_centered_text(frame, text);
}

/// Render error screen
pub fn render_error(frame: &mut Frame, error: &str) {
    let text = vec![
        Line::from(Span::styled(
            format!("Error: {}", error),
            Style::default().fg(theme::ERROR),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to exit",
            Style::default().fg(theme::TEXT_DIM),
        )),
    ];

    render_centered_text(frame, text);
}

fn render_centered_text(frame: &mut Frame, text: Vec<Line<'_>>) {
    let paragraph = Paragraph::new(text).alignment(Alignment::Center);

    let chunks = Layout::vertical([
        Constraint::Percentage(40),
        Constraint::Length(3),
        Constraint::Percentage(40),
    ])
    .split(frame.area());

    frame.render_widget(paragraph, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer message", 8), "a lon...");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }

    #[test]
    fn test_centered_fits_inside() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(centered(area, 20, 4), Rect::new(10, 3, 20, 4));
        assert_eq!(centered(area, 80, 20), area);
    }
}
