//! Modal prompts drawn over the workspace

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::state::Prompt;
use crate::ui::theme;

use super::common::centered;

fn dialog_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::ACCENT))
        .title(format!(" {} ", title))
        .title_style(Style::default().fg(theme::TEXT))
        .style(Style::default().bg(theme::BG_DARK))
}

/// Render a single-line text prompt
pub fn render_prompt(frame: &mut Frame, prompt: Prompt, text: &str, area: Rect) {
    let dialog_area = centered(area, 60, 5);
    frame.render_widget(Clear, dialog_area);

    let lines = vec![
        Line::from(vec![
            Span::styled(text.to_string(), Style::default().fg(theme::TEXT)),
            Span::styled("_", Style::default().fg(theme::CURSOR)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("enter", Style::default().fg(theme::SUCCESS)),
            Span::styled(" confirm  ", Style::default().fg(theme::TEXT_DIM)),
            Span::styled("esc", Style::default().fg(theme::ERROR)),
            Span::styled(" cancel", Style::default().fg(theme::TEXT_DIM)),
        ]),
    ];

    let dialog = Paragraph::new(lines).block(dialog_block(prompt.title()));
    frame.render_widget(dialog, dialog_area);
}

/// Render the branch deletion confirmation
pub fn render_confirm_delete(frame: &mut Frame, branch: &str, area: Rect) {
    let dialog_area = centered(area, 50, 6);
    frame.render_widget(Clear, dialog_area);

    let lines = vec![
        Line::from(vec![
            Span::styled("Delete branch ", Style::default().fg(theme::TEXT)),
            Span::styled(
                branch.to_string(),
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("?", Style::default().fg(theme::TEXT)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(theme::SUCCESS)),
            Span::styled(" confirm  ", Style::default().fg(theme::TEXT_DIM)),
            Span::styled("n/q", Style::default().fg(theme::ERROR)),
            Span::styled(" cancel", Style::default().fg(theme::TEXT_DIM)),
        ]),
    ];

    let dialog = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(dialog_block("Confirm"));
    frame.render_widget(dialog, dialog_area);
}
