//! Workspace screen rendering
//!
//! Branches over stashes on the left, the diff preview in the middle, working tree files
//! over commit history on the right, help and status along the bottom.

use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame,
};

use crate::app::state::{DiffView, Overlay, Panel, WorkspaceState};
use crate::keymap::{Command, Keymap};
use crate::model::{DiffLine, FileStatus, StatusMessage};
use crate::ui::theme;
use crate::util::time::format_age;

use super::common::{get_spinner_frame, panel, status_spans, truncate};
use super::dialog::{render_confirm_delete, render_prompt};

/// Render the workspace screen
pub fn render_workspace(
    frame: &mut Frame,
    ws: &mut WorkspaceState,
    keymap: &Keymap,
    status_message: Option<&StatusMessage>,
    tick_count: u64,
) {
    let area = frame.area();
    let rows = Layout::vertical([Constraint::Min(3), Constraint::Length(3)]).split(area);
    let columns = Layout::horizontal([
        Constraint::Percentage(20),
        Constraint::Percentage(60),
        Constraint::Percentage(20),
    ])
    .split(rows[0]);
    let left = Layout::vertical([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(columns[0]);
    let right = Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[2]);

    render_branches(frame, ws, left[0]);
    render_stashes(frame, ws, left[1]);
    render_diff(frame, ws, columns[1]);
    render_files(frame, ws, right[0]);
    render_commits(frame, ws, right[1]);
    render_help_bar(frame, ws, keymap, status_message, rows[1], tick_count);

    match &ws.overlay {
        Overlay::None => {}
        Overlay::Input { prompt, text } => render_prompt(frame, *prompt, text, area),
        Overlay::ConfirmDelete { branch } => render_confirm_delete(frame, branch, area),
    }
}

fn highlight() -> Style {
    Style::default()
        .bg(theme::BG_HIGHLIGHT)
        .fg(theme::CURSOR)
        .add_modifier(Modifier::BOLD)
}

fn render_branches(frame: &mut Frame, ws: &mut WorkspaceState, area: Rect) {
    let snapshot = ws.snapshot.clone();

    let local = snapshot.local_branches.iter().map(|branch| {
        let (marker, color) = if branch.is_head {
            ("*", theme::BRANCH_HEAD)
        } else {
            (" ", theme::TEXT)
        };
        Row::new(vec![
            Span::styled(marker, Style::default().fg(color)),
            Span::styled(branch.name.clone(), Style::default().fg(color)),
        ])
    });
    let remote = snapshot.remote_branches.iter().map(|branch| {
        Row::new(vec![
            Span::raw(" "),
            Span::styled(branch.name.clone(), Style::default().fg(theme::BRANCH_REMOTE)),
        ])
    });
    let rows: Vec<Row> = local.chain(remote).collect();

    let title = format!(" Branches ({}) ", snapshot.head.label());
    let table = Table::new(rows, [Constraint::Length(1), Constraint::Min(5)])
        .block(panel(title, ws.focus == Panel::Branches))
        .row_highlight_style(highlight());

    frame.render_stateful_widget(table, area, &mut ws.branches.table_state);
}

/// Read-only; stashes are created with the stash key and never applied here
fn render_stashes(frame: &mut Frame, ws: &WorkspaceState, area: Rect) {
    let stashes = &ws.snapshot.stashes;
    let block = panel(format!(" Stashes ({}) ", stashes.len()), false);

    if stashes.is_empty() {
        let msg = Paragraph::new("No stashes")
            .style(Style::default().fg(theme::TEXT_DIM))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(msg, area);
        return;
    }

    let rows: Vec<Row> = stashes
        .iter()
        .map(|stash| {
            Row::new(vec![
                Span::styled(stash.refname(), Style::default().fg(theme::SHA)),
                Span::styled(stash.message.clone(), Style::default().fg(theme::TEXT)),
            ])
        })
        .collect();
    let table = Table::new(rows, [Constraint::Length(10), Constraint::Min(5)]).block(block);
    frame.render_widget(table, area);
}

fn file_color(file: &FileStatus) -> ratatui::style::Color {
    if file.conflicted {
        theme::CONFLICTED
    } else if file.is_untracked() {
        theme::UNTRACKED
    } else if file.is_staged() && !file.has_worktree_changes() {
        theme::STAGED
    } else {
        theme::MODIFIED
    }
}

fn render_files(frame: &mut Frame, ws: &mut WorkspaceState, area: Rect) {
    let snapshot = ws.snapshot.clone();
    let rows: Vec<Row> = snapshot
        .files
        .iter()
        .map(|file| {
            let color = file_color(file);
            Row::new(vec![
                Span::styled(file.code(), Style::default().fg(color)),
                Span::styled(file.path.clone(), Style::default().fg(theme::TEXT)),
            ])
        })
        .collect();

    let title = format!(" Files ({} staged) ", snapshot.staged_count());
    let block = panel(title, ws.focus == Panel::Files);

    if rows.is_empty() {
        let msg = Paragraph::new("Working tree clean")
            .style(Style::default().fg(theme::SUCCESS))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(msg, area);
        return;
    }

    let table = Table::new(rows, [Constraint::Length(3), Constraint::Min(5)])
        .block(block)
        .row_highlight_style(highlight());

    frame.render_stateful_widget(table, area, &mut ws.files.table_state);
}

fn render_commits(frame: &mut Frame, ws: &mut WorkspaceState, area: Rect) {
    let snapshot = ws.snapshot.clone();
    let now = Utc::now();
    let width = area.width.saturating_sub(20) as usize;

    let rows: Vec<Row> = snapshot
        .commits
        .iter()
        .map(|commit| {
            let summary_color = if commit.is_merge() {
                theme::TEXT_DIM
            } else {
                theme::TEXT
            };
            Row::new(vec![
                Span::styled(commit.short_sha().to_string(), Style::default().fg(theme::SHA)),
                Span::styled(
                    truncate(commit.summary(), width.max(10)),
                    Style::default().fg(summary_color),
                ),
                Span::styled(
                    format_age(commit.date, now),
                    Style::default().fg(theme::TEXT_DIM),
                ),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(7),
        Constraint::Min(10),
        Constraint::Length(10),
    ];
    let table = Table::new(rows, widths)
        .block(panel(" Commits ".to_string(), ws.focus == Panel::Commits))
        .row_highlight_style(highlight());

    frame.render_stateful_widget(table, area, &mut ws.commits.table_state);
}

fn diff_lines(view: &DiffView) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for file in &view.diff.files {
        let header = match &file.old_path {
            Some(old) => format!("{} -> {}", old, file.path),
            None => file.path.clone(),
        };
        lines.push(Line::from(vec![
            Span::styled(
                header,
                Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" +{}", file.additions), Style::default().fg(theme::DIFF_ADD)),
            Span::styled(format!(" -{}", file.deletions), Style::default().fg(theme::DIFF_DEL)),
        ]));

        if file.is_binary {
            lines.push(Line::from(Span::styled(
                "Binary file",
                Style::default().fg(theme::TEXT_DIM),
            )));
            continue;
        }

        for hunk in &file.hunks {
            lines.push(Line::from(Span::styled(
                hunk.header(),
                Style::default().fg(theme::DIFF_HUNK),
            )));
            for line in &hunk.lines {
                let color = match line {
                    DiffLine::Addition(_) => theme::DIFF_ADD,
                    DiffLine::Deletion(_) => theme::DIFF_DEL,
                    DiffLine::Context(_) => theme::TEXT_MUTED,
                };
                lines.push(Line::from(Span::styled(
                    format!("{}{}", line.prefix(), line.content()),
                    Style::default().fg(color),
                )));
            }
        }
    }

    lines
}

fn render_diff(frame: &mut Frame, ws: &WorkspaceState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER))
        .title_style(Style::default().fg(theme::TEXT));

    let Some(view) = &ws.diff else {
        let msg = Paragraph::new("Select a file to preview its changes")
            .style(Style::default().fg(theme::TEXT_DIM))
            .alignment(Alignment::Center)
            .block(block.title(" Diff "));
        frame.render_widget(msg, area);
        return;
    };

    let (additions, deletions) = view.diff.totals();
    let title = format!(
        " {} ({}) +{} -{} ",
        view.path,
        if view.staged { "staged" } else { "unstaged" },
        additions,
        deletions
    );

    if view.diff.is_empty() {
        let msg = Paragraph::new("No changes")
            .style(Style::default().fg(theme::TEXT_DIM))
            .alignment(Alignment::Center)
            .block(block.title(title));
        frame.render_widget(msg, area);
        return;
    }

    let paragraph = Paragraph::new(diff_lines(view))
        .block(block.title(title))
        .scroll((view.scroll, 0));
    frame.render_widget(paragraph, area);
}

/// Render the help bar
fn render_help_bar(
    frame: &mut Frame,
    ws: &WorkspaceState,
    keymap: &Keymap,
    status_message: Option<&StatusMessage>,
    area: Rect,
    tick_count: u64,
) {
    let mut shortcuts: Vec<(String, &str)> = vec![
        ("j/k".to_string(), "nav"),
        ("tab".to_string(), "focus"),
        ("space".to_string(), "stage"),
        ("enter".to_string(), "checkout"),
    ];
    for command in Command::ALL {
        if let Some(key) = keymap.key_for(command) {
            shortcuts.push((key.to_string(), command.description()));
        }
    }

    let mut spans: Vec<Span> = shortcuts
        .into_iter()
        .flat_map(|(key, desc)| {
            vec![
                Span::styled(key, Style::default().fg(theme::KEY_HINT)),
                Span::styled(format!(" {} ", desc), Style::default().fg(theme::TEXT_DIM)),
            ]
        })
        .collect();

    if ws.in_flight > 0 {
        spans.push(Span::styled(
            format!(" | {} {} running", get_spinner_frame(tick_count), ws.in_flight),
            Style::default().fg(theme::INFO),
        ));
    }

    if let Some(msg) = status_message {
        spans.extend(status_spans(msg, tick_count));
    }

    let help = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::BORDER)),
    );

    frame.render_widget(help, area);
}
