//! Input event handlers
//!
//! Keys are resolved against the current state: overlays first, then the
//! configurable command bindings, then fixed navigation keys.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::event::KeyEventExt;
use crate::keymap::{Command, Keymap};
use crate::model::ActionKind;

use super::state::{preview_staged, AppState, Overlay, Panel, Prompt, StateKind, WorkspaceState};

/// Actions that can result from handling input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No action needed
    None,
    Quit,
    /// Re-read the whole repository
    Refresh,
    /// Send a mutation to the dispatcher
    Submit(ActionKind),
    /// Load the preview diff for a path
    LoadDiff { path: String, staged: bool },
    /// Show warning message
    ShowWarning(String),
}

/// Handle key events based on current state
pub fn handle_key(state: &mut AppState, key: KeyEvent, keymap: &Keymap) -> Action {
    match state.kind() {
        StateKind::Loading => {
            if key.is_quit() {
                Action::Quit
            } else {
                Action::None
            }
        }
        StateKind::Error => Action::Quit,
        StateKind::Workspace => {
            if let AppState::Workspace(ws) = state {
                handle_workspace_key(ws, key, keymap)
            } else {
                Action::None
            }
        }
        StateKind::Quitting => Action::None,
    }
}

fn handle_workspace_key(ws: &mut WorkspaceState, key: KeyEvent, keymap: &Keymap) -> Action {
    match ws.overlay.clone() {
        Overlay::Input { prompt, text } => return handle_input_key(ws, prompt, text, key),
        Overlay::ConfirmDelete { branch } => return handle_confirm_key(ws, branch, key),
        Overlay::None => {}
    }

    if let Some(command) = keymap.lookup(&key) {
        return run_command(ws, command);
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('j') | KeyCode::Down, _) => {
            ws.cursor_down();
            selection_diff(ws)
        }
        (KeyCode::Char('k') | KeyCode::Up, _) => {
            ws.cursor_up();
            selection_diff(ws)
        }
        (KeyCode::Tab, _) => {
            ws.focus = ws.focus.next();
            Action::None
        }
        (KeyCode::BackTab, _) => {
            ws.focus = ws.focus.prev();
            Action::None
        }
        (KeyCode::PageDown, _) | (KeyCode::Char('d'), KeyModifiers::CONTROL) => {
            if let Some(view) = ws.diff.as_mut() {
                view.scroll = view.scroll.saturating_add(10);
            }
            Action::None
        }
        (KeyCode::PageUp, _) | (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
            if let Some(view) = ws.diff.as_mut() {
                view.scroll = view.scroll.saturating_sub(10);
            }
            Action::None
        }
        (KeyCode::Char(' '), _) if ws.focus == Panel::Files => toggle_stage(ws),
        (KeyCode::Enter, _) if ws.focus == Panel::Branches => checkout_selected(ws),
        _ => Action::None,
    }
}

fn run_command(ws: &mut WorkspaceState, command: Command) -> Action {
    match command {
        Command::Quit => Action::Quit,
        Command::Refresh => Action::Refresh,
        Command::Commit => {
            ws.open_prompt(Prompt::Commit, "");
            Action::None
        }
        Command::AmendCommit => match ws.snapshot.commits.first() {
            Some(head) => {
                let message = head.message.clone();
                ws.open_prompt(Prompt::Amend, message);
                Action::None
            }
            None => Action::ShowWarning("No commit to amend".to_string()),
        },
        Command::Stash => {
            ws.open_prompt(Prompt::Stash, "");
            Action::None
        }
        Command::NewBranch => {
            ws.open_prompt(Prompt::NewBranch, "");
            Action::None
        }
        Command::Ignore => match ws.selected_file() {
            Some(file) if ws.focus == Panel::Files => Action::Submit(ActionKind::Ignore {
                path: file.path.clone(),
            }),
            _ => Action::ShowWarning("Select a file to ignore".to_string()),
        },
        Command::DeleteBranch => match ws.selected_branch() {
            Some((branch, false)) if ws.focus == Panel::Branches => {
                ws.overlay = Overlay::ConfirmDelete {
                    branch: branch.name.clone(),
                };
                Action::None
            }
            Some((_, true)) if ws.focus == Panel::Branches => {
                Action::ShowWarning("Remote branches cannot be deleted here".to_string())
            }
            _ => Action::ShowWarning("Select a local branch to delete".to_string()),
        },
    }
}

fn handle_input_key(ws: &mut WorkspaceState, prompt: Prompt, mut text: String, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Esc => {
            ws.close_overlay();
            Action::None
        }
        KeyCode::Enter => {
            ws.close_overlay();
            let action = match prompt {
                Prompt::Commit => ActionKind::Commit { message: text },
                Prompt::Amend => ActionKind::Amend { message: text },
                Prompt::NewBranch => ActionKind::CreateBranch {
                    name: text.trim().to_string(),
                    start_point: None,
                },
                Prompt::Stash => ActionKind::Stash {
                    message: Some(text).filter(|m| !m.trim().is_empty()),
                },
            };
            Action::Submit(action)
        }
        KeyCode::Backspace => {
            text.pop();
            ws.open_prompt(prompt, text);
            Action::None
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            text.push(c);
            ws.open_prompt(prompt, text);
            Action::None
        }
        _ => Action::None,
    }
}

fn handle_confirm_key(ws: &mut WorkspaceState, branch: String, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('y') => {
            ws.close_overlay();
            Action::Submit(ActionKind::DeleteBranch { name: branch })
        }
        KeyCode::Char('n') | KeyCode::Esc | KeyCode::Char('q') => {
            ws.close_overlay();
            Action::None
        }
        _ => Action::None,
    }
}

fn toggle_stage(ws: &WorkspaceState) -> Action {
    let Some(file) = ws.selected_file() else {
        return Action::None;
    };
    let paths = vec![file.path.clone()];
    // Staging a conflicted file marks it resolved. Any other file with a
    // staged half unstages first, so `MM` cycles through ` M` back to `M `.
    if file.is_staged() && !file.conflicted {
        Action::Submit(ActionKind::Unstage { paths })
    } else {
        Action::Submit(ActionKind::Stage { paths })
    }
}

fn checkout_selected(ws: &WorkspaceState) -> Action {
    let Some((branch, remote)) = ws.selected_branch() else {
        return Action::None;
    };
    let name = if remote {
        // origin/topic checks out a local topic tracking it
        match branch.name.split_once('/') {
            Some((_, short)) => short.to_string(),
            None => branch.name.clone(),
        }
    } else {
        branch.name.clone()
    };
    Action::Submit(ActionKind::Checkout { branch: name })
}

/// Diff to load after the file cursor moved
pub fn selection_diff(ws: &WorkspaceState) -> Action {
    if ws.focus != Panel::Files || ws.diff_matches_selection() {
        return Action::None;
    }
    match ws.selected_file() {
        Some(file) => Action::LoadDiff {
            path: file.path.clone(),
            staged: preview_staged(file),
        },
        None => Action::None,
    }
}
