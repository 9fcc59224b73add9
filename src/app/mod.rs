//! Application core module
//!
//! This module contains the main application logic, including:
//! - `App`: The main application struct
//! - `state`: State types for the loading, error and workspace screens
//! - `handler`: Input event handling

pub mod handler;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::engine::ChangeKind;
use crate::error::{AppError, AppResult};
use crate::event::{poll_event, TermEvent};
use crate::keymap::Keymap;
use crate::model::{ActionKind, ScopeSet, StatusMessage};
use crate::tui::Tui;
use crate::ui::render;
use crate::workspace::Workspace;

pub use handler::Action;
pub use state::{AppState, TaskResult, WorkspaceState};

/// Main application struct
pub struct App {
    /// Directory the repository is opened from
    path: PathBuf,
    config: Config,
    keymap: Keymap,
    /// Current state
    state: AppState,
    /// Open repository, once loading finished
    workspace: Option<Arc<Workspace>>,
    /// Status message to display
    status_message: Option<StatusMessage>,
    /// Tick count for animations
    tick_count: u64,
    /// Channel for receiving task results
    task_rx: mpsc::UnboundedReceiver<TaskResult>,
    /// Channel for sending task results
    task_tx: mpsc::UnboundedSender<TaskResult>,
}

impl App {
    /// Create a new application instance
    pub fn new(path: PathBuf, config: Config) -> Self {
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let keymap = Keymap::from_config(&config.bindings);
        Self {
            path,
            config,
            keymap,
            state: AppState::Loading,
            workspace: None,
            status_message: None,
            tick_count: 0,
            task_rx,
            task_tx,
        }
    }

    /// Run the application main loop
    pub async fn run(&mut self, tui: &mut Tui) -> AppResult<()> {
        // Open the repository in background
        self.spawn_open();

        loop {
            // Check for quit state
            if matches!(self.state, AppState::Quitting) {
                break;
            }

            // Draw the UI
            tui.draw(|frame| self.render(frame))?;

            // Poll for input (non-blocking with short timeout)
            match poll_event(Duration::from_millis(16)) {
                Some(TermEvent::Key(key)) => self.handle_key(key),
                Some(TermEvent::Resize) | None => {}
            }

            // Check for background task results (non-blocking)
            while let Ok(result) = self.task_rx.try_recv() {
                self.handle_task_result(result);
            }

            // Increment tick for animations
            self.tick_count = self.tick_count.wrapping_add(1);

            // Clear expired status messages
            if let Some(ref msg) = self.status_message {
                if msg.is_expired() {
                    self.status_message = None;
                }
            }
        }

        self.close().await;
        Ok(())
    }

    /// Render the application UI
    fn render(&mut self, frame: &mut ratatui::Frame) {
        match &mut self.state {
            AppState::Loading => {
                render::render_loading(frame, "Opening repository...", self.tick_count);
            }
            AppState::Error(msg) => {
                render::render_error(frame, msg);
            }
            AppState::Workspace(ws) => {
                render::render_workspace(
                    frame,
                    ws,
                    &self.keymap,
                    self.status_message.as_ref(),
                    self.tick_count,
                );
            }
            AppState::Quitting => {}
        }
    }

    /// Handle a key event
    fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
        let action = handler::handle_key(&mut self.state, key, &self.keymap);
        self.execute_action(action);
    }

    /// Execute an action returned from input handling
    fn execute_action(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Quit => {
                self.state = AppState::Quitting;
            }
            Action::Refresh => {
                if let Some(workspace) = &self.workspace {
                    self.status_message = Some(StatusMessage::info("Refreshing..."));
                    workspace.refresh();
                }
            }
            Action::Submit(kind) => self.submit(kind),
            Action::LoadDiff { path, staged } => self.spawn_load_diff(path, staged),
            Action::ShowWarning(msg) => {
                self.status_message = Some(StatusMessage::warning(msg));
            }
        }
    }

    /// Hand a mutation to the dispatcher and report its outcome when done
    fn submit(&mut self, kind: ActionKind) {
        let Some(workspace) = &self.workspace else {
            return;
        };
        if let AppState::Workspace(ws) = &mut self.state {
            ws.in_flight += 1;
        }

        let description = kind.to_string();
        let ticket = workspace.submit(kind);
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let outcome = ticket.wait().await;
            let _ = tx.send(TaskResult::ActionDone {
                description,
                outcome,
            });
        });
    }

    /// Handle a result from a background task
    fn handle_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Opened(Ok(workspace)) => {
                let workspace = Arc::new(workspace);
                let ws = WorkspaceState::new(workspace.snapshot());
                self.spawn_forward_events(&workspace);
                self.workspace = Some(workspace);

                let preview = handler::selection_diff(&ws);
                self.state = AppState::Workspace(Box::new(ws));
                self.execute_action(preview);
            }
            TaskResult::Opened(Err(e)) => {
                self.state = AppState::Error(format!("Failed to open repository: {}", e));
            }
            TaskResult::Change(event) => self.handle_change(event.kind),
            TaskResult::DiffLoaded {
                path,
                staged,
                result,
            } => {
                let AppState::Workspace(ws) = &mut self.state else {
                    return;
                };
                // Replies can overtake each other; keep only the current selection's
                if !ws.wants_diff(&path, staged) {
                    debug!(path = %path, staged, "Dropping diff for a stale selection");
                    return;
                }
                match result {
                    Ok(diff) => {
                        // Keep the scroll position when the same diff reloads
                        let scroll = match &ws.diff {
                            Some(view) if view.path == path && view.staged == staged => view.scroll,
                            _ => 0,
                        };
                        ws.diff = Some(state::DiffView {
                            path,
                            staged,
                            diff,
                            scroll,
                        });
                    }
                    Err(e) => {
                        self.status_message =
                            Some(StatusMessage::error(format!("Failed to load diff: {}", e)));
                    }
                }
            }
            TaskResult::ActionDone {
                description,
                outcome,
            } => {
                if let AppState::Workspace(ws) = &mut self.state {
                    ws.in_flight = ws.in_flight.saturating_sub(1);
                }
                self.status_message = Some(match outcome {
                    Ok(Some(note)) => StatusMessage::success(note),
                    Ok(None) => StatusMessage::success(format!("Done: {}", description)),
                    Err(AppError::Cancelled) => StatusMessage::warning("Action cancelled"),
                    Err(e) => StatusMessage::error(e.to_string()),
                });
            }
        }
    }

    fn handle_change(&mut self, kind: ChangeKind) {
        match kind {
            ChangeKind::SnapshotUpdated { generation } => {
                let (Some(workspace), AppState::Workspace(ws)) = (&self.workspace, &mut self.state)
                else {
                    return;
                };
                debug!(generation, "Applying snapshot");
                ws.update_snapshot(workspace.snapshot());
                if matches!(
                    self.status_message.as_ref(),
                    Some(msg) if msg.text == "Refreshing..."
                ) {
                    self.status_message = None;
                }

                // File contents may have changed under an unchanged status
                let reload = ws
                    .selected_file()
                    .map(|file| (file.path.clone(), state::preview_staged(file)));
                match reload {
                    Some((path, staged)) => self.spawn_load_diff(path, staged),
                    None => ws.diff = None,
                }
            }
            ChangeKind::RefreshFailed { error } => {
                warn!(error = %error, "Refresh failed");
                self.status_message =
                    Some(StatusMessage::error(format!("Refresh failed: {}", error)));
            }
            // Outcomes are reported through the action tickets
            ChangeKind::ActionRejected { .. }
            | ChangeKind::ActionCompleted { .. }
            | ChangeKind::ActionFailed { .. } => {}
        }
    }

    /// Spawn a background task to open the repository
    fn spawn_open(&self) {
        let path = self.path.clone();
        let service = self.config.service.clone();
        let tx = self.task_tx.clone();

        tokio::spawn(async move {
            let result = Workspace::open(&path, &service).await;
            let _ = tx.send(TaskResult::Opened(result));
        });
    }

    /// Forward workspace events into the task channel until it closes
    fn spawn_forward_events(&self, workspace: &Workspace) {
        let mut subscription = workspace.subscribe(ScopeSet::ALL);
        let tx = self.task_tx.clone();

        tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                if tx.send(TaskResult::Change(event)).is_err() {
                    break;
                }
            }
        });
    }

    /// Spawn a background task to load a preview diff
    fn spawn_load_diff(&self, path: String, staged: bool) {
        let Some(workspace) = self.workspace.clone() else {
            return;
        };
        let tx = self.task_tx.clone();

        tokio::spawn(async move {
            let result = workspace.diff(&path, staged).await;
            let _ = tx.send(TaskResult::DiffLoaded {
                path,
                staged,
                result,
            });
        });
    }

    /// Stop the workspace, letting a running git operation finish
    async fn close(&mut self) {
        let Some(workspace) = self.workspace.take() else {
            return;
        };
        match Arc::try_unwrap(workspace) {
            Ok(workspace) => workspace.shutdown().await,
            // A diff task still holds it; dropping cancels the background work
            Err(shared) => drop(shared),
        }
    }
}
