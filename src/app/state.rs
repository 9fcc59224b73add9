//! Application state types
//!
//! The main [`AppState`] machine plus the per-panel cursors and overlays of
//! the workspace screen.

use std::sync::Arc;

use ratatui::widgets::TableState;

use crate::engine::{ActionOutcome, ChangeEvent};
use crate::error::AppError;
use crate::model::{Branch, Diff, FileStatus, Snapshot};
use crate::workspace::Workspace;

/// Application state machine
#[derive(Debug)]
pub enum AppState {
    /// Opening the repository
    Loading,
    /// Fatal error, shown until a key is pressed
    Error(String),
    /// The repository workspace screen
    Workspace(Box<WorkspaceState>),
    Quitting,
}

impl AppState {
    /// Get the kind of state for pattern matching without borrowing
    pub fn kind(&self) -> StateKind {
        match self {
            AppState::Loading => StateKind::Loading,
            AppState::Error(_) => StateKind::Error,
            AppState::Workspace(_) => StateKind::Workspace,
            AppState::Quitting => StateKind::Quitting,
        }
    }
}

/// Simple enum for state discrimination without borrowing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Loading,
    Error,
    Workspace,
    Quitting,
}

/// Panel with keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Branches,
    Files,
    Commits,
}

impl Panel {
    pub fn next(self) -> Self {
        match self {
            Panel::Branches => Panel::Files,
            Panel::Files => Panel::Commits,
            Panel::Commits => Panel::Branches,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Panel::Branches => Panel::Commits,
            Panel::Files => Panel::Branches,
            Panel::Commits => Panel::Files,
        }
    }
}

/// Cursor over a table of `len` rows
#[derive(Debug, Default)]
pub struct Cursor {
    pub pos: usize,
    pub table_state: TableState,
}

impl Cursor {
    pub fn down(&mut self, len: usize) {
        if self.pos < len.saturating_sub(1) {
            self.pos += 1;
        }
        self.sync(len);
    }

    pub fn up(&mut self, len: usize) {
        self.pos = self.pos.saturating_sub(1);
        self.sync(len);
    }

    /// Keep the cursor inside a table that changed size
    pub fn clamp(&mut self, len: usize) {
        if self.pos >= len {
            self.pos = len.saturating_sub(1);
        }
        self.sync(len);
    }

    fn sync(&mut self, len: usize) {
        self.table_state
            .select(if len == 0 { None } else { Some(self.pos) });
    }
}

/// Free-text prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Commit,
    Amend,
    NewBranch,
    Stash,
}

impl Prompt {
    pub fn title(self) -> &'static str {
        match self {
            Prompt::Commit => "Commit message",
            Prompt::Amend => "Amend last commit",
            Prompt::NewBranch => "New branch name",
            Prompt::Stash => "Stash message (optional)",
        }
    }
}

/// Modal layer drawn over the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    Input { prompt: Prompt, text: String },
    ConfirmDelete { branch: String },
}

/// Diff shown in the preview panel
#[derive(Debug, Clone)]
pub struct DiffView {
    pub path: String,
    pub staged: bool,
    pub diff: Diff,
    pub scroll: u16,
}

/// State for the workspace screen
#[derive(Debug)]
pub struct WorkspaceState {
    pub snapshot: Arc<Snapshot>,
    pub focus: Panel,
    pub branches: Cursor,
    pub files: Cursor,
    pub commits: Cursor,
    pub diff: Option<DiffView>,
    pub overlay: Overlay,
    /// Actions submitted and not yet answered
    pub in_flight: usize,
}

impl WorkspaceState {
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        let mut state = Self {
            snapshot,
            focus: Panel::Files,
            branches: Cursor::default(),
            files: Cursor::default(),
            commits: Cursor::default(),
            diff: None,
            overlay: Overlay::None,
            in_flight: 0,
        };
        state.clamp_cursors();
        state
    }

    /// Replace the snapshot, keeping the file cursor on the same path when
    /// it still exists
    pub fn update_snapshot(&mut self, snapshot: Arc<Snapshot>) {
        let selected = self.selected_file().map(|f| f.path.clone());
        self.snapshot = snapshot;
        if let Some(path) = selected {
            if let Some(idx) = self.snapshot.files.iter().position(|f| f.path == path) {
                self.files.pos = idx;
            }
        }
        self.clamp_cursors();
    }

    fn clamp_cursors(&mut self) {
        self.branches.clamp(self.branch_count());
        self.files.clamp(self.snapshot.files.len());
        self.commits.clamp(self.snapshot.commits.len());
    }

    /// Local branches followed by remote branches
    pub fn branch_count(&self) -> usize {
        self.snapshot.local_branches.len() + self.snapshot.remote_branches.len()
    }

    /// Branch at `idx` in the combined list, and whether it is remote
    pub fn branch_at(&self, idx: usize) -> Option<(&Branch, bool)> {
        let local = &self.snapshot.local_branches;
        match local.get(idx) {
            Some(branch) => Some((branch, false)),
            None => self
                .snapshot
                .remote_branches
                .get(idx - local.len())
                .map(|b| (b, true)),
        }
    }

    pub fn selected_branch(&self) -> Option<(&Branch, bool)> {
        self.branch_at(self.branches.pos)
    }

    pub fn selected_file(&self) -> Option<&FileStatus> {
        self.snapshot.files.get(self.files.pos)
    }

    pub fn cursor_down(&mut self) {
        let len = self.panel_len(self.focus);
        match self.focus {
            Panel::Branches => self.branches.down(len),
            Panel::Files => self.files.down(len),
            Panel::Commits => self.commits.down(len),
        }
    }

    pub fn cursor_up(&mut self) {
        let len = self.panel_len(self.focus);
        match self.focus {
            Panel::Branches => self.branches.up(len),
            Panel::Files => self.files.up(len),
            Panel::Commits => self.commits.up(len),
        }
    }

    fn panel_len(&self, panel: Panel) -> usize {
        match panel {
            Panel::Branches => self.branch_count(),
            Panel::Files => self.snapshot.files.len(),
            Panel::Commits => self.snapshot.commits.len(),
        }
    }

    pub fn open_prompt(&mut self, prompt: Prompt, text: impl Into<String>) {
        self.overlay = Overlay::Input {
            prompt,
            text: text.into(),
        };
    }

    pub fn close_overlay(&mut self) {
        self.overlay = Overlay::None;
    }

    /// Whether a diff for `path` is the one the preview should show now
    pub fn wants_diff(&self, path: &str, staged: bool) -> bool {
        self.selected_file()
            .is_some_and(|file| file.path == path && preview_staged(file) == staged)
    }

    /// Whether the preview shows the current diff of the selected file
    pub fn diff_matches_selection(&self) -> bool {
        match (self.selected_file(), &self.diff) {
            (Some(file), Some(view)) => view.path == file.path && view.staged == preview_staged(file),
            (None, None) => true,
            _ => false,
        }
    }
}

/// Show the staged diff for files whose changes are all staged, otherwise
/// the working tree diff
pub fn preview_staged(file: &FileStatus) -> bool {
    file.is_staged() && !file.has_worktree_changes()
}

/// Messages from background tasks
pub enum TaskResult {
    /// The repository was opened
    Opened(Result<Workspace, AppError>),
    /// A bus event for the open workspace
    Change(ChangeEvent),
    /// Diff for the preview panel
    DiffLoaded {
        path: String,
        staged: bool,
        result: Result<Diff, AppError>,
    },
    /// A submitted action finished
    ActionDone {
        description: String,
        outcome: ActionOutcome,
    },
}
