//! thalia - A terminal UI for git repositories
//!
//! The library keeps an in-memory snapshot of a repository (HEAD, branches,
//! working tree status, recent commits) consistent with the repository on
//! disk while the user stages, commits, checks out and stashes:
//!
//! - Every git call goes through a [`GitGateway`] with per-call timeouts
//! - Invalidations are coalesced into batched, debounced refreshes
//! - User actions are validated against the snapshot and run one at a time
//! - Subscribers receive ordered change events filtered by scope
//!
//! # Architecture
//!
//! - [`service`]: The git gateway and its libgit2 implementation
//! - [`model`]: Snapshot, status, commit, diff and action types
//! - [`engine`]: Refresh engine, dispatcher, validator, event bus, watcher
//! - [`workspace`]: One open repository tying the engine together
//! - [`app`]: The terminal application built on a workspace
//! - [`ui`]: UI rendering and theming
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use thalia::{ActionKind, ScopeSet, ServiceConfig, Workspace};
//!
//! #[tokio::main]
//! async fn main() -> thalia::AppResult<()> {
//!     let workspace = Workspace::open(Path::new("."), &ServiceConfig::default()).await?;
//!     let mut events = workspace.subscribe(ScopeSet::STATUS);
//!
//!     let ticket = workspace.submit(ActionKind::Stage {
//!         paths: vec!["README.md".to_string()],
//!     });
//!     ticket.wait().await?;
//!     while let Some(event) = events.try_recv() {
//!         println!("{:?}", event.kind);
//!     }
//!
//!     println!("{} staged", workspace.snapshot().staged_count());
//!     workspace.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod keymap;
pub mod logging;
pub mod model;
pub mod service;
pub mod tui;
pub mod ui;
pub mod util;
pub mod workspace;

// Re-export commonly used types at the crate root
pub use app::App;
pub use config::{Config, RefreshConfig, ServiceConfig, Timeouts};
pub use engine::{ActionOutcome, ActionTicket, ChangeEvent, ChangeKind, RefreshState, Subscription};
pub use error::{AppError, AppResult, ConfigError, ErrorKind, GitError, ValidationError};
pub use model::{
    ActionId, ActionKind, Branch, Commit, Diff, FileStatus, Head, ScopeSet, Snapshot,
    StagedState, StashEntry, StatusLevel, StatusMessage, WorktreeState,
};
pub use service::{Git2Gateway, GitGateway, GitOperation, GitOutput};
pub use tui::Tui;
pub use workspace::Workspace;
