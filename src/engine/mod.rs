//! Repository state projection and command engine
//!
//! - [`RepoModel`]: owner of the current [`Snapshot`](crate::model::Snapshot)
//! - [`RefreshEngine`]: debounced, batched reconciliation with the repository
//! - [`Dispatcher`]: validates and serializes user actions
//! - [`EventBus`]: ordered change notifications for the display layer
//! - [`RepoWatcher`]: invalidations for changes made outside the app

mod bus;
mod dispatch;
mod refresh;
mod state;
mod validate;
mod watcher;

pub use bus::{ChangeEvent, ChangeKind, EventBus, Subscription};
pub use dispatch::{ActionOutcome, ActionTicket, Dispatcher};
pub use refresh::{load, Batch, RefreshEngine, RefreshHandle};
pub use state::{RefreshState, RepoModel};
pub use validate::{check_overwrites, validate, Validated};
pub use watcher::{canonical, scopes_for_path, RepoWatcher};
