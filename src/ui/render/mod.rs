//! UI rendering functions
//!
//! This module contains all the rendering logic for the application,
//! separated by view type.

mod common;
mod dialog;
mod workspace;

pub use common::{render_error, render_loading};
pub use workspace::render_workspace;
