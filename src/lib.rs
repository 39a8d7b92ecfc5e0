//! Ideaflow note-taking library
//!
//! This library stores notes and categories as JSON documents on disk and
//! provides the queries behind the dashboard, vault and community views:
//! recent and pinned notes, popular tags, category filters and search.

mod cli;
mod config;
mod errors;
mod helper;
mod note;
pub mod query;
pub mod server;
mod service;
mod storage;
mod types;

// Re-export key components
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use note::*;
pub use service::*;
pub use storage::*;
pub use types::*;
