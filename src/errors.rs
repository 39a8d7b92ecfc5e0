//! Error types for the ideaflow application.
//!
//! This module defines custom error types that categorize the failures
//! that can occur while loading, querying and persisting notes.

use std::{error::Error as StdError, io, path::PathBuf};

use thiserror::Error;

/// Underlying `io::Error` or `serde_json::Error` behind a store failure.
pub type BoxedSource = Box<dyn StdError + Send + Sync>;

/// The main error type for the ideaflow application.
#[derive(Error, Debug)]
pub enum IdeaflowError {
    /// The backing document (or its directory) could not be created or located.
    #[error("Store unavailable at {path}: {source}")]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An existing document is unreadable or not a valid JSON array.
    #[error("Failed to read store {path}: {source}")]
    StoreRead {
        path: PathBuf,
        #[source]
        source: BoxedSource,
    },

    /// Persisting a document failed (disk full, permission denied, ...).
    #[error("Failed to write store {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: BoxedSource,
    },

    /// Errors related to file I/O operations outside the store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Note was not found when the caller required it to exist.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// Category was not found when the caller required it to exist.
    #[error("Category not found: {id}")]
    CategoryNotFound { id: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// A blocking store call running off the async runtime did not complete.
    #[error("Background task failed: {message}")]
    TaskFailed { message: String },

    /// Caller supplied input that cannot be acted on.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl IdeaflowError {
    /// True for the two lookup misses, which surfaces map to "not found"
    /// rather than an internal failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            IdeaflowError::NoteNotFound { .. } | IdeaflowError::CategoryNotFound { .. }
        )
    }
}
