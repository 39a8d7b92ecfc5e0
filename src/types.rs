//! Shared data structures for the ideaflow application.
//!
//! This module holds the result alias, the aggregate shapes returned by the
//! query layer, and the CLI subcommands.
use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::{Category, IdeaflowError};

/// A specialized Result type for ideaflow operations.
pub type Result<T> = std::result::Result<T, IdeaflowError>;

/// How often a tag occurs across all notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Totals shown on the dashboard and profile pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteStats {
    pub total_notes: usize,
    pub total_views: u64,
    /// Distinct tag strings across all notes
    pub unique_tags: usize,
    pub pinned_notes: usize,
    pub public_notes: usize,
}

/// A category together with how many notes reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    pub note_count: usize,
}

/// Orderings offered by the vault listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteSort {
    /// Most recently updated first
    #[default]
    Updated,
    /// Most recently created first
    Created,
    /// Alphabetical by title, ignoring case
    Title,
    /// Most viewed first
    Views,
}

/// Available subcommands for the ideaflow application
#[derive(Subcommand)]
pub enum Commands {
    /// List notes, optionally sorted and limited
    List {
        /// Sort order
        #[clap(short, long, value_enum, default_value_t = NoteSort::Updated)]
        sort: NoteSort,

        /// Limit the number of notes returned (0 shows all)
        #[clap(short = 'n', long, default_value_t = 0)]
        limit: usize,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// View a note by ID
    Show {
        /// ID of the note to view
        id: String,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Create a new note
    Create {
        /// Title of the note
        #[clap(short = 'T', long, default_value = "")]
        title: String,

        /// HTML content of the note
        #[clap(short, long, default_value = "")]
        content: String,

        /// Category id to file the note under
        #[clap(short = 'C', long, default_value = "ideas")]
        category: String,

        /// Tags to associate with the note (comma-separated)
        #[clap(short, long)]
        tags: Option<String>,

        /// Pin the note to the dashboard
        #[clap(short, long)]
        pinned: bool,

        /// Share the note in the community view
        #[clap(long)]
        public: bool,
    },

    /// Update fields of an existing note
    Update {
        /// ID of the note to update
        id: String,

        /// New title
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New HTML content
        #[clap(short, long)]
        content: Option<String>,

        /// New category id
        #[clap(short = 'C', long)]
        category: Option<String>,

        /// Replacement tags (comma-separated)
        #[clap(short, long)]
        tags: Option<String>,

        /// Set or clear the pinned flag
        #[clap(short, long)]
        pinned: Option<bool>,

        /// Set or clear public visibility
        #[clap(long)]
        public: Option<bool>,
    },

    /// Save a complete note from a JSON file ("-" reads stdin), inserting or replacing by id
    Save {
        /// Path to the JSON note
        source: PathBuf,
    },

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// List the notes filed under a category
    Category {
        /// Category id
        id: String,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// List categories
    Categories {
        /// Include the number of notes in each category
        #[clap(short, long)]
        summary: bool,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Most recently updated notes
    Recent {
        /// Number of notes (defaults to the configured recent limit)
        #[clap(short = 'n', long)]
        limit: Option<usize>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Pinned notes
    Pinned {
        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Most used tags
    Tags {
        /// Number of tags (defaults to the configured popular tags limit)
        #[clap(short = 'n', long)]
        limit: Option<usize>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Publicly shared notes, newest first
    Community {
        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Note totals
    Stats {
        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Search notes by title or content
    Search {
        /// Search query text
        query: String,

        /// Limit the number of search results (0 shows all)
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Serve the JSON API over HTTP
    Serve {
        /// Address to bind (defaults to the configured server address)
        #[clap(short, long)]
        addr: Option<String>,
    },
}
