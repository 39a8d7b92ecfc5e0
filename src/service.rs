//! The query/mutation service every front end talks to.
//!
//! Each call reloads the relevant document from the store, so a caller always
//! observes the latest persisted state. Lookups that find nothing return
//! `Ok(None)` or an empty vector; only storage failures are errors.
use log::{debug, info};

use crate::{
    query, Category, CategorySummary, Config, Note, NoteSort, NoteStats, NoteStore, Result,
    TagCount,
};

/// Query and mutation operations over a [`NoteStore`].
#[derive(Debug)]
pub struct NoteService {
    store: NoteStore,
    recent_limit: usize,
    popular_tags_limit: usize,
}

impl NoteService {
    pub fn new(store: NoteStore, config: &Config) -> Self {
        Self {
            store,
            recent_limit: config.recent_limit,
            popular_tags_limit: config.popular_tags_limit,
        }
    }

    /// Opens the store described by `config` and wraps it in a service.
    pub fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(NoteStore::open(config)?, config))
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    /// Limit used by [`get_recent_notes`](Self::get_recent_notes) callers that give none.
    pub fn default_recent_limit(&self) -> usize {
        self.recent_limit
    }

    /// Limit used by [`get_popular_tags`](Self::get_popular_tags) callers that give none.
    pub fn default_popular_tags_limit(&self) -> usize {
        self.popular_tags_limit
    }

    /// All notes in storage order.
    pub fn get_all_notes(&self) -> Result<Vec<Note>> {
        self.store.load_notes()
    }

    pub fn get_note_by_id(&self, id: &str) -> Result<Option<Note>> {
        debug!("Retrieving note by ID: {}", id);
        let notes = self.store.load_notes()?;
        Ok(query::find_by_id(&notes, id).cloned())
    }

    pub fn get_notes_by_category(&self, category_id: &str) -> Result<Vec<Note>> {
        let notes = self.store.load_notes()?;
        Ok(query::by_category(&notes, category_id))
    }

    pub fn get_recent_notes(&self, limit: usize) -> Result<Vec<Note>> {
        let notes = self.store.load_notes()?;
        Ok(query::recent(&notes, limit))
    }

    pub fn get_pinned_notes(&self) -> Result<Vec<Note>> {
        let notes = self.store.load_notes()?;
        Ok(query::pinned(&notes))
    }

    pub fn get_popular_tags(&self, limit: usize) -> Result<Vec<TagCount>> {
        let notes = self.store.load_notes()?;
        Ok(query::popular_tags(&notes, limit))
    }

    pub fn get_all_categories(&self) -> Result<Vec<Category>> {
        self.store.load_categories()
    }

    pub fn get_category_by_id(&self, id: &str) -> Result<Option<Category>> {
        let categories = self.store.load_categories()?;
        Ok(categories.into_iter().find(|category| category.id == id))
    }

    /// Inserts `note`, or replaces the stored note with the same id in place.
    /// The note is stored exactly as given; refreshing `updated_at` is up to
    /// the caller.
    pub fn save_note(&self, note: Note) -> Result<Note> {
        info!("Saving note: {}", note.id);
        let saved = note.clone();
        let replaced = self.store.update_notes(move |notes| query::upsert(notes, note))?;

        if replaced {
            info!("Note {} updated", saved.id);
        } else {
            info!("Note {} created", saved.id);
        }
        Ok(saved)
    }

    /// Removes every note with this id. Unknown ids are not an error; the
    /// unchanged collection is still written back. Returns how many notes
    /// were removed.
    pub fn delete_note(&self, id: &str) -> Result<usize> {
        info!("Deleting note: {}", id);
        let removed = self.store.update_notes(|notes| query::remove_all(notes, id))?;

        if removed == 0 {
            debug!("No note with id {} to delete", id);
        } else {
            info!("Note {} successfully deleted", id);
        }
        Ok(removed)
    }

    /// Notes shared with the community, newest first.
    pub fn get_public_notes(&self) -> Result<Vec<Note>> {
        let notes = self.store.load_notes()?;
        Ok(query::public_notes(&notes))
    }

    pub fn get_featured_note(&self) -> Result<Option<Note>> {
        let notes = self.store.load_notes()?;
        Ok(query::featured(&notes))
    }

    pub fn get_stats(&self) -> Result<NoteStats> {
        let notes = self.store.load_notes()?;
        Ok(query::stats(&notes))
    }

    pub fn get_category_summaries(&self) -> Result<Vec<CategorySummary>> {
        let categories = self.store.load_categories()?;
        let notes = self.store.load_notes()?;
        Ok(query::category_summaries(&categories, &notes))
    }

    pub fn search_notes(&self, query_text: &str, limit: Option<usize>) -> Result<Vec<Note>> {
        info!("Searching notes with query: '{}'", query_text);
        let notes = self.store.load_notes()?;
        Ok(query::search(&notes, query_text, limit))
    }

    /// All notes in the requested order, truncated to `limit` when given.
    pub fn list_notes(&self, sort: NoteSort, limit: Option<usize>) -> Result<Vec<Note>> {
        let notes = self.store.load_notes()?;
        let mut sorted = query::sorted(&notes, sort);
        if let Some(limit) = limit {
            sorted.truncate(limit);
        }
        Ok(sorted)
    }
}
