//! CLI module for the ideaflow application
//!
//! This module maps each subcommand onto a [`NoteService`] call and renders
//! the result as text or JSON.
use std::{
    fs::read_to_string,
    io::{stdin, stdout, Read, Write},
    path::Path,
    sync::Arc,
};

use log::{info, warn};
use serde::Serialize;

use crate::{
    excerpt, parse_tags, server, Commands, Config, IdeaflowError, Note, NoteService, NoteStats,
    Result,
};

/// Width of the plain-text preview printed under each note
const PREVIEW_CHARS: usize = 100;

/// CLI Application handler - processes CLI commands and interfaces with NoteService
pub struct App {
    /// The note service backend
    service: Arc<NoteService>,

    /// Application configuration
    config: Config,

    /// Whether to display verbose output
    verbose: bool,
}

/// Field changes requested by `update`
struct NoteChanges {
    title: Option<String>,
    content: Option<String>,
    category: Option<String>,
    tags: Option<String>,
    pinned: Option<bool>,
    public: Option<bool>,
}

impl App {
    /// Create a new CLI application with the given service and config
    pub fn new(service: NoteService, config: Config, verbose: bool) -> Self {
        Self {
            service: Arc::new(service),
            config,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub async fn run(&self, command: Commands) -> Result<()> {
        if self.verbose {
            info!(
                "Notes document: {}, categories document: {}",
                self.service.store().notes_path().display(),
                self.service.store().categories_path().display()
            );
        }

        match command {
            Commands::List { sort, limit, json } => {
                let notes = self.service.list_notes(sort, non_zero(limit))?;
                self.display_notes(&notes, json)?;
            }

            Commands::Show { id, json } => self.show_note(&id, json)?,

            Commands::Create {
                title,
                content,
                category,
                tags,
                pinned,
                public,
            } => self.create_note(title, content, category, tags, pinned, public)?,

            Commands::Update {
                id,
                title,
                content,
                category,
                tags,
                pinned,
                public,
            } => self.update_note(
                &id,
                NoteChanges {
                    title,
                    content,
                    category,
                    tags,
                    pinned,
                    public,
                },
            )?,

            Commands::Save { source } => self.save_from_json(&source)?,

            Commands::Delete { id, force } => self.handle_delete(id, force)?,

            Commands::Category { id, json } => {
                if !json {
                    match self.service.get_category_by_id(&id)? {
                        Some(category) => println!("{}", console::style(&category.name).bold()),
                        None => warn!("Category {} is not defined", id),
                    }
                }
                let notes = self.service.get_notes_by_category(&id)?;
                self.display_notes(&notes, json)?;
            }

            Commands::Categories { summary, json } => self.list_categories(summary, json)?,

            Commands::Recent { limit, json } => {
                let limit = limit.unwrap_or(self.service.default_recent_limit());
                let notes = self.service.get_recent_notes(limit)?;
                self.display_notes(&notes, json)?;
            }

            Commands::Pinned { json } => {
                let notes = self.service.get_pinned_notes()?;
                self.display_notes(&notes, json)?;
            }

            Commands::Tags { limit, json } => {
                let limit = limit.unwrap_or(self.service.default_popular_tags_limit());
                let tags = self.service.get_popular_tags(limit)?;
                if json {
                    print_json(&tags)?;
                } else if tags.is_empty() {
                    println!("No tags yet.");
                } else {
                    for entry in &tags {
                        println!("{:>4}  #{}", entry.count, console::style(&entry.tag).cyan());
                    }
                }
            }

            Commands::Community { json } => {
                let notes = self.service.get_public_notes()?;
                self.display_notes(&notes, json)?;
            }

            Commands::Stats { json } => {
                let stats = self.service.get_stats()?;
                if json {
                    print_json(&stats)?;
                } else {
                    display_stats(&stats);
                }
            }

            Commands::Search { query, limit, json } => {
                let results = self.service.search_notes(&query, non_zero(limit))?;
                if results.is_empty() && !json {
                    println!("No notes found matching query: \"{}\"", query);
                } else {
                    self.display_notes(&results, json)?;
                }
            }

            Commands::Serve { addr } => {
                let addr = addr.unwrap_or_else(|| self.config.server_addr.clone());
                server::serve(Arc::clone(&self.service), &addr).await?;
            }
        }

        Ok(())
    }

    fn show_note(&self, id: &str, json: bool) -> Result<()> {
        let note = self
            .service
            .get_note_by_id(id)?
            .ok_or_else(|| IdeaflowError::NoteNotFound { id: id.to_string() })?;

        if json {
            print_json(&note)
        } else {
            self.display_note_text(&note, true);
            Ok(())
        }
    }

    fn create_note(
        &self,
        title: String,
        content: String,
        category: String,
        tags: Option<String>,
        pinned: bool,
        public: bool,
    ) -> Result<()> {
        self.warn_unknown_category(&category)?;

        let mut note = Note::new(title, content, category, parse_tags(tags));
        note.pinned = pinned;
        note.is_public = public;

        let note = self.service.save_note(note)?;
        println!("Note created with ID: {}", note.id);
        Ok(())
    }

    fn update_note(&self, id: &str, changes: NoteChanges) -> Result<()> {
        let mut note = self
            .service
            .get_note_by_id(id)?
            .ok_or_else(|| IdeaflowError::NoteNotFound { id: id.to_string() })?;

        if let Some(title) = changes.title {
            note.title = title;
        }
        if let Some(content) = changes.content {
            note.content = content;
        }
        if let Some(category) = changes.category {
            self.warn_unknown_category(&category)?;
            note.category = category;
        }
        if changes.tags.is_some() {
            note.tags = parse_tags(changes.tags);
        }
        if let Some(pinned) = changes.pinned {
            note.pinned = pinned;
        }
        if let Some(public) = changes.public {
            note.is_public = public;
        }
        note.touch();

        let note = self.service.save_note(note)?;
        println!("Note '{}' ({}) updated.", note.title, note.id);
        Ok(())
    }

    /// Upserts a complete note read from a file, or stdin when the path is "-"
    fn save_from_json(&self, source: &Path) -> Result<()> {
        let raw = if source == Path::new("-") {
            let mut buffer = String::new();
            stdin().read_to_string(&mut buffer)?;
            buffer
        } else {
            if !source.exists() {
                return Err(IdeaflowError::InvalidInput {
                    message: format!("file not found: {}", source.display()),
                });
            }
            read_to_string(source)?
        };

        let note: Note = serde_json::from_str(&raw)?;
        let note = self.service.save_note(note)?;
        println!("Note saved: {}", note.id);
        Ok(())
    }

    fn handle_delete(&self, id: String, force: bool) -> Result<()> {
        // Step 1: Fetch the note so the prompt can show what is being removed
        let note = self.service.get_note_by_id(&id)?;

        // Step 2: Show note details and prompt for confirmation (unless force flag is set)
        if let (Some(note), false) = (&note, force) {
            println!("You are about to delete the following note:");
            println!("ID:       {}", note.id);
            println!("Title:    {}", note.title);
            println!("Category: {}", note.category);
            println!("Tags:     {}", note.tags.join(", "));
            println!("Updated:  {}", note.updated_at);

            let preview = excerpt(&note.content, PREVIEW_CHARS);
            if !preview.is_empty() {
                println!("\nContent preview:\n{}", preview);
            }

            println!("\nThis action cannot be undone!");
            print!("Are you sure you want to delete this note? [y/N]: ");
            stdout().flush()?;

            let mut input = String::new();
            stdin().read_line(&mut input)?;

            let input = input.trim().to_lowercase();
            if input != "y" && input != "yes" {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        // Step 3: Delete (a missing id is a no-op)
        let removed = self.service.delete_note(&id)?;

        // Step 4: Provide feedback
        match note {
            Some(note) if removed > 0 => println!(
                "Note '{}' ({}) has been permanently deleted.",
                note.title, note.id
            ),
            _ => println!("No note with ID {}; nothing deleted.", id),
        }
        Ok(())
    }

    fn list_categories(&self, summary: bool, json: bool) -> Result<()> {
        if summary {
            let summaries = self.service.get_category_summaries()?;
            if json {
                return print_json(&summaries);
            }
            for entry in &summaries {
                println!(
                    "{:<12} {:<12} {:>3} note{}",
                    entry.category.id,
                    console::style(&entry.category.name).bold(),
                    entry.note_count,
                    if entry.note_count == 1 { "" } else { "s" }
                );
            }
        } else {
            let categories = self.service.get_all_categories()?;
            if json {
                return print_json(&categories);
            }
            for category in &categories {
                println!(
                    "{:<12} {:<12} {} ({})",
                    category.id,
                    console::style(&category.name).bold(),
                    category.color,
                    category.icon
                );
            }
        }
        Ok(())
    }

    fn warn_unknown_category(&self, category: &str) -> Result<()> {
        if self.service.get_category_by_id(category)?.is_none() {
            warn!("Category {} is not defined; saving anyway", category);
        }
        Ok(())
    }

    /// Display notes in the requested format
    fn display_notes(&self, notes: &[Note], json: bool) -> Result<()> {
        if json {
            return print_json(notes);
        }

        if notes.is_empty() {
            println!("No notes found matching the criteria.");
            return Ok(());
        }

        // Use terminal width for formatting if available
        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);

        for (i, note) in notes.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }
            self.display_note_text(note, false);
        }

        println!(
            "\nFound {} note{}",
            notes.len(),
            if notes.len() == 1 { "" } else { "s" }
        );
        Ok(())
    }

    fn display_note_text(&self, note: &Note, detailed: bool) {
        let mut flags = Vec::new();
        if note.pinned {
            flags.push("pinned");
        }
        if note.is_public {
            flags.push("public");
        }

        println!("ID: {} | Updated: {}", note.id, note.updated_at);
        if flags.is_empty() {
            println!("Title: {}", console::style(&note.title).bold());
        } else {
            println!(
                "Title: {} [{}]",
                console::style(&note.title).bold(),
                flags.join(", ")
            );
        }
        println!("Category: {}", note.category);

        if !note.tags.is_empty() {
            let tags = note
                .tags
                .iter()
                .map(|tag| format!("#{}", tag))
                .collect::<Vec<_>>()
                .join(" ");
            println!("Tags: {}", console::style(tags).cyan());
        }

        if detailed {
            println!("Views: {} | Created: {}", note.views, note.created_at);
            println!("\n{}", note.content);
        } else {
            let preview = excerpt(&note.content, PREVIEW_CHARS);
            if !preview.is_empty() {
                println!("\n{}", preview);
            }
        }
    }
}

fn display_stats(stats: &NoteStats) {
    println!("Total notes:  {}", stats.total_notes);
    println!("Total views:  {}", stats.total_views);
    println!("Unique tags:  {}", stats.unique_tags);
    println!("Pinned notes: {}", stats.pinned_notes);
    println!("Public notes: {}", stats.public_notes);
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// 0 means "no limit" on the command line
fn non_zero(limit: usize) -> Option<usize> {
    (limit > 0).then_some(limit)
}
