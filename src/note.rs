//! Core record types for the ideaflow application.
//!
//! Notes and categories are persisted exactly as they are received: field
//! shapes are not validated here, and timestamps stay the ISO-8601 strings
//! the caller supplied. They are parsed only when a query needs to order by
//! them. Keys the record types do not know about are carried through
//! untouched.
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Title given to notes created or received without one.
pub const DEFAULT_TITLE: &str = "Untitled Note";

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

// `null` reads the same as a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default_title<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_title))
}

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier for the note, assigned by the client
    pub id: String,
    /// Note title
    #[serde(default = "default_title", deserialize_with = "null_as_default_title")]
    pub title: String,
    /// Note body as HTML
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Id of the category the note belongs to (not checked against categories)
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    /// Tags for organization, in the order the user entered them
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Prioritized on the dashboard
    #[serde(default, deserialize_with = "null_as_default")]
    pub pinned: bool,
    /// Listed in the community view
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_public: bool,
    /// View counter, persisted as given
    #[serde(default, deserialize_with = "null_as_default")]
    pub views: u64,
    /// When the note was created
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    /// Last modification time, refreshed by the caller
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
    /// Any other keys the record arrived with, written back as they were
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Note {
    /// Creates a new private, unpinned note with a fresh UUID and both
    /// timestamps set to now. A blank title becomes [`DEFAULT_TITLE`].
    pub fn new(title: String, content: String, category: String, tags: Vec<String>) -> Self {
        let now = now_timestamp();
        let title = if title.trim().is_empty() {
            default_title()
        } else {
            title
        };

        Note {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            category,
            tags,
            pinned: false,
            is_public: false,
            views: 0,
            created_at: now.clone(),
            updated_at: now,
            extra: Map::new(),
        }
    }

    /// Refreshes `updated_at` to the current time.
    pub fn touch(&mut self) {
        self.updated_at = now_timestamp();
    }

    /// Parsed `created_at`, or `None` when the stored string is not a timestamp.
    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    /// Parsed `updated_at`, or `None` when the stored string is not a timestamp.
    pub fn updated_time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.updated_at)
    }
}

/// A category notes can be filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Either a named color token ("blue") or a hex value ("#2196F3")
    pub color: String,
    /// Symbolic icon name, meaningful only to the front end
    pub icon: String,
}

impl Category {
    pub fn new(id: &str, name: &str, color: &str, icon: &str) -> Self {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// The categories written to a fresh categories document.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new("business", "Business", "blue", "BookMarked"),
        Category::new("personal", "Personal", "green", "BookMarked"),
        Category::new("ideas", "Ideas", "amber", "BookMarked"),
        Category::new("projects", "Projects", "purple", "BookMarked"),
    ]
}

/// Current time in the same shape browsers produce for `toISOString()`,
/// e.g. `2023-06-05T14:20:00.000Z`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses the timestamp formats found in note documents: full RFC 3339,
/// a date-time without offset (read as UTC), or a bare date (UTC midnight).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
