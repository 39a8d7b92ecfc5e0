//! Filtering, ordering and aggregation over a loaded note collection.
//!
//! Everything here works on slices already read from the store and returns
//! fresh vectors; the input order (storage order) is never changed. Every
//! sort is stable, so records that compare equal keep their storage order.
use std::{
    cmp::Reverse,
    collections::{HashMap, HashSet},
};

use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};
use log::{debug, trace};

use crate::{
    extract_text_from_html, Category, CategorySummary, Note, NoteSort, NoteStats, TagCount,
};

/// First note whose id equals `id`.
pub fn find_by_id<'a>(notes: &'a [Note], id: &str) -> Option<&'a Note> {
    notes.iter().find(|note| note.id == id)
}

/// Notes filed under `category_id`.
pub fn by_category(notes: &[Note], category_id: &str) -> Vec<Note> {
    notes
        .iter()
        .filter(|note| note.category == category_id)
        .cloned()
        .collect()
}

pub fn pinned(notes: &[Note]) -> Vec<Note> {
    notes.iter().filter(|note| note.pinned).cloned().collect()
}

/// The `limit` most recently updated notes. Notes whose `updated_at` does
/// not parse rank below every parseable one.
pub fn recent(notes: &[Note], limit: usize) -> Vec<Note> {
    let mut sorted = notes.to_vec();
    // Option orders None first, so reversing puts unparseable stamps last
    sorted.sort_by_cached_key(|note| Reverse(note.updated_time()));
    sorted.truncate(limit);
    sorted
}

/// Tag occurrence counts, highest first. Tags with equal counts keep the
/// order in which they were first seen while walking the notes in storage
/// order. A tag repeated inside one note counts once per repetition.
pub fn popular_tags(notes: &[Note], limit: usize) -> Vec<TagCount> {
    let mut counts: Vec<TagCount> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for tag in notes.iter().flat_map(|note| note.tags.iter()) {
        match positions.get(tag.as_str()) {
            Some(&index) => counts[index].count += 1,
            None => {
                positions.insert(tag.as_str(), counts.len());
                counts.push(TagCount {
                    tag: tag.clone(),
                    count: 1,
                });
            }
        }
    }

    trace!("Aggregated {} distinct tags", counts.len());
    counts.sort_by_key(|entry| Reverse(entry.count));
    counts.truncate(limit);
    counts
}

/// Notes shared with the community, newest first by creation time.
pub fn public_notes(notes: &[Note]) -> Vec<Note> {
    let mut shared: Vec<Note> = notes.iter().filter(|note| note.is_public).cloned().collect();
    shared.sort_by_cached_key(|note| Reverse(note.created_time()));
    shared
}

/// The dashboard's featured note: the first pinned note, otherwise the most
/// recently updated one.
pub fn featured(notes: &[Note]) -> Option<Note> {
    notes
        .iter()
        .find(|note| note.pinned)
        .cloned()
        .or_else(|| recent(notes, 1).into_iter().next())
}

pub fn stats(notes: &[Note]) -> NoteStats {
    let unique_tags: HashSet<&str> = notes
        .iter()
        .flat_map(|note| note.tags.iter().map(String::as_str))
        .collect();

    NoteStats {
        total_notes: notes.len(),
        total_views: notes.iter().map(|note| note.views).sum(),
        unique_tags: unique_tags.len(),
        pinned_notes: notes.iter().filter(|note| note.pinned).count(),
        public_notes: notes.iter().filter(|note| note.is_public).count(),
    }
}

/// Each category with the number of notes referencing it, in category order.
/// Notes pointing at unknown categories are not counted anywhere.
pub fn category_summaries(categories: &[Category], notes: &[Note]) -> Vec<CategorySummary> {
    categories
        .iter()
        .map(|category| CategorySummary {
            category: category.clone(),
            note_count: notes.iter().filter(|note| note.category == category.id).count(),
        })
        .collect()
}

/// Fuzzy search over titles and the plain text of note bodies, best match
/// first. Title matches weigh double. A blank query matches every note.
/// `limit` of `None` returns all matches.
pub fn search(notes: &[Note], query: &str, limit: Option<usize>) -> Vec<Note> {
    let query = query.trim();
    let mut results: Vec<Note> = if query.is_empty() {
        notes.to_vec()
    } else {
        let matcher = SkimMatcherV2::default();

        let mut scored: Vec<(i64, &Note)> = notes
            .iter()
            .filter_map(|note| {
                let title_score = matcher.fuzzy_match(&note.title, query).unwrap_or(0);
                let body = extract_text_from_html(&note.content);
                let content_score = matcher.fuzzy_match(&body, query).unwrap_or(0);
                let score = title_score * 2 + content_score;
                (score > 0).then_some((score, note))
            })
            .collect();

        debug!("Query '{}' matched {} notes", query, scored.len());
        scored.sort_by_key(|(score, _)| Reverse(*score));
        scored.into_iter().map(|(_, note)| note.clone()).collect()
    };

    if let Some(limit) = limit {
        results.truncate(limit);
    }
    results
}

/// Notes ordered for the vault listing.
pub fn sorted(notes: &[Note], sort: NoteSort) -> Vec<Note> {
    let mut sorted = notes.to_vec();
    match sort {
        NoteSort::Updated => sorted.sort_by_cached_key(|note| Reverse(note.updated_time())),
        NoteSort::Created => sorted.sort_by_cached_key(|note| Reverse(note.created_time())),
        NoteSort::Title => sorted.sort_by_cached_key(|note| note.title.to_lowercase()),
        NoteSort::Views => sorted.sort_by_key(|note| Reverse(note.views)),
    }
    sorted
}

/// Replaces the first note with the same id in place, or appends `note`.
/// Returns true when an existing note was replaced.
pub fn upsert(notes: &mut Vec<Note>, note: Note) -> bool {
    match notes.iter().position(|existing| existing.id == note.id) {
        Some(index) => {
            notes[index] = note;
            true
        }
        None => {
            notes.push(note);
            false
        }
    }
}

/// Removes every note with the given id, keeping the order of the rest.
/// Returns how many were removed.
pub fn remove_all(notes: &mut Vec<Note>, id: &str) -> usize {
    let before = notes.len();
    notes.retain(|note| note.id != id);
    before - notes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: &str, updated_at: &str) -> Note {
        Note {
            id: id.to_string(),
            title: format!("Note {}", id),
            content: String::new(),
            category: "ideas".to_string(),
            tags: Vec::new(),
            pinned: false,
            is_public: false,
            views: 0,
            created_at: updated_at.to_string(),
            updated_at: updated_at.to_string(),
            extra: Default::default(),
        }
    }

    fn tagged(id: &str, tags: &[&str]) -> Note {
        let mut n = note(id, "2023-06-01T00:00:00Z");
        n.tags = tags.iter().map(|t| t.to_string()).collect();
        n
    }

    fn ids(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_recent_is_stable_on_ties() {
        let notes = vec![
            note("A", "2023-06-01"),
            note("B", "2023-06-03"),
            note("C", "2023-06-01"),
        ];

        assert_eq!(ids(&recent(&notes, 3)), vec!["B", "A", "C"]);
        assert_eq!(ids(&recent(&notes, 1)), vec!["B"]);
        // Input order untouched
        assert_eq!(ids(&notes), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_recent_compares_instants_not_strings() {
        let notes = vec![
            note("utc", "2023-06-01T12:00:00Z"),
            note("offset", "2023-06-01T13:30:00+02:00"),
        ];
        // 13:30+02:00 is 11:30Z, which is older
        assert_eq!(ids(&recent(&notes, 5)), vec!["utc", "offset"]);
    }

    #[test]
    fn test_recent_puts_unparseable_last() {
        let notes = vec![
            note("bad1", "not a date"),
            note("old", "2020-01-01T00:00:00Z"),
            note("bad2", ""),
            note("new", "2024-01-01T00:00:00Z"),
        ];
        assert_eq!(ids(&recent(&notes, 10)), vec!["new", "old", "bad1", "bad2"]);
    }

    #[test]
    fn test_popular_tags_first_seen_tie_break() {
        let notes = vec![
            tagged("1", &["x", "y"]),
            tagged("2", &["y", "z"]),
            tagged("3", &["x"]),
        ];

        let tags = popular_tags(&notes, 10);
        let pairs: Vec<(&str, usize)> = tags.iter().map(|t| (t.tag.as_str(), t.count)).collect();
        assert_eq!(pairs, vec![("x", 2), ("y", 2), ("z", 1)]);

        assert_eq!(popular_tags(&notes, 1).len(), 1);
        assert!(popular_tags(&[], 5).is_empty());
    }

    #[test]
    fn test_popular_tags_counts_duplicates_within_note() {
        let notes = vec![tagged("1", &["a", "b", "b"]), tagged("2", &["a"])];
        let tags = popular_tags(&notes, 5);
        assert_eq!(tags[0], TagCount { tag: "a".into(), count: 2 });
        assert_eq!(tags[1], TagCount { tag: "b".into(), count: 2 });
    }

    #[test]
    fn test_by_category_is_exact_subset() {
        let mut notes = vec![note("1", ""), note("2", ""), note("3", "")];
        notes[1].category = "business".into();
        notes[2].category = "Ideas".into();

        assert_eq!(ids(&by_category(&notes, "ideas")), vec!["1"]);
        assert_eq!(ids(&by_category(&notes, "business")), vec!["2"]);
        assert!(by_category(&notes, "missing").is_empty());
    }

    #[test]
    fn test_pinned_and_featured() {
        let mut notes = vec![
            note("old", "2023-01-01"),
            note("newest", "2023-09-01"),
            note("pinned", "2023-02-01"),
        ];
        assert!(pinned(&notes).is_empty());
        assert_eq!(featured(&notes).unwrap().id, "newest");

        notes[2].pinned = true;
        assert_eq!(ids(&pinned(&notes)), vec!["pinned"]);
        assert_eq!(featured(&notes).unwrap().id, "pinned");
        assert!(featured(&[]).is_none());
    }

    #[test]
    fn test_public_notes_newest_created_first() {
        let mut notes = vec![
            note("a", "2023-05-01"),
            note("b", "2023-06-01"),
            note("private", "2023-07-01"),
        ];
        notes[0].is_public = true;
        notes[1].is_public = true;

        assert_eq!(ids(&public_notes(&notes)), vec!["b", "a"]);
    }

    #[test]
    fn test_stats() {
        let mut notes = vec![tagged("1", &["x", "y"]), tagged("2", &["y"])];
        notes[0].views = 42;
        notes[1].views = 15;
        notes[1].pinned = true;
        notes[1].is_public = true;

        assert_eq!(
            stats(&notes),
            NoteStats {
                total_notes: 2,
                total_views: 57,
                unique_tags: 2,
                pinned_notes: 1,
                public_notes: 1,
            }
        );
        assert_eq!(stats(&[]), NoteStats::default());
    }

    #[test]
    fn test_category_summaries() {
        let categories = crate::default_categories();
        let mut notes = vec![note("1", ""), note("2", ""), note("3", "")];
        notes[2].category = "gone".into();

        let summaries = category_summaries(&categories, &notes);
        assert_eq!(summaries.len(), 4);
        let ideas = summaries.iter().find(|s| s.category.id == "ideas").unwrap();
        assert_eq!(ideas.note_count, 2);
        assert_eq!(summaries.iter().map(|s| s.note_count).sum::<usize>(), 2);
    }

    #[test]
    fn test_search_ranks_title_above_body() {
        let mut notes = vec![note("body", ""), note("title", ""), note("none", "")];
        notes[0].content = "<p>Plan the <b>launch</b> party</p>".into();
        notes[1].title = "Launch checklist".into();
        notes[2].content = "<p>Unrelated</p>".into();

        let found = search(&notes, "launch", None);
        assert_eq!(ids(&found), vec!["title", "body"]);
        assert_eq!(search(&notes, "launch", Some(1)).len(), 1);
        assert_eq!(search(&notes, "  ", None).len(), 3);
    }

    #[test]
    fn test_search_ignores_markup() {
        let mut notes = vec![note("1", "")];
        notes[0].content = "<li>Budget</li>".into();
        assert!(search(&notes, "li", None).is_empty());
    }

    #[test]
    fn test_sorted_orders() {
        let mut notes = vec![note("a", "2023-01-02"), note("b", "2023-01-03"), note("c", "2023-01-01")];
        notes[0].title = "banana".into();
        notes[1].title = "Apple".into();
        notes[2].title = "cherry".into();
        notes[0].views = 5;
        notes[2].views = 5;
        notes[0].created_at = "2022-12-01".into();

        assert_eq!(ids(&sorted(&notes, NoteSort::Updated)), vec!["b", "a", "c"]);
        assert_eq!(ids(&sorted(&notes, NoteSort::Created)), vec!["b", "c", "a"]);
        assert_eq!(ids(&sorted(&notes, NoteSort::Title)), vec!["b", "a", "c"]);
        assert_eq!(ids(&sorted(&notes, NoteSort::Views)), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_upsert_replaces_in_place_or_appends() {
        let mut notes = vec![note("1", ""), note("2", ""), note("3", "")];

        let mut changed = note("2", "2024-01-01");
        changed.title = "Changed".into();
        assert!(upsert(&mut notes, changed.clone()));
        assert_eq!(ids(&notes), vec!["1", "2", "3"]);
        assert_eq!(notes[1], changed);

        assert!(!upsert(&mut notes, note("4", "")));
        assert_eq!(ids(&notes), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_remove_all_matches_preserves_order() {
        let mut notes = vec![note("1", ""), note("dup", ""), note("2", ""), note("dup", ""), note("3", "")];

        assert_eq!(remove_all(&mut notes, "dup"), 2);
        assert_eq!(ids(&notes), vec!["1", "2", "3"]);
        assert_eq!(remove_all(&mut notes, "missing"), 0);
        assert_eq!(ids(&notes), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_find_by_id_first_occurrence_wins() {
        let mut notes = vec![note("dup", ""), note("dup", "")];
        notes[1].title = "second".into();

        assert_eq!(find_by_id(&notes, "dup").unwrap().title, "Note dup");
        assert!(find_by_id(&notes, "missing").is_none());
    }
}
