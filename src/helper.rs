// Text helpers shared by the query layer and the CLI

// Helper method for parsing tags
pub fn parse_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Strips markup from an HTML fragment: every tag becomes a space, runs of
/// whitespace collapse to one space, and the ends are trimmed. A tag runs from
/// `<` to the next `>`; a `<` with no `>` after it is kept as text.
pub fn extract_text_from_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        text.push_str(&rest[..start]);
        text.push(' ');
        rest = &rest[start + len + 1..];
    }
    text.push_str(rest);

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cuts `text` to at most `max_chars` characters, appending "..." when cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Plain-text preview of an HTML body.
pub fn excerpt(html: &str, max_chars: usize) -> String {
    truncate_text(&extract_text_from_html(html), max_chars)
}
