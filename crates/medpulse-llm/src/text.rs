//! Word-aligned chunking and hard truncation for backend input limits.
//!
//! Sizes are counted in characters, not bytes.

/// Marker appended when [`truncate_chars`] cuts text.
pub const ELLIPSIS: &str = "...";

/// Splits `text` into word-aligned chunks.
///
/// Each word is charged its length plus one separator; a chunk is closed
/// as soon as the next word would push the running total past
/// `chunk_size`. A single word longer than `chunk_size` becomes its own
/// chunk rather than being split. Chunks are rejoined with one space, so
/// the concatenated chunks reproduce the original word sequence.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_size = 0usize;

    for word in text.split_whitespace() {
        let cost = word.chars().count() + 1;
        if current_size + cost > chunk_size && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
            current_size = 0;
        }
        current.push(word);
        current_size += cost;
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}

/// Cuts `text` to at most `max_chars` characters, appending [`ELLIPSIS`]
/// when anything was removed.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}{}", &text[..idx], ELLIPSIS),
        None => text.to_string(),
    }
}

/// Truncation for log lines: no marker, char-safe.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk_text("a few short words", 1500);
        assert_eq!(chunks, vec!["a few short words".to_string()]);
    }

    #[test]
    fn test_chunks_respect_cap() {
        let text = words(1000);
        let chunks = chunk_text(&text, 100);
        assert!(chunks.len() > 1);
        for c in &chunks {
            // chunk length plus its trailing separator stays within the cap
            assert!(c.chars().count() < 100, "chunk too long: {}", c.len());
        }
    }

    #[test]
    fn test_chunks_reconstruct_word_sequence() {
        let text = format!("  {}\n\t{}  ", words(300), words(40));
        let chunks = chunk_text(&text, 120);
        let rejoined = chunks.join(" ");
        let original: Vec<&str> = text.split_whitespace().collect();
        let roundtrip: Vec<&str> = rejoined.split_whitespace().collect();
        assert_eq!(original, roundtrip);
    }

    #[test]
    fn test_rechunking_is_deterministic() {
        let text = words(500);
        let first = chunk_text(&text, 150);
        let second = chunk_text(&first.join(" "), 150);
        assert_eq!(first, second);
    }

    #[test]
    fn test_oversized_word_is_its_own_chunk() {
        let long = "x".repeat(50);
        let chunks = chunk_text(&format!("a {long} b"), 10);
        assert_eq!(chunks, vec!["a".to_string(), long, "b".to_string()]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(chunk_text("   ", 10).is_empty());
    }

    #[test]
    fn test_truncate_appends_marker() {
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("ééé", 2), "éé...");
    }

    #[test]
    fn test_preview_is_char_safe() {
        assert_eq!(preview("héllo", 2), "hé");
        assert_eq!(preview("hi", 10), "hi");
    }
}
