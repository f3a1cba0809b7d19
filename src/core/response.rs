//! Outbound message splitting
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

/// Largest text a single outbound message may carry
pub const MESSAGE_LIMIT: usize = 4096;
/// Length of a reminder payload shown in listings
pub const PREVIEW_LIMIT: usize = 80;

/// Split text into pieces of at most `max_size` bytes.
///
/// Prefers newline boundaries and never cuts a UTF-8 character in half.
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    if text.len() <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if !current.is_empty() && current.len() + line.len() + 1 > max_size {
            chunks.push(std::mem::take(&mut current));
        }

        if line.len() > max_size {
            chunks.extend(split_line(line, max_size));
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_line(line: &str, max_size: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for ch in line.chars() {
        if current.len() + ch.len_utf8() > max_size && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

pub fn chunk_for_message(text: &str) -> Vec<String> {
    chunk_text(text, MESSAGE_LIMIT)
}

/// Shorten text to `limit` bytes with a trailing ellipsis
pub fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit.saturating_sub(1);
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

pub fn preview(text: &str) -> String {
    truncate(text, PREVIEW_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(chunk_text("hello", 100), vec!["hello"]);
        assert_eq!(chunk_text("", 100), vec![""]);
    }

    #[test]
    fn test_chunks_break_on_lines() {
        let chunks = chunk_text("line1\nline2\nline3", 12);
        assert_eq!(chunks, vec!["line1\nline2", "line3"]);
    }

    #[test]
    fn test_long_line_is_split() {
        let chunks = chunk_text(&"a".repeat(100), 30);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.len() <= 30));
    }

    #[test]
    fn test_multibyte_boundaries() {
        let text = "Напоминание 世界! ".repeat(400);
        for chunk in chunk_for_message(&text) {
            assert!(chunk.len() <= MESSAGE_LIMIT);
            assert!(!chunk.is_empty());
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        let cut = truncate("пить лекарство", 9);
        assert!(cut.ends_with('…'));
        assert!(cut.len() <= 9 + '…'.len_utf8());
    }
}
