//! Line-oriented console transport
//!
//! Inbound lines look like `<owner>: <text>`; outbound messages are printed
//! as `[<owner>] <text>`, one line per chunk.

use anyhow::Result;
use async_trait::async_trait;
use std::io::Write;
use std::sync::Mutex;

use super::{InboundEvent, Notifier};
use crate::core::response::chunk_for_message;

/// Parse an inbound console line
///
/// Returns `None` for blank lines or lines without an owner prefix.
pub fn parse_line(line: &str) -> Option<InboundEvent> {
    let (owner, text) = line.split_once(':')?;
    let owner = owner.trim();
    let text = text.trim();
    if owner.is_empty() || owner.contains(char::is_whitespace) || text.is_empty() {
        return None;
    }
    Some(InboundEvent::new(owner, text))
}

/// Format outbound text for `owner_id`, chunked to the message limit
pub fn render(owner_id: &str, text: &str) -> Vec<String> {
    chunk_for_message(text)
        .into_iter()
        .map(|chunk| format!("[{owner_id}] {chunk}"))
        .collect()
}

/// Notifier writing to stdout
///
/// Output is serialized so concurrent reminders never interleave lines.
pub struct ConsoleGateway {
    out: Mutex<()>,
}

impl ConsoleGateway {
    pub fn new() -> Self {
        Self { out: Mutex::new(()) }
    }

    pub fn print(&self, owner_id: &str, text: &str) -> Result<()> {
        let _guard = self
            .out
            .lock()
            .map_err(|_| anyhow::anyhow!("console output lock poisoned"))?;
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        for line in render(owner_id, text) {
            writeln!(handle, "{line}")?;
        }
        handle.flush()?;
        Ok(())
    }
}

impl Default for ConsoleGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for ConsoleGateway {
    async fn notify(&self, owner_id: &str, text: &str) -> Result<()> {
        self.print(owner_id, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("42: /remind 09:00 stand-up"),
            Some(InboundEvent::new("42", "/remind 09:00 stand-up"))
        );
        assert_eq!(parse_line("  7 :  hi  "), Some(InboundEvent::new("7", "hi")));
    }

    #[test]
    fn test_parse_line_keeps_colons_in_text() {
        let event = parse_line("42: /schedule 2025-06-04 15:30 call").unwrap();
        assert_eq!(event.text, "/schedule 2025-06-04 15:30 call");
    }

    #[test]
    fn test_parse_line_rejects_garbage() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("no owner here"), None);
        assert_eq!(parse_line("42:   "), None);
        assert_eq!(parse_line(": text"), None);
        assert_eq!(parse_line("two words: text"), None);
    }

    #[test]
    fn test_render_chunks() {
        assert_eq!(render("42", "hello"), vec!["[42] hello".to_string()]);
        let long = "a".repeat(5000);
        let lines = render("42", &long);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.starts_with("[42] ")));
    }
}
