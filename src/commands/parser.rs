//! Inbound text to command intent

/// A `/name args` message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: String,
}

impl ParsedCommand {
    pub fn has_args(&self) -> bool {
        !self.args.is_empty()
    }

    /// First whitespace-separated argument and the trimmed remainder
    pub fn split_first(&self) -> Option<(&str, &str)> {
        split_first(&self.args)
    }
}

pub fn split_first(text: &str) -> Option<(&str, &str)> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match text.split_once(char::is_whitespace) {
        Some((head, rest)) => Some((head, rest.trim())),
        None => Some((text, "")),
    }
}

/// Parse `/name rest of line`. Names are case-insensitive.
///
/// Returns `None` for anything that is not a command.
pub fn parse_command(text: &str) -> Option<ParsedCommand> {
    let text = text.trim();
    let body = text.strip_prefix('/')?;
    if body.starts_with(char::is_whitespace) {
        return None;
    }
    let (name, args) = split_first(body)?;
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(ParsedCommand {
        name: name.to_ascii_lowercase(),
        args: args.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_with_args() {
        let cmd = parse_command("/remind 09:00 stand-up meeting").unwrap();
        assert_eq!(cmd.name, "remind");
        assert_eq!(cmd.args, "09:00 stand-up meeting");
        assert_eq!(cmd.split_first(), Some(("09:00", "stand-up meeting")));
    }

    #[test]
    fn test_parse_command_without_args() {
        let cmd = parse_command("  /HELP ").unwrap();
        assert_eq!(cmd.name, "help");
        assert!(!cmd.has_args());
        assert_eq!(cmd.split_first(), None);
    }

    #[test]
    fn test_not_a_command() {
        assert_eq!(parse_command("hello there"), None);
        assert_eq!(parse_command("/"), None);
        assert_eq!(parse_command("/ remind"), None);
        assert_eq!(parse_command("/ hello there"), None);
        assert_eq!(parse_command("/\tnotes"), None);
        assert_eq!(parse_command("/12:30"), None);
    }

    #[test]
    fn test_split_first_keeps_inner_spacing() {
        assert_eq!(split_first("30m  call   mom"), Some(("30m", "call   mom")));
        assert_eq!(split_first("solo"), Some(("solo", "")));
    }
}
