use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

static PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/silence\s+(?P<action>\w+)(?:\s+(?P<duration>\d+))?\s*$").unwrap()
});

/// `/silence true [seconds]` or `/silence false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SilenceCommand {
    /// Silence the channel, indefinitely when no (or a zero) duration is given.
    Enable(Option<Duration>),
    Disable,
    /// Matched the command shape but not a known action.
    Unknown(String),
}

impl SilenceCommand {
    /// Returns `None` when `text` is not a `/silence` command at all.
    pub fn parse(text: &str) -> Option<Self> {
        let captures = PATTERN.captures(text.trim())?;
        let action = captures.name("action")?.as_str();
        Some(match action {
            "true" => Self::Enable(
                captures
                    .name("duration")
                    .and_then(|d| d.as_str().parse::<u64>().ok())
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs),
            ),
            "false" => Self::Disable,
            other => Self::Unknown(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(SilenceCommand::parse("/silence true"), Some(SilenceCommand::Enable(None)));
        assert_eq!(
            SilenceCommand::parse("/silence true 600 "),
            Some(SilenceCommand::Enable(Some(Duration::from_secs(600))))
        );
        assert_eq!(SilenceCommand::parse("/silence true 0"), Some(SilenceCommand::Enable(None)));
        assert_eq!(SilenceCommand::parse("/silence false"), Some(SilenceCommand::Disable));
        assert_eq!(
            SilenceCommand::parse("/silence maybe"),
            Some(SilenceCommand::Unknown("maybe".into()))
        );
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(SilenceCommand::parse("silence true"), None);
        assert_eq!(SilenceCommand::parse("/silence"), None);
        assert_eq!(SilenceCommand::parse("/silence true ten"), None);
        assert_eq!(SilenceCommand::parse("/silence true -5"), None);
    }
}
