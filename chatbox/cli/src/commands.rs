//! Input line parsing
//!
//! Plain text is sent as a chat message; lines starting with `/` are
//! commands. Message numbers are 1-based, as printed in the transcript.

use std::path::PathBuf;

/// One parsed input line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Send text to the chat endpoint
    Say(String),
    /// Toggle like on message N
    Like(usize),
    /// Toggle dislike on message N
    Dislike(usize),
    /// Send follow-up suggestion N
    Follow(usize),
    /// Print message N for copying
    Copy(usize),
    /// Print message N for sharing
    Share(usize),
    /// Upload an image file
    Photo(PathBuf),
    /// Show command help
    Help,
    /// Save the session and exit
    Quit,
    /// Blank line
    Empty,
    /// Unrecognized or malformed command, with a hint
    Invalid(String),
}

/// Command summary printed by `/help`
pub const HELP: &str = "\
Commands:
  /like N      toggle like on message N
  /dislike N   toggle dislike on message N
  /follow N    send follow-up suggestion N
  /copy N      print message N
  /share N     print message N for sharing
  /photo PATH  upload an image
  /help        show this help
  /quit        save the session and exit
Anything else is sent as a message.";

impl Command {
    /// Parse one input line
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Self::Say(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name {
            "like" => Self::numbered(arg, Self::Like),
            "dislike" => Self::numbered(arg, Self::Dislike),
            "follow" => Self::numbered(arg, Self::Follow),
            "copy" => Self::numbered(arg, Self::Copy),
            "share" => Self::numbered(arg, Self::Share),
            "photo" if !arg.is_empty() => Self::Photo(PathBuf::from(arg)),
            "photo" => Self::Invalid("usage: /photo PATH".to_string()),
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => Self::Invalid(format!("unknown command /{other}, try /help")),
        }
    }

    fn numbered(arg: &str, build: fn(usize) -> Self) -> Self {
        match arg.parse::<usize>() {
            Ok(n) if n > 0 => build(n),
            _ => Self::Invalid(format!("expected a number from 1 up, got {arg:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_sent_verbatim() {
        assert_eq!(
            Command::parse("  hello there "),
            Command::Say("  hello there ".to_string())
        );
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(Command::parse("   "), Command::Empty);
    }

    #[test]
    fn test_numbered_commands() {
        assert_eq!(Command::parse("/like 3"), Command::Like(3));
        assert_eq!(Command::parse("/dislike 2"), Command::Dislike(2));
        assert_eq!(Command::parse("/follow 1"), Command::Follow(1));
        assert_eq!(Command::parse("/copy  4 "), Command::Copy(4));
        assert_eq!(Command::parse("/share 5"), Command::Share(5));
    }

    #[test]
    fn test_bad_numbers() {
        assert!(matches!(Command::parse("/like"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/like 0"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/follow two"), Command::Invalid(_)));
    }

    #[test]
    fn test_photo_path() {
        assert_eq!(
            Command::parse("/photo ./my pics/cat.jpg"),
            Command::Photo(PathBuf::from("./my pics/cat.jpg"))
        );
        assert!(matches!(Command::parse("/photo"), Command::Invalid(_)));
    }

    #[test]
    fn test_quit_and_unknown() {
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/q"), Command::Quit);
        assert_eq!(Command::parse("/help"), Command::Help);
        assert!(matches!(Command::parse("/dance"), Command::Invalid(_)));
    }
}
