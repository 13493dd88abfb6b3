//! Bot command parsing.
//!
//! Commands take a `/` or `!` prefix and match case-sensitively. A trailing
//! `@botname` on the command word (as Telegram sends in groups) is ignored.
//! Anything that is not one of these commands goes to model selection and
//! chat routing.

/// Names reserved for built-in commands; model tokens may not use them.
pub const BUILTIN_COMMANDS: &[&str] = &["start", "models", "privacypolicy", "ownerannouncement"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Start,
    Models,
    PrivacyPolicy,
    /// `body` is the text after the command word, trimmed.
    OwnerAnnouncement { body: &'a str },
}

/// Parse a built-in command. Returns `None` for everything else.
pub fn parse_command(text: &str) -> Option<Command<'_>> {
    let rest = text.strip_prefix(['/', '!'])?;
    let (word, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let name = word.split_once('@').map(|(name, _)| name).unwrap_or(word);

    match name {
        "start" => Some(Command::Start),
        "models" => Some(Command::Models),
        "privacypolicy" => Some(Command::PrivacyPolicy),
        "ownerannouncement" => Some(Command::OwnerAnnouncement { body: tail.trim() }),
        _ => None,
    }
}
