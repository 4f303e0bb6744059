//! Input-line decoding.
//!
//! A submitted line is either plain text, which becomes a user message, or a
//! slash command. Unknown commands are an error rather than a message, so a
//! typo never pollutes the tree.

use crate::error::{ArborError, Result};

/// A submitted input line, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Plain text: append as a user message, then generate under it.
    Say(String),
    /// A structured command.
    Command(SlashCommand),
}

/// A recognized slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    /// `/` or `/N`. `None` asks for the configured default count.
    Generate(Option<usize>),
    /// `/up`: navigate to the parent.
    Up,
    /// `/left`: navigate to the previous sibling.
    Left,
    /// `/right`: navigate to the next sibling.
    Right,
    /// `/save <title>`: bookmark the current node.
    Save(String),
    /// `/exit`: leave the session.
    Exit,
}

/// Decode a submitted line.
///
/// The caller is expected to skip blank lines; a lone `/` is the default
/// generation request, not a blank.
pub fn parse_submission(line: &str) -> Result<Submission> {
    let line = line.trim();
    let Some(body) = line.strip_prefix('/') else {
        return Ok(Submission::Say(line.to_string()));
    };

    let body = body.trim();
    if body.is_empty() {
        return Ok(Submission::Command(SlashCommand::Generate(None)));
    }

    if let Ok(count) = body.parse::<usize>() {
        if count == 0 {
            return Err(ArborError::validation("Completion count must be positive"));
        }
        return Ok(Submission::Command(SlashCommand::Generate(Some(count))));
    }

    let (word, rest) = match body.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (body, ""),
    };

    match word {
        "up" | "left" | "right" | "exit" if !rest.is_empty() => Err(ArborError::validation(
            format!("Command '/{word}' takes no argument"),
        )),
        "up" => Ok(Submission::Command(SlashCommand::Up)),
        "left" => Ok(Submission::Command(SlashCommand::Left)),
        "right" => Ok(Submission::Command(SlashCommand::Right)),
        "exit" => Ok(Submission::Command(SlashCommand::Exit)),
        "save" => {
            if rest.is_empty() {
                Err(ArborError::validation("Bookmark title cannot be empty"))
            } else {
                Ok(Submission::Command(SlashCommand::Save(rest.to_string())))
            }
        }
        _ => Err(ArborError::validation(format!("Unknown command: /{body}"))),
    }
}
