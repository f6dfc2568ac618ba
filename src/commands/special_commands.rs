//! Special commands parser for the interactive chat session
//!
//! This module parses the slash commands available inside the chat REPL.
//! Special commands let users:
//! - Browse and open conversations
//! - Create, rename, and delete conversations
//! - View session status
//! - Display help information
//! - Sign out or exit the session
//!
//! Commands are prefixed with `/`; anything else is sent as a message to
//! the open conversation.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during the chat session
///
/// These commands drive the conversation list and session state rather
/// than being sent to the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Show the conversation list
    ListChats,

    /// Open a conversation by id or by its position in the list (1-based)
    OpenChat(String),

    /// Create a conversation
    ///
    /// The title may be given inline; the first message (and a missing
    /// title) are prompted for interactively.
    NewChat { title: Option<String> },

    /// Rename the open conversation
    RenameChat(String),

    /// Delete a conversation
    ///
    /// With no argument, deletes the open conversation; otherwise the
    /// argument names an id or list position.
    DeleteChat(Option<String>),

    /// Close the open conversation and return to the list
    CloseChat,

    /// Display session status (signed-in state, open conversation, counts)
    ShowStatus,

    /// Display help information
    Help,

    /// Sign out, discarding the stored credential, and leave the session
    SignOut,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent as a message to the open conversation.
    None,
}

/// Parse a user input string into a special command
///
/// Commands are case-insensitive in their command word; arguments keep
/// their original casing. Input not starting with `/` (except `exit` and
/// `quit`) is returned as [`SpecialCommand::None`].
///
/// # Errors
///
/// Returns [`CommandError::UnknownCommand`] if input starts with `/` but is
/// not a valid command, and [`CommandError::MissingArgument`] when a
/// required argument is absent.
///
/// # Examples
///
/// ```
/// use parlance::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/open abc123").unwrap();
/// assert_eq!(cmd, SpecialCommand::OpenChat("abc123".to_string()));
///
/// let cmd = parse_special_command("hello there").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/frobnicate").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match word.as_str() {
        "/chats" | "/list" => Ok(SpecialCommand::ListChats),

        "/open" => {
            if rest.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/open".to_string(),
                    usage: "/open <id or list position>".to_string(),
                })
            } else {
                Ok(SpecialCommand::OpenChat(rest.to_string()))
            }
        }

        "/new" => Ok(SpecialCommand::NewChat {
            title: if rest.is_empty() {
                None
            } else {
                Some(rest.to_string())
            },
        }),

        "/rename" => {
            if rest.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/rename".to_string(),
                    usage: "/rename <new title>".to_string(),
                })
            } else {
                Ok(SpecialCommand::RenameChat(rest.to_string()))
            }
        }

        "/delete" => Ok(SpecialCommand::DeleteChat(if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        })),

        "/close" => Ok(SpecialCommand::CloseChat),

        "/status" => Ok(SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),

        "/signout" => Ok(SpecialCommand::SignOut),
        "exit" | "quit" | "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        _ if trimmed.starts_with('/') => {
            let cmd = trimmed.split_whitespace().next().unwrap_or(trimmed);
            Err(CommandError::UnknownCommand(cmd.to_string()))
        }

        _ => Ok(SpecialCommand::None),
    }
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for the Chat Session
=====================================

CONVERSATIONS:
  /chats             - Show your conversations
  /list              - Same as /chats
  /open <id|n>       - Open a conversation by id or list position
  /new [title]       - Create a conversation (prompts for what's missing)
  /close             - Close the open conversation

MANAGEMENT:
  /rename <title>    - Rename the open conversation
  /delete [id|n]     - Delete a conversation (default: the open one)

SESSION:
  /status            - Show session status
  /signout           - Sign out and leave the session
  /help or /?        - Show this help message
  exit or quit       - Leave the session (stays signed in)

NOTES:
  - Anything not starting with / is sent to the open conversation
  - The assistant replies to each message you send
  - Open a conversation first (or /new one) before chatting
"#
    );
}
