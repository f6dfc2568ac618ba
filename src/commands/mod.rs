/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes four top-level command modules:

- `auth`  — Login, signup, and signout
- `chats` — One-shot conversation listing
- `chat`  — Interactive chat session
- `special_commands` — Slash command parsing for the chat session

These handlers are intentionally small and use the library components:
the API client, the credential store, and the session state. Operation
failures are caught here, logged, and rendered as "nothing happened";
no failure in a handler crashes the process.
*/

use crate::auth::{AuthGate, CredentialStore, StoredCredential};
use crate::client::ApiClient;
use crate::config::Config;
use crate::error::{ParlanceError, Result};
use crate::session::{display_title, SessionContext};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

// Special commands parser for the chat session
pub mod special_commands;

/// Read one line, treating Ctrl-C/Ctrl-D as "nothing entered"
fn prompt_line(rl: &mut DefaultEditor, prompt: &str) -> Result<Option<String>> {
    match rl.readline(prompt) {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Lightweight email shape check before a request is attempted
fn valid_email(email: &str) -> bool {
    regex::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

/// Print the sign-in hint used whenever a protected command is gated
fn print_auth_hint() {
    println!("You are not signed in. Run `parlance login` first.");
}

// Authentication command handlers
pub mod auth {
    //! Login, signup, and signout handlers.
    //!
    //! Login and signup surface the backend's `detail` message inline on
    //! failure; every other failure mode degrades to a printed line.

    use super::*;

    /// Sign in and persist the session credential
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `email` - Email from the CLI, prompted for when absent
    pub async fn run_login(config: Config, email: Option<String>) -> Result<()> {
        let client = ApiClient::new(&config)?;
        let mut rl = DefaultEditor::new()?;

        let email = match email {
            Some(email) => email,
            None => match prompt_line(&mut rl, "email: ")? {
                Some(line) => line.trim().to_string(),
                None => return Ok(()),
            },
        };
        if !valid_email(&email) {
            println!("That does not look like an email address.");
            return Ok(());
        }

        let password = match prompt_line(&mut rl, "password: ")? {
            Some(line) => line,
            None => return Ok(()),
        };
        if password.trim().is_empty() {
            println!("Password cannot be empty.");
            return Ok(());
        }

        match client.login(&email, &password).await {
            Ok(token) => {
                CredentialStore::new().save(&StoredCredential::new(token))?;
                println!("Signed in as {}.", email);
            }
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                let detail = e
                    .downcast_ref::<ParlanceError>()
                    .and_then(|pe| pe.backend_detail())
                    .unwrap_or_else(|| "Login failed".to_string());
                println!("{}", detail);
            }
        }
        Ok(())
    }

    /// Create an account
    ///
    /// On success the user is pointed at `login`, mirroring the service's
    /// signup-then-sign-in flow.
    pub async fn run_signup(config: Config, email: Option<String>) -> Result<()> {
        let client = ApiClient::new(&config)?;
        let mut rl = DefaultEditor::new()?;

        let email = match email {
            Some(email) => email,
            None => match prompt_line(&mut rl, "email: ")? {
                Some(line) => line.trim().to_string(),
                None => return Ok(()),
            },
        };
        if !valid_email(&email) {
            println!("That does not look like an email address.");
            return Ok(());
        }

        let password = match prompt_line(&mut rl, "password: ")? {
            Some(line) => line,
            None => return Ok(()),
        };
        if password.trim().is_empty() {
            println!("Password cannot be empty.");
            return Ok(());
        }

        match client.signup(&email, &password).await {
            Ok(()) => println!("Account created. Sign in with `parlance login`."),
            Err(e) => {
                tracing::warn!("Signup failed: {}", e);
                let detail = e
                    .downcast_ref::<ParlanceError>()
                    .and_then(|pe| pe.backend_detail())
                    .unwrap_or_else(|| "Signup failed".to_string());
                println!("{}", detail);
            }
        }
        Ok(())
    }

    /// Sign out: invalidate the server session, then drop the credential
    ///
    /// The credential is cleared only after the backend confirms, matching
    /// the service's sign-out contract; a missing credential short-circuits
    /// to "already signed out".
    pub async fn run_signout(config: Config) -> Result<()> {
        let store = CredentialStore::new();
        let credential = match store.load()? {
            Some(credential) => credential,
            None => {
                println!("Already signed out.");
                return Ok(());
            }
        };

        let client = ApiClient::new(&config)?.with_credential(credential.access_token);
        match client.signout().await {
            Ok(()) => {
                store.clear()?;
                println!("Signed out.");
            }
            Err(e) => {
                tracing::warn!("Signout failed: {}", e);
                println!("Signout failed; credential kept. Try again later.");
            }
        }
        Ok(())
    }
}

// Conversation listing handler
pub mod chats {
    //! One-shot conversation listing.
    //!
    //! Renders the list as a table (or JSON with `--json`). Gated on the
    //! stored credential: no request is issued when signed out.

    use super::*;
    use prettytable::{format, row, Table};

    /// List conversations to stdout
    pub async fn run_chats(config: Config, json: bool) -> Result<()> {
        let store = CredentialStore::new();
        let credential = match AuthGate::require(&store) {
            Ok(credential) => credential,
            Err(_) => {
                print_auth_hint();
                return Ok(());
            }
        };

        let client = ApiClient::new(&config)?.with_credential(credential.access_token.clone());
        let mut session = SessionContext::establish(credential);
        session.ensure_chat_list(&client).await;

        if json {
            println!("{}", serde_json::to_string_pretty(session.chat_list().chats())?);
            return Ok(());
        }

        if session.chat_list().is_empty() {
            println!("No chats available.");
            return Ok(());
        }

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_CLEAN);
        table.set_titles(row!["#", "ID", "TITLE"]);
        for (idx, chat) in session.chat_list().chats().iter().enumerate() {
            table.add_row(row![
                idx + 1,
                chat.id,
                display_title(&chat.title, config.ui.title_width)
            ]);
        }
        table.printstd();
        Ok(())
    }
}

// Interactive chat session handler
pub mod chat {
    //! Interactive chat session.
    //!
    //! Establishes the session context, runs a readline loop, and routes
    //! each line either to the slash command handlers or to the open
    //! conversation as a message.

    use super::*;
    use crate::session::{
        ChatSessionController, Delivery, DeleteOutcome, SendOutcome, TranscriptEntry,
    };
    use colored::Colorize;
    use special_commands::{parse_special_command, print_help, SpecialCommand};

    /// Start the interactive chat session
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `open` - Conversation id to open immediately, when given
    pub async fn run_chat(config: Config, open: Option<String>) -> Result<()> {
        let store = CredentialStore::new();
        let credential = match AuthGate::require(&store) {
            Ok(credential) => credential,
            Err(_) => {
                print_auth_hint();
                return Ok(());
            }
        };

        let client = ApiClient::new(&config)?.with_credential(credential.access_token.clone());
        let mut session = SessionContext::establish(credential);
        session.ensure_chat_list(&client).await;

        let mut rl = DefaultEditor::new()?;
        let mut controller: Option<ChatSessionController> = None;

        print_welcome_banner();
        render_chat_list(&session, &config);

        if let Some(id) = open {
            open_conversation(&mut controller, &client, &session, &id).await;
        }

        loop {
            let prompt = format_prompt(controller.as_ref());
            let line = match rl.readline(&prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let _ = rl.add_history_entry(trimmed);

            let command = match parse_special_command(trimmed) {
                Ok(command) => command,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };

            match command {
                SpecialCommand::ListChats => {
                    render_chat_list(&session, &config);
                }
                SpecialCommand::OpenChat(target) => {
                    match resolve_chat_target(&session, &target) {
                        Some(id) => {
                            open_conversation(&mut controller, &client, &session, &id).await
                        }
                        None => println!("No conversation matches '{}'.", target),
                    }
                }
                SpecialCommand::NewChat { title } => {
                    handle_new_chat(&mut controller, &mut session, &client, &mut rl, title)
                        .await?;
                }
                SpecialCommand::RenameChat(new_title) => {
                    let Some(open_id) = controller.as_ref().map(|c| c.chat_id().to_string())
                    else {
                        println!("Open a conversation first.");
                        continue;
                    };
                    if session.rename_chat(&client, &open_id, &new_title).await {
                        println!("Renamed to '{}'.", new_title.trim());
                    }
                }
                SpecialCommand::DeleteChat(target) => {
                    let id = match &target {
                        Some(target) => resolve_chat_target(&session, target),
                        None => controller.as_ref().map(|c| c.chat_id().to_string()),
                    };
                    let Some(id) = id else {
                        println!("Nothing to delete: open a conversation or name one.");
                        continue;
                    };

                    let open_id = controller.as_ref().map(|c| c.chat_id().to_string());
                    match session.delete_chat(&client, &id, open_id.as_deref()).await {
                        DeleteOutcome::Deleted { was_open } => {
                            println!("Deleted.");
                            if was_open {
                                close_conversation(&mut controller);
                            }
                        }
                        DeleteOutcome::Failed => println!("Delete failed; nothing changed."),
                    }
                }
                SpecialCommand::CloseChat => {
                    close_conversation(&mut controller);
                }
                SpecialCommand::ShowStatus => {
                    print_status(&session, controller.as_ref());
                }
                SpecialCommand::Help => print_help(),
                SpecialCommand::SignOut => {
                    close_conversation(&mut controller);
                    drop(session);
                    auth::run_signout(config).await?;
                    return Ok(());
                }
                SpecialCommand::Exit => break,
                SpecialCommand::None => {
                    let Some(controller) = controller.as_mut() else {
                        println!("No conversation open. Use /open or /new first.");
                        continue;
                    };

                    println!("{}", "assistant is typing...".dimmed().italic());
                    match controller.send(&client, trimmed).await {
                        SendOutcome::Sent => {
                            if let Some(entry) = controller.transcript().last() {
                                render_entry(entry);
                            }
                        }
                        SendOutcome::Failed => {
                            println!("{}", "(message not delivered)".red().italic());
                        }
                        SendOutcome::Busy => {
                            println!("Still waiting for the assistant; hold on.");
                        }
                        SendOutcome::EmptyInput => {}
                    }
                }
            }
        }

        Ok(())
    }

    /// Create a conversation, prompting for missing pieces, then open it
    async fn handle_new_chat(
        controller: &mut Option<ChatSessionController>,
        session: &mut SessionContext,
        client: &ApiClient,
        rl: &mut DefaultEditor,
        title: Option<String>,
    ) -> Result<()> {
        let title = match title {
            Some(title) => title,
            None => match prompt_line(rl, "title: ")? {
                Some(line) => line,
                None => return Ok(()),
            },
        };

        let first_message = match prompt_line(rl, "first message: ")? {
            Some(line) => line,
            None => return Ok(()),
        };

        if title.trim().is_empty() || first_message.trim().is_empty() {
            println!("Both a title and a first message are needed.");
            return Ok(());
        }

        println!("{}", "assistant is typing...".dimmed().italic());
        match session.create_chat(client, &title, &first_message).await {
            Some(created) => {
                if let Some(reply) = &created.first_reply {
                    println!("{} {}", "assistant:".cyan().bold(), reply.text);
                }
                open_conversation(controller, client, session, &created.id).await;
            }
            None => println!("Could not create the conversation."),
        }
        Ok(())
    }

    /// Tear down the previous controller (if any) and mount a new one
    async fn open_conversation(
        controller: &mut Option<ChatSessionController>,
        client: &ApiClient,
        session: &SessionContext,
        id: &str,
    ) {
        close_conversation(controller);

        let mut next = ChatSessionController::new(id);
        println!("{}", "loading messages...".dimmed().italic());
        next.load(client).await;

        match next.title() {
            Some(title) => println!("=== {} ===", title.bold()),
            None => println!("=== (untitled conversation) ==="),
        }
        if next.transcript().is_empty() {
            println!("{}", "No messages yet. Start chatting!".dimmed().italic());
        }
        for entry in next.transcript() {
            render_entry(entry);
        }

        // Keep the list consistent with what the session knows about this id.
        if session.chat_list().get(id).is_none() && session.chat_list().fetched() {
            tracing::debug!(id, "Opened a conversation not present in the list");
        }

        *controller = Some(next);
    }

    /// Invalidate and drop the open controller
    fn close_conversation(controller: &mut Option<ChatSessionController>) {
        if let Some(mut old) = controller.take() {
            old.invalidate();
        }
    }

    /// Resolve a user-entered target to a conversation id
    ///
    /// Accepts a 1-based list position or an exact id.
    fn resolve_chat_target(session: &SessionContext, target: &str) -> Option<String> {
        let chats = session.chat_list().chats();
        if let Ok(position) = target.parse::<usize>() {
            if position >= 1 && position <= chats.len() {
                return Some(chats[position - 1].id.clone());
            }
        }
        session.chat_list().get(target).map(|c| c.id.clone())
    }

    fn format_prompt(controller: Option<&ChatSessionController>) -> String {
        match controller {
            Some(c) => format!("[{}] >> ", c.title().unwrap_or("untitled")),
            None => "[no conversation] >> ".to_string(),
        }
    }

    fn render_chat_list(session: &SessionContext, config: &Config) {
        if session.chat_list().is_empty() {
            println!("{}", "No chats available.".dimmed().italic());
            return;
        }
        println!("{}", "Chats".bold());
        for (idx, chat) in session.chat_list().chats().iter().enumerate() {
            println!(
                "  {}. {}  {}",
                idx + 1,
                display_title(&chat.title, config.ui.title_width),
                chat.id.dimmed()
            );
        }
    }

    fn render_entry(entry: &TranscriptEntry) {
        let tag = match entry.message.role.as_str() {
            "user" => "you:".green().bold(),
            "assistant" => "assistant:".cyan().bold(),
            other => format!("{}:", other).as_str().bold(),
        };
        let marker = match entry.delivery {
            Delivery::Pending => " (sending)".dimmed().italic().to_string(),
            Delivery::Failed => " (not delivered)".red().italic().to_string(),
            Delivery::Delivered => String::new(),
        };
        println!("{} {}{}", tag, entry.message.text, marker);
    }

    fn print_status(session: &SessionContext, controller: Option<&ChatSessionController>) {
        println!(
            "Signed in since: {}",
            session.credential().saved_at.format("%Y-%m-%d %H:%M UTC")
        );
        println!(
            "Conversations: {} ({})",
            session.chat_list().chats().len(),
            if session.chat_list().fetched() {
                "fetched"
            } else {
                "not fetched"
            }
        );
        match controller {
            Some(c) => println!(
                "Open: {} [{}]{}",
                c.title().unwrap_or("untitled"),
                c.chat_id(),
                if c.sending() { " (sending)" } else { "" }
            ),
            None => println!("Open: none"),
        }
    }

    fn print_welcome_banner() {
        println!("{}", "parlance".bold());
        println!("Type /help for commands; plain text goes to the open conversation.\n");
    }
}
