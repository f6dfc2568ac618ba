//! Authenticated session state
//!
//! A [`SessionContext`] is constructed when a protected command starts
//! under a stored credential and dropped when the command ends or the user
//! signs out. It owns the per-session shared state (the conversation list)
//! and the list-level operations: create, rename, delete. Per-conversation
//! transcript state lives in [`ChatSessionController`] instead, owned by
//! the chat view for exactly one open conversation at a time.
//!
//! Nothing here is a process-wide global; views receive the context by
//! reference and cannot outlive it.

pub mod chat_list;
pub mod controller;

pub use chat_list::{display_title, ChatListStore};
pub use controller::{
    ChatSessionController, Delivery, Phase, SendAttempt, SendOutcome, TranscriptEntry,
};

use crate::auth::StoredCredential;
use crate::client::{ApiClient, ChatSummary, CreatedChat};

/// Outcome of a delete operation, for the view's navigation decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Removed from the backend and the local list
    Deleted {
        /// True when the deleted conversation was the one currently open;
        /// the view must navigate away to a neutral landing state.
        was_open: bool,
    },
    /// Backend refused or the request failed; the list is unchanged
    Failed,
}

/// Per-session shared state: the credential and the conversation list
pub struct SessionContext {
    credential: StoredCredential,
    chat_list: ChatListStore,
}

impl SessionContext {
    /// Establish a session around a stored credential
    pub fn establish(credential: StoredCredential) -> Self {
        Self {
            credential,
            chat_list: ChatListStore::new(),
        }
    }

    /// The credential this session runs under
    pub fn credential(&self) -> &StoredCredential {
        &self.credential
    }

    /// Shared conversation list state
    pub fn chat_list(&self) -> &ChatListStore {
        &self.chat_list
    }

    /// Fetch the conversation list, once per session
    pub async fn ensure_chat_list(&mut self, client: &ApiClient) {
        self.chat_list.ensure_fetched(client).await;
    }

    /// Create a conversation and insert it into the local list
    ///
    /// Empty or whitespace-only title or first message is a silent no-op
    /// before any request. On success the summary is inserted optimistically
    /// (the list is not re-fetched) and the caller navigates to the returned
    /// id. On failure the error is logged and the view stays in place.
    pub async fn create_chat(
        &mut self,
        client: &ApiClient,
        title: &str,
        first_message: &str,
    ) -> Option<CreatedChat> {
        let title = title.trim();
        let first_message = first_message.trim();
        if title.is_empty() || first_message.is_empty() {
            return None;
        }

        match client.create_chat(title, first_message).await {
            Ok(created) => {
                self.chat_list.add_chat(ChatSummary {
                    id: created.id.clone(),
                    title: title.to_string(),
                });
                Some(created)
            }
            Err(e) => {
                tracing::warn!("Failed to create conversation: {}", e);
                None
            }
        }
    }

    /// Rename a conversation, committing locally only after backend success
    ///
    /// Empty or whitespace-only titles are a silent no-op before any
    /// request. On failure the store is never touched, so the displayed
    /// title reverts to the prior value by construction. Returns whether
    /// the rename was committed.
    pub async fn rename_chat(&mut self, client: &ApiClient, id: &str, new_title: &str) -> bool {
        let new_title = new_title.trim();
        if new_title.is_empty() {
            return false;
        }

        match client.rename_chat(id, new_title).await {
            Ok(()) => {
                self.chat_list.update_title(id, new_title);
                true
            }
            Err(e) => {
                tracing::warn!(id, "Failed to rename conversation: {}", e);
                false
            }
        }
    }

    /// Delete a conversation, removing it locally only after backend success
    ///
    /// `open_id` is the conversation the chat view currently has open, if
    /// any; deleting that one tells the view to navigate away.
    pub async fn delete_chat(
        &mut self,
        client: &ApiClient,
        id: &str,
        open_id: Option<&str>,
    ) -> DeleteOutcome {
        match client.delete_chat(id).await {
            Ok(()) => {
                self.chat_list.remove(id);
                DeleteOutcome::Deleted {
                    was_open: open_id == Some(id),
                }
            }
            Err(e) => {
                tracing::warn!(id, "Failed to delete conversation: {}", e);
                DeleteOutcome::Failed
            }
        }
    }
}
