//! Session-wide conversation list state
//!
//! One [`ChatListStore`] exists per authenticated session and is shared by
//! every surface that renders the conversation list. The network fetch runs
//! at most once per session; later mounts reuse the held list. Local
//! mutations mirror backend operations: an optimistic insert after create,
//! and confirmed-only updates for rename and delete.

use crate::client::{ApiClient, ChatSummary};

/// Shared conversation list for one authenticated session
///
/// Invariant: `fetched` flips to true at most once per session, after the
/// first successful fetch. This is a de-duplication guard across view
/// mounts, not a cache with expiry; there is no refresh operation short of
/// tearing the session down.
#[derive(Debug, Default)]
pub struct ChatListStore {
    chats: Vec<ChatSummary>,
    fetched: bool,
    loading: bool,
}

impl ChatListStore {
    /// Empty store for a freshly established session
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the list from the backend, once per session
    ///
    /// A no-op when a fetch already succeeded. On failure the list stays
    /// empty and the error is logged; the next call will try again. The
    /// `loading` flag is cleared on every exit path.
    pub async fn ensure_fetched(&mut self, client: &ApiClient) {
        if self.fetched {
            return;
        }

        self.loading = true;
        match client.list_chats().await {
            Ok(chats) => {
                tracing::debug!(count = chats.len(), "Fetched conversation list");
                self.chats = chats;
                self.fetched = true;
            }
            Err(e) => {
                tracing::warn!("Failed to fetch conversation list: {}", e);
            }
        }
        self.loading = false;
    }

    /// Optimistic local insert after a successful create
    ///
    /// The authoritative list is never re-fetched to confirm it.
    pub fn add_chat(&mut self, summary: ChatSummary) {
        self.chats.push(summary);
    }

    /// Local rename of the matching entry
    ///
    /// Called only after the backend rename returned success; an unknown id
    /// leaves the list untouched.
    pub fn update_title(&mut self, id: &str, title: impl Into<String>) {
        let title = title.into();
        if let Some(chat) = self.chats.iter_mut().find(|c| c.id == id) {
            chat.title = title;
        } else {
            tracing::warn!(id, "Rename for a conversation not in the list");
        }
    }

    /// Local removal of the matching entry
    ///
    /// Called only after the backend delete returned success.
    pub fn remove(&mut self, id: &str) {
        self.chats.retain(|c| c.id != id);
    }

    /// The held conversation list, in backend order
    pub fn chats(&self) -> &[ChatSummary] {
        &self.chats
    }

    /// Look up one conversation by id
    pub fn get(&self, id: &str) -> Option<&ChatSummary> {
        self.chats.iter().find(|c| c.id == id)
    }

    /// Whether the one-shot fetch has succeeded
    pub fn fetched(&self) -> bool {
        self.fetched
    }

    /// Whether a fetch is currently in flight
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// True when the list is known and empty
    ///
    /// Views render an explicit "no chats" placeholder for this state
    /// rather than an empty region.
    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }
}

/// Truncate a title to `width` characters for list rendering
///
/// Display-only: the stored title is never mutated. Longer titles lose
/// their tail to a three-dot ellipsis inside the budget.
pub fn display_title(title: &str, width: usize) -> String {
    if title.chars().count() <= width {
        title.to_string()
    } else {
        let mut truncated: String = title.chars().take(width.saturating_sub(3)).collect();
        truncated.push_str("...");
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, title: &str) -> ChatSummary {
        ChatSummary {
            id: id.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_new_store_is_unfetched_and_empty() {
        let store = ChatListStore::new();
        assert!(!store.fetched());
        assert!(!store.loading());
        assert!(store.is_empty());
        assert_eq!(store.chats().len(), 0);
    }

    #[test]
    fn test_add_chat_appends() {
        let mut store = ChatListStore::new();
        store.add_chat(summary("a", "First"));
        store.add_chat(summary("b", "Second"));

        assert_eq!(store.chats().len(), 2);
        assert_eq!(store.chats()[0].id, "a");
        assert_eq!(store.chats()[1].id, "b");
    }

    #[test]
    fn test_update_title_changes_matching_entry_only() {
        let mut store = ChatListStore::new();
        store.add_chat(summary("a", "First"));
        store.add_chat(summary("b", "Second"));

        store.update_title("b", "Renamed");

        assert_eq!(store.chats()[0].title, "First");
        assert_eq!(store.chats()[1].title, "Renamed");
    }

    #[test]
    fn test_update_title_unknown_id_is_noop() {
        let mut store = ChatListStore::new();
        store.add_chat(summary("a", "First"));

        store.update_title("missing", "Renamed");

        assert_eq!(store.chats()[0].title, "First");
        assert_eq!(store.chats().len(), 1);
    }

    #[test]
    fn test_remove_deletes_matching_entry() {
        let mut store = ChatListStore::new();
        store.add_chat(summary("a", "First"));
        store.add_chat(summary("b", "Second"));

        store.remove("a");

        assert_eq!(store.chats().len(), 1);
        assert_eq!(store.chats()[0].id, "b");
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut store = ChatListStore::new();
        store.add_chat(summary("a", "First"));

        store.remove("missing");

        assert_eq!(store.chats().len(), 1);
    }

    #[test]
    fn test_get_finds_by_id() {
        let mut store = ChatListStore::new();
        store.add_chat(summary("a", "First"));

        assert_eq!(store.get("a").map(|c| c.title.as_str()), Some("First"));
        assert!(store.get("b").is_none());
    }

    #[test]
    fn test_display_title_short_passthrough() {
        assert_eq!(display_title("Quick note", 32), "Quick note");
    }

    #[test]
    fn test_display_title_exact_width_passthrough() {
        assert_eq!(display_title("abcd", 4), "abcd");
    }

    #[test]
    fn test_display_title_truncates_with_ellipsis() {
        let truncated = display_title("A very long conversation title", 12);
        assert_eq!(truncated, "A very lo...");
        assert_eq!(truncated.chars().count(), 12);
    }

    #[test]
    fn test_display_title_never_mutates_store() {
        let mut store = ChatListStore::new();
        store.add_chat(summary("a", "A very long conversation title"));

        let _ = display_title(&store.chats()[0].title, 8);

        assert_eq!(store.chats()[0].title, "A very long conversation title");
    }
}
