//! Per-conversation transcript controller
//!
//! One [`ChatSessionController`] owns the transcript of the conversation
//! currently open in the chat view. It loads history on mount, appends an
//! optimistic user entry on send, awaits the authoritative assistant reply,
//! and reconciles the result. No other component reads or mutates the
//! transcript; it is discarded when the view navigates away.
//!
//! Two mechanisms harden the original behavior:
//!
//! - every network round-trip is split into a `begin_*` phase that hands
//!   out a ticket stamped with the controller's current epoch, and a
//!   `complete_*` phase that discards the result when the epoch moved on
//!   (the view was torn down while the request was in flight);
//! - sends hold a single in-flight slot, so a second send while one is
//!   outstanding is rejected instead of racing the first for reply order.

use crate::client::{ApiClient, ChatMessage, ChatTranscript};
use crate::error::Result;

/// Mount lifecycle of the chat view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, history not requested yet
    Idle,
    /// History request in flight
    Loading,
    /// History resolved (possibly to an empty transcript on failure)
    Ready,
}

/// Delivery status of a transcript entry
///
/// History and replies arrive `Delivered`. An optimistic user entry starts
/// `Pending` and is marked `Delivered` or `Failed` when its send resolves;
/// it stays visible either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Send dispatched, no response yet
    Pending,
    /// Confirmed by the backend
    Delivered,
    /// Send failed; the entry remains with this marker
    Failed,
}

/// One transcript element: the message plus its delivery status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// The message itself
    pub message: ChatMessage,
    /// Local delivery status
    pub delivery: Delivery,
}

impl TranscriptEntry {
    fn delivered(message: ChatMessage) -> Self {
        Self {
            message,
            delivery: Delivery::Delivered,
        }
    }
}

/// Ticket for an in-flight history load
#[derive(Debug, Clone, Copy)]
pub struct LoadTicket {
    epoch: u64,
}

/// Ticket for an in-flight send
#[derive(Debug, Clone, Copy)]
pub struct SendTicket {
    epoch: u64,
    entry_index: usize,
}

/// Outcome of attempting to begin a send
#[derive(Debug)]
pub enum SendAttempt {
    /// Optimistic entry appended; the request may be issued
    Begun(SendTicket),
    /// Whitespace-only input; nothing happened
    EmptyInput,
    /// A send is already in flight; rejected
    Busy,
}

/// Outcome of a completed send, for the view's benefit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Reply appended
    Sent,
    /// Send failed; user entry stays, marked failed
    Failed,
    /// Whitespace-only input; zero requests, zero mutation
    EmptyInput,
    /// Rejected by the in-flight guard
    Busy,
}

/// Controller owning one open conversation's transcript
pub struct ChatSessionController {
    chat_id: String,
    title: Option<String>,
    transcript: Vec<TranscriptEntry>,
    phase: Phase,
    sending: bool,
    epoch: u64,
}

impl ChatSessionController {
    /// Controller for the given conversation id, in the idle phase
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            title: None,
            transcript: Vec::new(),
            phase: Phase::Idle,
            sending: false,
            epoch: 0,
        }
    }

    /// The bound conversation id
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Conversation title, absent until loaded (or when the load failed)
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The transcript in display order
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Current mount phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a send currently holds the in-flight slot
    ///
    /// Views use this to show the typing indicator and disable the send
    /// affordance.
    pub fn sending(&self) -> bool {
        self.sending
    }

    // -- lifetime ----------------------------------------------------------

    /// Invalidate the controller on view teardown
    ///
    /// Any response carrying a ticket from before this call is discarded
    /// instead of applied to state the view no longer renders.
    pub fn invalidate(&mut self) {
        self.epoch += 1;
        self.sending = false;
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    // -- history load ------------------------------------------------------

    /// Enter the loading phase and stamp a ticket for the fetch
    pub fn begin_load(&mut self) -> LoadTicket {
        self.phase = Phase::Loading;
        LoadTicket { epoch: self.epoch }
    }

    /// Apply the history fetch result
    ///
    /// A failed fetch still reaches `Ready`, with an empty transcript and
    /// no title; there is no retry. A stale ticket is discarded.
    pub fn complete_load(&mut self, ticket: LoadTicket, result: Result<ChatTranscript>) {
        if !self.is_current(ticket.epoch) {
            tracing::debug!(chat_id = %self.chat_id, "Discarding history for a torn-down view");
            return;
        }

        match result {
            Ok(transcript) => {
                self.title = Some(transcript.title);
                self.transcript = transcript
                    .messages
                    .into_iter()
                    .map(TranscriptEntry::delivered)
                    .collect();
            }
            Err(e) => {
                tracing::warn!(chat_id = %self.chat_id, "Failed to load history: {}", e);
                self.title = None;
                self.transcript.clear();
            }
        }
        self.phase = Phase::Ready;
    }

    /// Load history from the backend
    ///
    /// Convenience composition of [`begin_load`](Self::begin_load) and
    /// [`complete_load`](Self::complete_load) around the HTTP call.
    pub async fn load(&mut self, client: &ApiClient) {
        let ticket = self.begin_load();
        let result = client.get_chat(&self.chat_id).await;
        self.complete_load(ticket, result);
    }

    // -- send --------------------------------------------------------------

    /// Append the optimistic user entry and claim the in-flight slot
    ///
    /// Returns [`SendAttempt::EmptyInput`] for whitespace-only text and
    /// [`SendAttempt::Busy`] while a previous send is outstanding; both
    /// leave the transcript untouched and must not issue a request.
    pub fn begin_send(&mut self, text: &str) -> SendAttempt {
        if text.trim().is_empty() {
            return SendAttempt::EmptyInput;
        }
        if self.sending {
            tracing::debug!(chat_id = %self.chat_id, "Send rejected: one already in flight");
            return SendAttempt::Busy;
        }

        self.transcript.push(TranscriptEntry {
            message: ChatMessage::user(text),
            delivery: Delivery::Pending,
        });
        self.sending = true;

        SendAttempt::Begun(SendTicket {
            epoch: self.epoch,
            entry_index: self.transcript.len() - 1,
        })
    }

    /// Apply the send result
    ///
    /// On success the optimistic entry is confirmed and the reply appended
    /// after it. On failure the entry stays visible, marked failed, with no
    /// reply and no retry. Either way the in-flight slot is released. A
    /// stale ticket is discarded entirely.
    pub fn complete_send(&mut self, ticket: SendTicket, result: Result<ChatMessage>) -> SendOutcome {
        if !self.is_current(ticket.epoch) {
            tracing::debug!(chat_id = %self.chat_id, "Discarding reply for a torn-down view");
            return SendOutcome::Failed;
        }

        self.sending = false;
        match result {
            Ok(reply) => {
                if let Some(entry) = self.transcript.get_mut(ticket.entry_index) {
                    entry.delivery = Delivery::Delivered;
                }
                self.transcript.push(TranscriptEntry::delivered(reply));
                SendOutcome::Sent
            }
            Err(e) => {
                tracing::warn!(chat_id = %self.chat_id, "Failed to send message: {}", e);
                if let Some(entry) = self.transcript.get_mut(ticket.entry_index) {
                    entry.delivery = Delivery::Failed;
                }
                SendOutcome::Failed
            }
        }
    }

    /// Send a user message and reconcile the assistant reply
    ///
    /// Convenience composition of [`begin_send`](Self::begin_send) and
    /// [`complete_send`](Self::complete_send) around the HTTP call.
    pub async fn send(&mut self, client: &ApiClient, text: &str) -> SendOutcome {
        let ticket = match self.begin_send(text) {
            SendAttempt::Begun(ticket) => ticket,
            SendAttempt::EmptyInput => return SendOutcome::EmptyInput,
            SendAttempt::Busy => return SendOutcome::Busy,
        };

        let result = client.add_message(&self.chat_id, text.trim()).await;
        self.complete_send(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParlanceError;

    fn transcript(title: &str, messages: Vec<ChatMessage>) -> ChatTranscript {
        ChatTranscript {
            title: title.to_string(),
            messages,
        }
    }

    fn backend_error() -> anyhow::Error {
        ParlanceError::Backend {
            status: 500,
            body: "boom".to_string(),
        }
        .into()
    }

    #[test]
    fn test_new_controller_is_idle_and_empty() {
        let controller = ChatSessionController::new("abc");
        assert_eq!(controller.chat_id(), "abc");
        assert_eq!(controller.phase(), Phase::Idle);
        assert!(controller.transcript().is_empty());
        assert!(controller.title().is_none());
        assert!(!controller.sending());
    }

    #[test]
    fn test_begin_load_enters_loading() {
        let mut controller = ChatSessionController::new("abc");
        let _ticket = controller.begin_load();
        assert_eq!(controller.phase(), Phase::Loading);
    }

    #[test]
    fn test_load_success_populates_transcript() {
        let mut controller = ChatSessionController::new("abc");
        let ticket = controller.begin_load();
        controller.complete_load(
            ticket,
            Ok(transcript(
                "Trip",
                vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")],
            )),
        );

        assert_eq!(controller.phase(), Phase::Ready);
        assert_eq!(controller.title(), Some("Trip"));
        assert_eq!(controller.transcript().len(), 2);
        assert!(controller
            .transcript()
            .iter()
            .all(|e| e.delivery == Delivery::Delivered));
    }

    #[test]
    fn test_load_failure_reaches_ready_with_empty_transcript() {
        let mut controller = ChatSessionController::new("abc");
        let ticket = controller.begin_load();
        controller.complete_load(ticket, Err(backend_error()));

        assert_eq!(controller.phase(), Phase::Ready);
        assert!(controller.title().is_none());
        assert!(controller.transcript().is_empty());
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let mut controller = ChatSessionController::new("abc");
        let ticket = controller.begin_load();
        controller.invalidate();
        controller.complete_load(ticket, Ok(transcript("Trip", vec![ChatMessage::user("x")])));

        assert!(controller.transcript().is_empty());
        assert!(controller.title().is_none());
    }

    #[test]
    fn test_begin_send_appends_pending_entry() {
        let mut controller = ChatSessionController::new("abc");
        let attempt = controller.begin_send("hi there");

        assert!(matches!(attempt, SendAttempt::Begun(_)));
        assert!(controller.sending());
        assert_eq!(controller.transcript().len(), 1);
        let entry = &controller.transcript()[0];
        assert_eq!(entry.message, ChatMessage::user("hi there"));
        assert_eq!(entry.delivery, Delivery::Pending);
    }

    #[test]
    fn test_begin_send_whitespace_is_noop() {
        let mut controller = ChatSessionController::new("abc");
        let attempt = controller.begin_send("   \t ");

        assert!(matches!(attempt, SendAttempt::EmptyInput));
        assert!(controller.transcript().is_empty());
        assert!(!controller.sending());
    }

    #[test]
    fn test_second_send_rejected_while_in_flight() {
        let mut controller = ChatSessionController::new("abc");
        let first = controller.begin_send("first");
        assert!(matches!(first, SendAttempt::Begun(_)));

        let second = controller.begin_send("second");
        assert!(matches!(second, SendAttempt::Busy));
        assert_eq!(controller.transcript().len(), 1);
    }

    #[test]
    fn test_send_success_appends_reply_in_order() {
        let mut controller = ChatSessionController::new("abc");
        let ticket = match controller.begin_send("hi") {
            SendAttempt::Begun(ticket) => ticket,
            other => panic!("Expected Begun, got {:?}", other),
        };

        let outcome = controller.complete_send(ticket, Ok(ChatMessage::assistant("hello!")));

        assert_eq!(outcome, SendOutcome::Sent);
        assert!(!controller.sending());
        assert_eq!(controller.transcript().len(), 2);
        assert_eq!(controller.transcript()[0].message, ChatMessage::user("hi"));
        assert_eq!(controller.transcript()[0].delivery, Delivery::Delivered);
        assert_eq!(
            controller.transcript()[1].message,
            ChatMessage::assistant("hello!")
        );
    }

    #[test]
    fn test_send_failure_marks_entry_and_keeps_it() {
        let mut controller = ChatSessionController::new("abc");
        let ticket = match controller.begin_send("hi") {
            SendAttempt::Begun(ticket) => ticket,
            other => panic!("Expected Begun, got {:?}", other),
        };

        let outcome = controller.complete_send(ticket, Err(backend_error()));

        assert_eq!(outcome, SendOutcome::Failed);
        assert!(!controller.sending());
        assert_eq!(controller.transcript().len(), 1);
        assert_eq!(controller.transcript()[0].delivery, Delivery::Failed);
    }

    #[test]
    fn test_send_slot_reusable_after_completion() {
        let mut controller = ChatSessionController::new("abc");
        let ticket = match controller.begin_send("one") {
            SendAttempt::Begun(ticket) => ticket,
            other => panic!("Expected Begun, got {:?}", other),
        };
        controller.complete_send(ticket, Ok(ChatMessage::assistant("1")));

        assert!(matches!(controller.begin_send("two"), SendAttempt::Begun(_)));
    }

    #[test]
    fn test_stale_send_completion_is_discarded() {
        let mut controller = ChatSessionController::new("abc");
        let ticket = match controller.begin_send("hi") {
            SendAttempt::Begun(ticket) => ticket,
            other => panic!("Expected Begun, got {:?}", other),
        };

        controller.invalidate();
        controller.complete_send(ticket, Ok(ChatMessage::assistant("late reply")));

        // The optimistic entry survives from before invalidation, but the
        // late reply must not be appended and the slot stays released.
        assert_eq!(controller.transcript().len(), 1);
        assert_eq!(controller.transcript()[0].delivery, Delivery::Pending);
        assert!(!controller.sending());
    }

    #[test]
    fn test_invalidate_releases_send_slot() {
        let mut controller = ChatSessionController::new("abc");
        let _ = controller.begin_send("hi");
        assert!(controller.sending());

        controller.invalidate();
        assert!(!controller.sending());
    }
}
