//! HTTP client for the remote conversation service
//!
//! This module implements the wire contract of the backend: authentication,
//! conversation listing, history fetch, message send, and the rename/delete
//! management calls. Every request carries a JSON content type; the bearer
//! credential is attached only when one is present, since the backend keys
//! on header presence rather than an empty value.
//!
//! Failures are classified uniformly: a non-2xx response becomes
//! [`ParlanceError::Backend`] with the status and raw body, a transport
//! fault becomes [`ParlanceError::Http`]. The client never retries and
//! never cancels an in-flight request.

use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{ParlanceError, Result};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One conversation's identity and display name, as listed by the backend
///
/// Never holds message content; the transcript is fetched separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    /// Server-assigned conversation id, unique per user
    pub id: String,
    /// Display title
    pub title: String,
}

/// A single message in a conversation transcript
///
/// The role is an open string on the wire; `user` and `assistant` are the
/// values the backend produces today, but consumers tolerate anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message author role (`user`, `assistant`, ...)
    pub role: String,
    /// Message body
    pub text: String,
}

impl ChatMessage {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use parlance::client::ChatMessage;
    ///
    /// let msg = ChatMessage::user("Hello!");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            text: text.into(),
        }
    }

    /// Creates a new assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            text: text.into(),
        }
    }
}

/// Full materialized state of one conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTranscript {
    /// Conversation title
    pub title: String,
    /// Ordered message history; display order is chronological order
    pub messages: Vec<ChatMessage>,
}

/// Result of creating a conversation
///
/// The backend answers with a JSON array whose element 0 is the new
/// conversation id; element 1, when present, is the assistant's reply to
/// the first message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedChat {
    /// Server-assigned id of the new conversation
    pub id: String,
    /// Assistant reply to the first message, when the backend includes it
    pub first_reply: Option<ChatMessage>,
}

impl CreatedChat {
    /// Parse the create-chat response array
    ///
    /// Tolerates trailing elements beyond the two the backend sends today;
    /// only element 0 is required.
    fn from_value(value: Value) -> Result<Self> {
        let items = value.as_array().ok_or_else(|| {
            ParlanceError::Session("create_chat response is not a sequence".to_string())
        })?;

        let id = items
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ParlanceError::Session(
                    "create_chat response has no conversation id at element 0".to_string(),
                )
            })?
            .to_string();

        let first_reply = items
            .get(1)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok());

        Ok(Self { id, first_reply })
    }
}

/// Login success payload: the session envelope holding the bearer token
#[derive(Debug, Deserialize)]
struct LoginResponse {
    session: SessionTokens,
}

#[derive(Debug, Deserialize)]
struct SessionTokens {
    access_token: String,
}

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

/// HTTP client bound to one backend base URL and at most one credential
///
/// # Examples
///
/// ```no_run
/// use parlance::client::ApiClient;
/// use parlance::config::Config;
///
/// # async fn example() -> parlance::error::Result<()> {
/// let config = Config::default();
/// let client = ApiClient::new(&config)?.with_credential("tok_abc");
/// let chats = client.list_chats().await?;
/// # Ok(())
/// # }
/// ```
pub struct ApiClient {
    client: Client,
    base_url: String,
    credential: Option<String>,
}

impl ApiClient {
    /// Create a client for the configured backend, with no credential
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.backend.timeout_seconds))
            .user_agent(concat!("parlance/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ParlanceError::Config(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::debug!(base_url = %config.backend_base(), "Initialized backend client");

        Ok(Self {
            client,
            base_url: config.backend_base(),
            credential: None,
        })
    }

    /// Attach a bearer credential to every subsequent request
    pub fn with_credential(mut self, token: impl Into<String>) -> Self {
        self.credential = Some(token.into());
        self
    }

    /// Replace or remove the bearer credential
    pub fn set_credential(&mut self, token: Option<String>) {
        self.credential = token;
    }

    /// Whether a credential is currently attached
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn prepare(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, self.url(path))
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(token) = &self.credential {
            builder = builder.bearer_auth(token);
        }

        builder
    }

    /// Issue a request and classify the outcome
    ///
    /// An empty or non-JSON success body maps to `Value::Null`; the
    /// management endpoints only promise a 2xx status.
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let mut builder = self.prepare(method.clone(), path);
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(%method, path, "Request failed to complete: {}", e);
            ParlanceError::Http(e)
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            tracing::warn!(%method, path, status = status.as_u16(), "Backend rejected request");
            return Err(ParlanceError::Backend {
                status: status.as_u16(),
                body: text,
            }
            .into());
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::Null))
    }

    // -- authentication ----------------------------------------------------

    /// Exchange email and password for a bearer token
    ///
    /// Does not store the credential; callers persist it through the
    /// credential store on success.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let value = self
            .request(
                Method::POST,
                "/login",
                Some(json!({ "email": email, "password": password })),
            )
            .await?;
        let response: LoginResponse = serde_json::from_value(value)?;
        Ok(response.session.access_token)
    }

    /// Create an account
    ///
    /// The success body is unused; a non-2xx status carries the backend's
    /// `{detail}` explanation.
    pub async fn signup(&self, email: &str, password: &str) -> Result<()> {
        self.request(
            Method::POST,
            "/signup",
            Some(json!({ "email": email, "password": password })),
        )
        .await?;
        Ok(())
    }

    /// Invalidate the server-side session
    pub async fn signout(&self) -> Result<()> {
        self.request(Method::POST, "/signout", None).await?;
        Ok(())
    }

    // -- conversations -----------------------------------------------------

    /// Fetch the conversation list
    pub async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        let value = self.request(Method::GET, "/list_chats", None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetch one conversation's title and full message history
    pub async fn get_chat(&self, id: &str) -> Result<ChatTranscript> {
        let value = self
            .request(Method::GET, &format!("/get_chat/{}", id), None)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Create a conversation seeded with its first user message
    pub async fn create_chat(&self, title: &str, first_message: &str) -> Result<CreatedChat> {
        let value = self
            .request(
                Method::POST,
                "/create_chat",
                Some(json!({
                    "chat_title": title,
                    "first_message": ChatMessage::user(first_message),
                })),
            )
            .await?;
        CreatedChat::from_value(value)
    }

    /// Send a user message; the response is the assistant's reply
    pub async fn add_message(&self, id: &str, text: &str) -> Result<ChatMessage> {
        let value = self
            .request(
                Method::POST,
                &format!("/add_message_to_chat/{}", id),
                Some(serde_json::to_value(ChatMessage::user(text))?),
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Rename a conversation; only the status matters
    pub async fn rename_chat(&self, id: &str, title: &str) -> Result<()> {
        self.request(
            Method::PUT,
            &format!("/rename_chat/{}", id),
            Some(json!({ "title": title })),
        )
        .await?;
        Ok(())
    }

    /// Delete a conversation; only the status matters
    pub async fn delete_chat(&self, id: &str) -> Result<()> {
        self.request(Method::DELETE, &format!("/delete_chat/{}", id), None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_user_constructor() {
        let msg = ChatMessage::user("hello");
        assert_eq!(msg.role, "user");
        assert_eq!(msg.text, "hello");
    }

    #[test]
    fn test_chat_message_assistant_constructor() {
        let msg = ChatMessage::assistant("hi there");
        assert_eq!(msg.role, "assistant");
        assert_eq!(msg.text, "hi there");
    }

    #[test]
    fn test_chat_message_serializes_role_and_text() {
        let json = serde_json::to_value(ChatMessage::user("ping")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "user", "text": "ping" }));
    }

    #[test]
    fn test_created_chat_from_full_response() {
        let value = serde_json::json!(["abc123", { "role": "assistant", "text": "hello!" }]);
        let created = CreatedChat::from_value(value).unwrap();
        assert_eq!(created.id, "abc123");
        assert_eq!(created.first_reply, Some(ChatMessage::assistant("hello!")));
    }

    #[test]
    fn test_created_chat_from_id_only_response() {
        let created = CreatedChat::from_value(serde_json::json!(["xyz"])).unwrap();
        assert_eq!(created.id, "xyz");
        assert_eq!(created.first_reply, None);
    }

    #[test]
    fn test_created_chat_tolerates_extra_elements() {
        let value = serde_json::json!(["id-1", { "role": "assistant", "text": "r" }, 42]);
        let created = CreatedChat::from_value(value).unwrap();
        assert_eq!(created.id, "id-1");
        assert!(created.first_reply.is_some());
    }

    #[test]
    fn test_created_chat_rejects_non_array() {
        assert!(CreatedChat::from_value(serde_json::json!({ "id": "x" })).is_err());
    }

    #[test]
    fn test_created_chat_rejects_missing_id() {
        assert!(CreatedChat::from_value(serde_json::json!([])).is_err());
        assert!(CreatedChat::from_value(serde_json::json!([17, "x"])).is_err());
    }

    #[test]
    fn test_created_chat_malformed_reply_is_dropped() {
        let value = serde_json::json!(["id-2", { "unexpected": true }]);
        let created = CreatedChat::from_value(value).unwrap();
        assert_eq!(created.id, "id-2");
        assert_eq!(created.first_reply, None);
    }

    #[test]
    fn test_client_credential_toggling() {
        let config = Config::default();
        let mut client = ApiClient::new(&config).unwrap();
        assert!(!client.has_credential());

        client.set_credential(Some("tok".to_string()));
        assert!(client.has_credential());

        client.set_credential(None);
        assert!(!client.has_credential());
    }

    #[test]
    fn test_client_with_credential_builder() {
        let config = Config::default();
        let client = ApiClient::new(&config).unwrap().with_credential("tok");
        assert!(client.has_credential());
    }

    #[test]
    fn test_url_join_with_trailing_slash_config() {
        let mut config = Config::default();
        config.backend.base_url = "http://localhost:8000/".to_string();
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.url("/list_chats"), "http://localhost:8000/list_chats");
    }

    #[test]
    fn test_transcript_deserializes() {
        let transcript: ChatTranscript = serde_json::from_value(serde_json::json!({
            "title": "Trip planning",
            "messages": [
                { "role": "user", "text": "hi" },
                { "role": "assistant", "text": "hello" }
            ]
        }))
        .unwrap();
        assert_eq!(transcript.title, "Trip planning");
        assert_eq!(transcript.messages.len(), 2);
        assert_eq!(transcript.messages[0], ChatMessage::user("hi"));
    }
}
