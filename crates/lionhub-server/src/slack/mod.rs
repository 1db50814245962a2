//! Chat platform adapter.
//!
//! [`ChatClient`] is the seam between the channel sync and the workspace; the
//! production implementation is [`SlackWebClient`], tests substitute their own.

mod web;

pub use web::SlackWebClient;

use async_trait::async_trait;
use lionhub_protocol::Block;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} failed: {error}")]
    Api { method: String, error: String },

    #[error("Rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    #[error("Malformed response from {method}: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ChatError {
    /// Platform error code, when the platform answered with one
    pub fn code(&self) -> Option<&str> {
        match self {
            ChatError::Api { error, .. } => Some(error),
            _ => None,
        }
    }
}

pub type ChatResult<T> = std::result::Result<T, ChatError>;

/// Operations the hub performs against the chat workspace.
///
/// Every call is a network round trip and may fail; implementations do not
/// retry.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Creates a public channel and returns its id
    async fn create_channel(&self, name: &str) -> ChatResult<String>;

    /// With `check`, the live name is read first and the rename is skipped
    /// when it already matches.
    async fn rename_channel(&self, channel_id: &str, name: &str, check: bool) -> ChatResult<()>;

    async fn archive_channel(&self, channel_id: &str) -> ChatResult<()>;

    async fn invite_users_to_channel(
        &self,
        channel_id: &str,
        user_ids: &[String],
    ) -> ChatResult<()>;

    async fn remove_users_from_channel(
        &self,
        channel_id: &str,
        user_ids: &[String],
    ) -> ChatResult<()>;

    /// Posts a new message when `ts` is absent or empty, otherwise updates the
    /// message at `ts`. Returns the message ts and whether it was newly posted.
    async fn send_message_in_channel(
        &self,
        channel_id: &str,
        blocks: &[Block],
        text: &str,
        ts: Option<&str>,
    ) -> ChatResult<(String, bool)>;

    async fn pin_message_in_channel(&self, channel_id: &str, ts: &str) -> ChatResult<()>;
}
