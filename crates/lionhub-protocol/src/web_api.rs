//! Request bodies and response payloads of the Web API methods used by the hub.
//!
//! Every response carries an `ok` flag and, when it is false, an `error` code.
//! Method specific payloads are decoded separately from [`ApiStatus`] so that
//! error responses never fail to parse.

use crate::blocks::Block;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ApiStatus {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
}

/// Payload of `conversations.create` and `conversations.info`
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationPayload {
    pub channel: Conversation,
}

/// Payload of `chat.postMessage` and `chat.update`
#[derive(Debug, Clone, Deserialize)]
pub struct MessagePayload {
    pub channel: String,
    pub ts: String,
}

#[derive(Debug, Serialize)]
pub struct CreateConversation<'a> {
    pub name: &'a str,
    pub is_private: bool,
}

#[derive(Debug, Serialize)]
pub struct RenameConversation<'a> {
    pub channel: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ConversationRef<'a> {
    pub channel: &'a str,
}

#[derive(Debug, Serialize)]
pub struct InviteToConversation<'a> {
    pub channel: &'a str,
    /// Comma separated user ids
    pub users: String,
    /// Keep inviting the valid ids when some of them fail
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct KickFromConversation<'a> {
    pub channel: &'a str,
    pub user: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PostMessage<'a> {
    pub channel: &'a str,
    pub blocks: &'a [Block],
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct UpdateMessage<'a> {
    pub channel: &'a str,
    pub ts: &'a str,
    pub blocks: &'a [Block],
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PinMessage<'a> {
    pub channel: &'a str,
    pub timestamp: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_parses_without_payload() {
        let status: ApiStatus =
            serde_json::from_str(r#"{"ok":false,"error":"name_taken"}"#).unwrap();
        assert!(!status.ok);
        assert_eq!(status.error.as_deref(), Some("name_taken"));
    }

    #[test]
    fn invite_serializes_comma_joined_users() {
        let body = InviteToConversation {
            channel: "C123",
            users: ["U1", "U2"].join(","),
            force: true,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["users"], "U1,U2");
        assert_eq!(value["force"], true);
    }
}
