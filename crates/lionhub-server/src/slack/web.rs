use super::{ChatClient, ChatError, ChatResult};
use async_trait::async_trait;
use lionhub_protocol::Block;
use lionhub_protocol::web_api::{
    ApiStatus, ConversationPayload, ConversationRef, CreateConversation, InviteToConversation,
    KickFromConversation, MessagePayload, PinMessage, PostMessage, RenameConversation,
    UpdateMessage,
};
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use std::time::Duration;

/// [`ChatClient`] backed by the Slack Web API
#[derive(Clone)]
pub struct SlackWebClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl SlackWebClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> ChatResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn post<B, T>(&self, method: &str, body: &B) -> ChatResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.url(method))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        decode(method, response).await
    }

    async fn get<T: DeserializeOwned>(&self, method: &str, query: &[(&str, &str)]) -> ChatResult<T> {
        let response = self
            .http
            .get(self.url(method))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;
        decode(method, response).await
    }

    /// Posts and treats the listed platform error codes as success.
    async fn post_tolerating<B>(&self, method: &str, body: &B, tolerated: &[&str]) -> ChatResult<()>
    where
        B: Serialize + ?Sized,
    {
        match self.post::<B, IgnoredAny>(method, body).await {
            Ok(_) => Ok(()),
            Err(e) if e.code().is_some_and(|code| tolerated.contains(&code)) => {
                tracing::debug!("{} returned {}, nothing to do", method, e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn post_message(
        &self,
        channel_id: &str,
        blocks: &[Block],
        text: &str,
    ) -> ChatResult<(String, bool)> {
        let payload: MessagePayload = self
            .post(
                "chat.postMessage",
                &PostMessage {
                    channel: channel_id,
                    blocks,
                    text,
                },
            )
            .await?;
        Ok((payload.ts, true))
    }
}

async fn decode<T: DeserializeOwned>(method: &str, response: reqwest::Response) -> ChatResult<T> {
    if response.status() == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);
        return Err(ChatError::RateLimited { retry_after });
    }

    let value: serde_json::Value = response.error_for_status()?.json().await?;
    let malformed = |source: serde_json::Error| ChatError::Decode {
        method: method.to_string(),
        source,
    };

    let status: ApiStatus = serde_json::from_value(value.clone()).map_err(malformed)?;
    if !status.ok {
        return Err(ChatError::Api {
            method: method.to_string(),
            error: status.error.unwrap_or_else(|| "unknown_error".to_string()),
        });
    }

    serde_json::from_value(value).map_err(malformed)
}

#[async_trait]
impl ChatClient for SlackWebClient {
    async fn create_channel(&self, name: &str) -> ChatResult<String> {
        let payload: ConversationPayload = self
            .post(
                "conversations.create",
                &CreateConversation {
                    name,
                    is_private: false,
                },
            )
            .await?;
        tracing::info!("Created channel #{} ({})", payload.channel.name, payload.channel.id);
        Ok(payload.channel.id)
    }

    async fn rename_channel(&self, channel_id: &str, name: &str, check: bool) -> ChatResult<()> {
        if check {
            let info: ConversationPayload = self
                .get("conversations.info", &[("channel", channel_id)])
                .await?;
            if info.channel.name == name {
                tracing::debug!("Channel {} already named #{}", channel_id, name);
                return Ok(());
            }
        }

        let _: IgnoredAny = self
            .post(
                "conversations.rename",
                &RenameConversation {
                    channel: channel_id,
                    name,
                },
            )
            .await?;
        tracing::info!("Renamed channel {} to #{}", channel_id, name);
        Ok(())
    }

    async fn archive_channel(&self, channel_id: &str) -> ChatResult<()> {
        self.post_tolerating(
            "conversations.archive",
            &ConversationRef {
                channel: channel_id,
            },
            &["already_archived"],
        )
        .await?;
        tracing::info!("Archived channel {}", channel_id);
        Ok(())
    }

    async fn invite_users_to_channel(
        &self,
        channel_id: &str,
        user_ids: &[String],
    ) -> ChatResult<()> {
        if user_ids.is_empty() {
            return Ok(());
        }

        self.post_tolerating(
            "conversations.invite",
            &InviteToConversation {
                channel: channel_id,
                users: user_ids.join(","),
                force: true,
            },
            &["already_in_channel", "cant_invite_self"],
        )
        .await?;
        tracing::debug!("Invited {} user(s) to {}", user_ids.len(), channel_id);
        Ok(())
    }

    async fn remove_users_from_channel(
        &self,
        channel_id: &str,
        user_ids: &[String],
    ) -> ChatResult<()> {
        for user_id in user_ids {
            self.post_tolerating(
                "conversations.kick",
                &KickFromConversation {
                    channel: channel_id,
                    user: user_id,
                },
                &["not_in_channel"],
            )
            .await?;
        }
        tracing::debug!("Removed {} user(s) from {}", user_ids.len(), channel_id);
        Ok(())
    }

    async fn send_message_in_channel(
        &self,
        channel_id: &str,
        blocks: &[Block],
        text: &str,
        ts: Option<&str>,
    ) -> ChatResult<(String, bool)> {
        let Some(ts) = ts.filter(|ts| !ts.is_empty()) else {
            return self.post_message(channel_id, blocks, text).await;
        };

        let update = UpdateMessage {
            channel: channel_id,
            ts,
            blocks,
            text,
        };
        match self.post::<_, MessagePayload>("chat.update", &update).await {
            Ok(payload) => Ok((payload.ts, false)),
            Err(e) if e.code() == Some("message_not_found") => {
                tracing::warn!("Message {} in {} is gone, posting a new one", ts, channel_id);
                self.post_message(channel_id, blocks, text).await
            }
            Err(e) => Err(e),
        }
    }

    async fn pin_message_in_channel(&self, channel_id: &str, ts: &str) -> ChatResult<()> {
        self.post_tolerating(
            "pins.add",
            &PinMessage {
                channel: channel_id,
                timestamp: ts,
            },
            &["already_pinned"],
        )
        .await
    }
}
