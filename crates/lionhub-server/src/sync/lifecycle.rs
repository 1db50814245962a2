//! Hooks run after a show or its sign-ups change.
//!
//! A hook that finds its channel archived by the time it holds the lock does
//! nothing; the show was cancelled while the hook was waiting.

use super::ChannelSynchronizer;
use crate::error::{AppError, Result};
use crate::models::{SlackChannel, SlackUser};
use uuid::Uuid;

impl ChannelSynchronizer {
    /// Provisions the show's channel, invites everyone and posts the briefing.
    pub async fn show_scheduled(&self, show_id: Uuid) -> Result<SlackChannel> {
        if let Some(existing) = self.channels.find_active_for_show(show_id).await? {
            return Err(AppError::Conflict(format!(
                "Show already has channel {}",
                existing.id
            )));
        }

        let show = self.shows.snapshot(show_id).await?;
        let channel_id = self.chat.create_channel(&show.default_channel_name()).await?;
        let mut channel = SlackChannel::new(channel_id, show_id);
        self.channels.insert(&channel).await?;

        let _guard = self.locks.acquire(&channel.id).await;
        self.invite_show_members(&channel, &show, true).await?;
        self.post_briefing(&mut channel, &show).await?;

        tracing::info!("Provisioned channel {} for show {}", channel.id, show_id);
        Ok(channel)
    }

    /// Brings name and briefing up to date and announces the changed fields.
    /// Shows without an active channel are left alone.
    pub async fn show_updated<S: AsRef<str>>(
        &self,
        show_id: Uuid,
        updated_fields: &[S],
    ) -> Result<()> {
        let Some(mut channel) = self.channels.find_active_for_show(show_id).await? else {
            tracing::debug!("Show {} has no active channel, nothing to sync", show_id);
            return Ok(());
        };

        let _guard = self.locks.acquire(&channel.id).await;
        self.reload(&mut channel).await?;
        if channel.archived {
            tracing::debug!("Channel {} was archived, skipping update", channel.id);
            return Ok(());
        }

        let show = self.shows.snapshot(show_id).await?;
        self.chat
            .rename_channel(&channel.id, &show.default_channel_name(), true)
            .await?;
        self.post_briefing(&mut channel, &show).await?;

        if !updated_fields.is_empty() {
            self.post_update_notice(&channel, updated_fields).await?;
        }
        Ok(())
    }

    pub async fn performer_added(&self, show_id: Uuid, member_id: Uuid) -> Result<()> {
        let Some((mut channel, slack_user)) = self.linked_target(show_id, member_id).await? else {
            return Ok(());
        };

        let _guard = self.locks.acquire(&channel.id).await;
        self.reload(&mut channel).await?;
        if channel.archived {
            tracing::debug!("Channel {} was archived, not inviting", channel.id);
            return Ok(());
        }
        self.add_members(&channel, &[slack_user.id]).await
    }

    pub async fn performer_removed(&self, show_id: Uuid, member_id: Uuid) -> Result<()> {
        let Some((mut channel, slack_user)) = self.linked_target(show_id, member_id).await? else {
            return Ok(());
        };

        let _guard = self.locks.acquire(&channel.id).await;
        self.reload(&mut channel).await?;
        if channel.archived {
            tracing::debug!("Channel {} was archived, not removing", channel.id);
            return Ok(());
        }
        self.kick_members(&channel, &[slack_user.id]).await
    }

    /// Archives the show's channel under a timestamped name.
    pub async fn show_cancelled(&self, show_id: Uuid) -> Result<()> {
        match self.channels.find_active_for_show(show_id).await? {
            Some(mut channel) => self.archive(&mut channel, true).await,
            None => {
                tracing::debug!("Show {} has no active channel to archive", show_id);
                Ok(())
            }
        }
    }

    async fn linked_target(
        &self,
        show_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<(SlackChannel, SlackUser)>> {
        let Some(channel) = self.channels.find_active_for_show(show_id).await? else {
            return Ok(None);
        };
        match self.shows.slack_user_for_member(member_id).await? {
            Some(slack_user) => Ok(Some((channel, slack_user))),
            None => {
                tracing::debug!("Member {} has no linked chat user", member_id);
                Ok(None)
            }
        }
    }
}
