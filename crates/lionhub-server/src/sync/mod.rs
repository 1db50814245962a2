//! Keeps each show's chat channel in line with the show.
//!
//! The synchronizer owns no data of its own. It reads shows through a
//! [`ShowDirectory`], talks to the workspace through a [`ChatClient`] and
//! records channel ids, briefing timestamps and the archived flag through a
//! [`ChannelStore`]. Local state is written only after the matching chat call
//! succeeded; a failure in between leaves the remote side ahead of the record
//! and is not repaired automatically.

pub mod format;
mod lifecycle;

use crate::error::{AppError, Result};
use crate::models::{ShowSnapshot, SlackChannel, SlackUser};
use crate::slack::ChatClient;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use lionhub_protocol::{Block, TextObject};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Update notices within this many seconds of the briefing post are dropped.
pub const UPDATE_DEBOUNCE_SECS: i64 = 10;

/// Read side of shows, members and their chat identities
#[async_trait]
pub trait ShowDirectory: Send + Sync {
    async fn snapshot(&self, show_id: Uuid) -> Result<ShowSnapshot>;

    /// Chat identities of everyone in the chat admin group
    async fn chat_admins(&self) -> Result<Vec<SlackUser>>;

    async fn slack_user_for_member(&self, member_id: Uuid) -> Result<Option<SlackUser>>;
}

/// Persistence of [`SlackChannel`] records
#[async_trait]
pub trait ChannelStore: Send + Sync {
    async fn get(&self, channel_id: &str) -> Result<Option<SlackChannel>>;

    async fn find_active_for_show(&self, show_id: Uuid) -> Result<Option<SlackChannel>>;

    async fn insert(&self, channel: &SlackChannel) -> Result<()>;

    /// Writes `briefing_ts` and `archived`
    async fn save(&self, channel: &SlackChannel) -> Result<()>;
}

/// One async mutex per channel id, held across multi-call sequences.
#[derive(Default)]
struct ChannelLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ChannelLocks {
    async fn for_channel(&self, channel_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        // entries nobody holds or waits on
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(channel_id.to_string()).or_default().clone()
    }

    async fn acquire(&self, channel_id: &str) -> OwnedMutexGuard<()> {
        self.for_channel(channel_id).await.lock_owned().await
    }
}

pub struct ChannelSynchronizer {
    chat: Arc<dyn ChatClient>,
    shows: Arc<dyn ShowDirectory>,
    channels: Arc<dyn ChannelStore>,
    locks: ChannelLocks,
}

/// Every public operation takes the channel's lock, reloads the stored record
/// and only then talks to the workspace. The private helpers below assume the
/// lock is already held and never take it themselves.
impl ChannelSynchronizer {
    pub fn new(
        chat: Arc<dyn ChatClient>,
        shows: Arc<dyn ShowDirectory>,
        channels: Arc<dyn ChannelStore>,
    ) -> Self {
        Self {
            chat,
            shows,
            channels,
            locks: ChannelLocks::default(),
        }
    }

    /// Full reconciliation: name, membership and briefing.
    pub async fn force_refresh(&self, channel: &mut SlackChannel) -> Result<()> {
        let _guard = self.locks.acquire(&channel.id).await;
        self.reload(channel).await?;
        ensure_active(channel)?;

        let show = self.shows.snapshot(channel.show_id).await?;
        self.chat
            .rename_channel(&channel.id, &show.default_channel_name(), true)
            .await?;
        self.invite_show_members(channel, &show, true).await?;
        self.post_briefing(channel, &show).await?;

        tracing::info!("Refreshed channel {} for show {}", channel.id, channel.show_id);
        Ok(())
    }

    /// Renames the channel, to the show's canonical name when `name` is `None`.
    ///
    /// With `check` the adapter skips the rename if the live name already matches.
    pub async fn update_name(
        &self,
        channel: &SlackChannel,
        name: Option<&str>,
        check: bool,
    ) -> Result<()> {
        let _guard = self.locks.acquire(&channel.id).await;
        let channel = self.current(channel).await?;

        let name = match name {
            Some(name) => name.to_string(),
            None => self
                .shows
                .snapshot(channel.show_id)
                .await?
                .default_channel_name(),
        };
        self.chat.rename_channel(&channel.id, &name, check).await?;
        Ok(())
    }

    /// Archives the channel. Does nothing if it is already archived.
    ///
    /// With `rename` the channel first gets a timestamped name so that a new
    /// channel for the same show can take the canonical one. The rename has to
    /// land before the archive call.
    pub async fn archive(&self, channel: &mut SlackChannel, rename: bool) -> Result<()> {
        let _guard = self.locks.acquire(&channel.id).await;

        // another caller may have archived it since this copy was loaded
        self.reload(channel).await?;
        if channel.archived {
            tracing::debug!("Channel {} already archived", channel.id);
            return Ok(());
        }

        if rename {
            let show = self.shows.snapshot(channel.show_id).await?;
            let name = format::archived_channel_name(&show.default_channel_name(), Utc::now());
            self.chat.rename_channel(&channel.id, &name, false).await?;
        }
        self.chat.archive_channel(&channel.id).await?;

        channel.archived = true;
        self.channels.save(channel).await?;

        tracing::info!("Archived channel {} for show {}", channel.id, channel.show_id);
        Ok(())
    }

    /// Invites one or more users, e.g. `[&user]` or `&users`.
    pub async fn invite_users<'a>(
        &self,
        channel: &SlackChannel,
        users: impl IntoIterator<Item = &'a SlackUser>,
    ) -> Result<()> {
        let _guard = self.locks.acquire(&channel.id).await;
        let channel = self.current(channel).await?;
        self.add_members(&channel, &user_ids(users)).await
    }

    pub async fn remove_users<'a>(
        &self,
        channel: &SlackChannel,
        users: impl IntoIterator<Item = &'a SlackUser>,
    ) -> Result<()> {
        let _guard = self.locks.acquire(&channel.id).await;
        let channel = self.current(channel).await?;
        self.kick_members(&channel, &user_ids(users)).await
    }

    /// Invites every current performer with a linked chat identity, and the
    /// chat admins when `invite_admin` is set.
    pub async fn invite_performers(
        &self,
        channel: &SlackChannel,
        invite_admin: bool,
    ) -> Result<()> {
        let _guard = self.locks.acquire(&channel.id).await;
        let channel = self.current(channel).await?;
        let show = self.shows.snapshot(channel.show_id).await?;
        self.invite_show_members(&channel, &show, invite_admin)
            .await
    }

    pub async fn invite_admin(&self, channel: &SlackChannel) -> Result<()> {
        let _guard = self.locks.acquire(&channel.id).await;
        let channel = self.current(channel).await?;
        self.invite_chat_admins(&channel).await
    }

    /// Tells the channel which show fields changed.
    ///
    /// Returns `false` when the notice was dropped because the briefing went
    /// out less than [`UPDATE_DEBOUNCE_SECS`] ago, which is what happens when
    /// a show is created and edited right away.
    pub async fn send_update_message<S: AsRef<str>>(
        &self,
        channel: &SlackChannel,
        updated_fields: &[S],
    ) -> Result<bool> {
        let _guard = self.locks.acquire(&channel.id).await;
        let channel = self.current(channel).await?;
        self.post_update_notice(&channel, updated_fields).await
    }

    /// Posts the briefing, or edits it in place when one already exists. A
    /// freshly posted briefing is pinned and its ts recorded.
    pub async fn send_or_update_briefing(&self, channel: &mut SlackChannel) -> Result<()> {
        let _guard = self.locks.acquire(&channel.id).await;
        self.reload(channel).await?;
        ensure_active(channel)?;

        let show = self.shows.snapshot(channel.show_id).await?;
        self.post_briefing(channel, &show).await
    }

    /// Replaces the caller's copy with the stored record, if there is one.
    async fn reload(&self, channel: &mut SlackChannel) -> Result<()> {
        if let Some(stored) = self.channels.get(&channel.id).await? {
            *channel = stored;
        }
        Ok(())
    }

    /// Fresh copy of the record, which has to be active
    async fn current(&self, channel: &SlackChannel) -> Result<SlackChannel> {
        let mut channel = channel.clone();
        self.reload(&mut channel).await?;
        ensure_active(&channel)?;
        Ok(channel)
    }

    async fn add_members(&self, channel: &SlackChannel, user_ids: &[String]) -> Result<()> {
        self.chat
            .invite_users_to_channel(&channel.id, user_ids)
            .await?;
        Ok(())
    }

    async fn kick_members(&self, channel: &SlackChannel, user_ids: &[String]) -> Result<()> {
        self.chat
            .remove_users_from_channel(&channel.id, user_ids)
            .await?;
        Ok(())
    }

    async fn invite_chat_admins(&self, channel: &SlackChannel) -> Result<()> {
        let admins = self.shows.chat_admins().await?;
        if admins.is_empty() {
            tracing::debug!("No chat admins to invite to {}", channel.id);
            return Ok(());
        }
        self.add_members(channel, &user_ids(&admins)).await
    }

    async fn invite_show_members(
        &self,
        channel: &SlackChannel,
        show: &ShowSnapshot,
        invite_admin: bool,
    ) -> Result<()> {
        let performers = show.performer_slack_users();
        if performers.is_empty() {
            tracing::debug!("No linked performers to invite to {}", channel.id);
        } else {
            self.add_members(channel, &user_ids(&performers)).await?;
        }

        if invite_admin {
            self.invite_chat_admins(channel).await?;
        }
        Ok(())
    }

    async fn post_update_notice<S: AsRef<str>>(
        &self,
        channel: &SlackChannel,
        updated_fields: &[S],
    ) -> Result<bool> {
        if !channel.has_briefing() {
            return Err(AppError::Usage(
                "Update message should not be sent if briefing does not exist".to_string(),
            ));
        }
        if updated_fields.is_empty() {
            return Err(AppError::Validation(
                "There are no updated fields".to_string(),
            ));
        }

        let posted_at = briefing_posted_at(&channel.briefing_ts)?;
        if is_debounced(posted_at, Utc::now()) {
            tracing::debug!(
                "Skipping update notice in {}, briefing {} is too recent",
                channel.id,
                channel.briefing_ts
            );
            return Ok(false);
        }

        let message = format::update_notice(updated_fields);
        let blocks = [Block::section(TextObject::mrkdwn(message.as_str()))];
        self.chat
            .send_message_in_channel(&channel.id, &blocks, &message, None)
            .await?;
        Ok(true)
    }

    async fn post_briefing(&self, channel: &mut SlackChannel, show: &ShowSnapshot) -> Result<()> {
        let briefing = format::briefing(show);
        let (ts, created) = self
            .chat
            .send_message_in_channel(
                &channel.id,
                &briefing.blocks,
                &briefing.text,
                Some(channel.briefing_ts.as_str()),
            )
            .await?;

        if created {
            self.chat.pin_message_in_channel(&channel.id, &ts).await?;
            channel.briefing_ts = ts;
            self.channels.save(channel).await?;
            tracing::info!("Posted briefing {} in {}", channel.briefing_ts, channel.id);
        } else {
            tracing::debug!("Updated briefing {} in {}", channel.briefing_ts, channel.id);
        }
        Ok(())
    }
}

fn ensure_active(channel: &SlackChannel) -> Result<()> {
    if channel.archived {
        return Err(AppError::Usage(format!(
            "Channel {} is archived",
            channel.id
        )));
    }
    Ok(())
}

fn user_ids<'a>(users: impl IntoIterator<Item = &'a SlackUser>) -> Vec<String> {
    users.into_iter().map(|user| user.id.clone()).collect()
}

/// Post time encoded in a message ts (`<unix seconds>.<sub-second digits>`)
fn briefing_posted_at(ts: &str) -> Result<DateTime<Utc>> {
    let malformed = || AppError::Usage(format!("Briefing timestamp {:?} is malformed", ts));

    let (secs, frac) = ts.split_once('.').unwrap_or((ts, ""));
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let secs: i64 = secs.parse().map_err(|_| malformed())?;
    let micros: u32 = if frac.is_empty() {
        0
    } else {
        format!("{:0<6}", &frac[..frac.len().min(6)])
            .parse()
            .map_err(|_| malformed())?
    };

    DateTime::from_timestamp(secs, micros * 1_000).ok_or_else(malformed)
}

/// Notices within [`UPDATE_DEBOUNCE_SECS`] of the briefing, inclusive, are dropped.
fn is_debounced(posted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - posted_at <= Duration::seconds(UPDATE_DEBOUNCE_SECS)
}
