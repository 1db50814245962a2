use crate::error::{AppError, Result};
use crate::models::SlackChannel;
use crate::sync::ChannelStore;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Postgres-backed [`ChannelStore`]
#[derive(Clone)]
pub struct ChannelService {
    db: PgPool,
}

impl ChannelService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Every channel the show ever had, archived ones first
    pub async fn list_by_show(&self, show_id: Uuid) -> Result<Vec<SlackChannel>> {
        let channels = sqlx::query_as::<_, SlackChannel>(
            r#"
            SELECT id, show_id, briefing_ts, archived
            FROM slack_channels WHERE show_id = $1
            ORDER BY archived DESC, id
            "#,
        )
        .bind(show_id)
        .fetch_all(&self.db)
        .await?;

        Ok(channels)
    }

    pub async fn get_active_for_show(&self, show_id: Uuid) -> Result<SlackChannel> {
        self.find_active_for_show(show_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Show has no active channel".to_string()))
    }
}

#[async_trait]
impl ChannelStore for ChannelService {
    async fn get(&self, channel_id: &str) -> Result<Option<SlackChannel>> {
        let channel = sqlx::query_as::<_, SlackChannel>(
            r#"
            SELECT id, show_id, briefing_ts, archived
            FROM slack_channels WHERE id = $1
            "#,
        )
        .bind(channel_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(channel)
    }

    async fn find_active_for_show(&self, show_id: Uuid) -> Result<Option<SlackChannel>> {
        let channel = sqlx::query_as::<_, SlackChannel>(
            r#"
            SELECT id, show_id, briefing_ts, archived
            FROM slack_channels WHERE show_id = $1 AND NOT archived
            "#,
        )
        .bind(show_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(channel)
    }

    async fn insert(&self, channel: &SlackChannel) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO slack_channels (id, show_id, briefing_ts, archived)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&channel.id)
        .bind(channel.show_id)
        .bind(&channel.briefing_ts)
        .bind(channel.archived)
        .execute(&self.db)
        .await
        .map_err(AppError::conflict_on_unique("Show already has an active channel"))?;

        Ok(())
    }

    async fn save(&self, channel: &SlackChannel) -> Result<()> {
        let result = sqlx::query(
            "UPDATE slack_channels SET briefing_ts = $2, archived = $3 WHERE id = $1",
        )
        .bind(&channel.id)
        .bind(&channel.briefing_ts)
        .bind(channel.archived)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Channel not found".to_string()));
        }

        Ok(())
    }
}
