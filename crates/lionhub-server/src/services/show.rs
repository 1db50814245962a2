use crate::error::{AppError, Result};
use crate::models::{CreateShow, MemberRef, Role, Show, ShowSnapshot, SlackUser, UpdateShow};
use crate::sync::ShowDirectory;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const SHOW_COLUMNS: &str =
    "id, name, date, time, point_id, lions, address, notes, created_at, updated_at";

/// Member joined with the owning user's name and optional chat identity
const MEMBER_REF_SELECT: &str = r#"
    SELECT m.id AS member_id, u.first_name, u.last_name, s.id AS slack_id
    FROM members m
    INNER JOIN users u ON u.id = m.user_id
    LEFT JOIN slack_users s ON s.member_id = m.id
"#;

#[derive(FromRow)]
struct MemberRefRow {
    member_id: Uuid,
    first_name: String,
    last_name: String,
    slack_id: Option<String>,
}

impl From<MemberRefRow> for MemberRef {
    fn from(row: MemberRefRow) -> Self {
        MemberRef {
            member_id: row.member_id,
            display_name: format!("{} {}", row.first_name, row.last_name)
                .trim()
                .to_string(),
            slack_user: row.slack_id.map(|id| SlackUser {
                id,
                member_id: row.member_id,
            }),
        }
    }
}

#[derive(Clone)]
pub struct ShowService {
    db: PgPool,
    admin_group: String,
}

impl ShowService {
    pub fn new(db: PgPool, admin_group: impl Into<String>) -> Self {
        Self {
            db,
            admin_group: admin_group.into(),
        }
    }

    pub async fn create(&self, input: CreateShow) -> Result<Show> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation("Show name is required".to_string()));
        }

        let show = sqlx::query_as::<_, Show>(&format!(
            r#"
            INSERT INTO shows (id, name, date, time, point_id, lions, address, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            RETURNING {SHOW_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.name.trim())
        .bind(input.date)
        .bind(input.time)
        .bind(input.point_id)
        .bind(input.lions)
        .bind(input.address)
        .bind(input.notes)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Created show {} ({})", show.id, show.name);
        Ok(show)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Show> {
        let show = sqlx::query_as::<_, Show>(&format!(
            "SELECT {SHOW_COLUMNS} FROM shows WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Show not found".to_string()))?;

        Ok(show)
    }

    /// Updates the show and returns it with the labels of the fields that changed.
    pub async fn update(&self, id: Uuid, input: UpdateShow) -> Result<(Show, Vec<&'static str>)> {
        if input.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(AppError::Validation("Show name cannot be blank".to_string()));
        }

        let mut tx = self.db.begin().await?;
        let mut show = sqlx::query_as::<_, Show>(&format!(
            "SELECT {SHOW_COLUMNS} FROM shows WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Show not found".to_string()))?;

        let changed = input.apply(&mut show);
        if changed.is_empty() {
            tx.rollback().await?;
            return Ok((show, changed));
        }

        let show = sqlx::query_as::<_, Show>(&format!(
            r#"
            UPDATE shows
            SET name = $2, date = $3, time = $4, point_id = $5, lions = $6,
                address = $7, notes = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {SHOW_COLUMNS}
            "#
        ))
        .bind(show.id)
        .bind(&show.name)
        .bind(show.date)
        .bind(show.time)
        .bind(show.point_id)
        .bind(show.lions)
        .bind(&show.address)
        .bind(&show.notes)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!("Updated show {}: {}", show.id, changed.join(", "));
        Ok((show, changed))
    }

    /// Signs the member up to perform at the show
    pub async fn create_role(&self, show_id: Uuid, member_id: Uuid) -> Result<Role> {
        self.get_by_id(show_id).await?;

        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (show_id, performer_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (show_id, performer_id) DO NOTHING
            RETURNING show_id, performer_id, created_at
            "#,
        )
        .bind(show_id)
        .bind(member_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Conflict("Already signed up for this show".to_string()))?;

        Ok(role)
    }

    pub async fn delete_role(&self, show_id: Uuid, member_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM roles WHERE show_id = $1 AND performer_id = $2")
            .bind(show_id)
            .bind(member_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Not signed up for this show".to_string()));
        }

        Ok(())
    }

    async fn performers(&self, show_id: Uuid) -> Result<Vec<MemberRef>> {
        let rows = sqlx::query_as::<_, MemberRefRow>(&format!(
            r#"
            {MEMBER_REF_SELECT}
            INNER JOIN roles r ON r.performer_id = m.id
            WHERE r.show_id = $1
            ORDER BY r.created_at
            "#
        ))
        .bind(show_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(MemberRef::from).collect())
    }

    async fn member_ref(&self, member_id: Uuid) -> Result<Option<MemberRef>> {
        let row = sqlx::query_as::<_, MemberRefRow>(&format!(
            "{MEMBER_REF_SELECT} WHERE m.id = $1"
        ))
        .bind(member_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(MemberRef::from))
    }
}

#[async_trait]
impl ShowDirectory for ShowService {
    async fn snapshot(&self, show_id: Uuid) -> Result<ShowSnapshot> {
        let show = self.get_by_id(show_id).await?;
        let point = match show.point_id {
            Some(point_id) => self.member_ref(point_id).await?,
            None => None,
        };
        let performers = self.performers(show_id).await?;

        Ok(ShowSnapshot {
            id: show.id,
            name: show.name,
            date: show.date,
            time: show.time,
            point,
            lions: show.lions,
            address: show.address,
            notes: show.notes,
            performers,
        })
    }

    async fn chat_admins(&self) -> Result<Vec<SlackUser>> {
        let admins = sqlx::query_as::<_, SlackUser>(
            r#"
            SELECT s.id, s.member_id
            FROM slack_users s
            INNER JOIN members m ON m.id = s.member_id
            INNER JOIN user_groups g ON g.user_id = m.user_id
            WHERE g.name = $1
            ORDER BY s.id
            "#,
        )
        .bind(&self.admin_group)
        .fetch_all(&self.db)
        .await?;

        Ok(admins)
    }

    async fn slack_user_for_member(&self, member_id: Uuid) -> Result<Option<SlackUser>> {
        let slack_user = sqlx::query_as::<_, SlackUser>(
            "SELECT id, member_id FROM slack_users WHERE member_id = $1",
        )
        .bind(member_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(slack_user)
    }
}
