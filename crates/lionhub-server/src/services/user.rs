use crate::error::{AppError, Result};
use crate::models::{CreateUser, Member, SlackUser, UpdateUser, User, UserProfile, is_valid_email};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const EMAIL_TAKEN: &str = "Email already registered";

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, phone, is_active, is_staff, created_at, updated_at";

#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: CreateUser) -> Result<User> {
        let email = normalize_email(&input.email)?;
        if input.first_name.trim().is_empty() || input.last_name.trim().is_empty() {
            return Err(AppError::Validation(
                "First and last name are required".to_string(),
            ));
        }
        if !self.email_is_free(&email).await? {
            return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let mut tx = self.db.begin().await?;
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, first_name, last_name, phone, is_active, is_staff, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, false, NOW(), NOW())
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.phone.as_deref())
        .bind(input.is_active)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::conflict_on_unique(EMAIL_TAKEN))?;

        if user.is_active {
            create_member(&mut tx, user.id).await?;
        }
        tx.commit().await?;

        tracing::info!("Created user {} ({})", user.id, user.email);
        Ok(user)
    }

    pub async fn email_is_free(&self, email: &str) -> Result<bool> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = lower($1))")
                .bind(email)
                .fetch_one(&self.db)
                .await?;

        Ok(!taken)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user)
    }

    pub async fn get_member(&self, user_id: Uuid) -> Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            "SELECT id, user_id, school, class_year, created_at FROM members WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(member)
    }

    /// Member profile of an active user, required for sign-ups
    pub async fn require_member(&self, user_id: Uuid) -> Result<Member> {
        self.get_member(user_id)
            .await?
            .ok_or(AppError::Forbidden)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserProfile> {
        let user = self.get_by_id(user_id).await?;
        let member = self.get_member(user_id).await?;
        let slack_id = match &member {
            Some(member) => {
                sqlx::query_scalar::<_, String>("SELECT id FROM slack_users WHERE member_id = $1")
                    .bind(member.id)
                    .fetch_optional(&self.db)
                    .await?
            }
            None => None,
        };

        Ok(UserProfile {
            user,
            member,
            slack_id,
        })
    }

    /// Activates the user and gives them a member profile. Returns whether the
    /// user was inactive before.
    pub async fn activate(&self, id: Uuid) -> Result<bool> {
        self.get_by_id(id).await?;

        let mut tx = self.db.begin().await?;
        let activated = sqlx::query(
            "UPDATE users SET is_active = true, updated_at = NOW() WHERE id = $1 AND NOT is_active",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if activated {
            create_member(&mut tx, id).await?;
            tracing::info!("Activated user {}", id);
        }
        tx.commit().await?;

        Ok(activated)
    }

    /// Applies an allow-listed partial update to the user and their member profile.
    pub async fn update(&self, id: Uuid, input: UpdateUser) -> Result<UserProfile> {
        let email = match input.email.as_deref() {
            Some(email) => {
                let email = normalize_email(email)?;
                let current = self.get_by_id(id).await?;
                if !current.email.eq_ignore_ascii_case(&email) && !self.email_is_free(&email).await? {
                    return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
                }
                Some(email)
            }
            None => None,
        };

        let mut tx = self.db.begin().await?;
        if input.touches_user() {
            let result = sqlx::query(
                r#"
                UPDATE users
                SET first_name = COALESCE($2, first_name),
                    last_name = COALESCE($3, last_name),
                    email = COALESCE($4, email),
                    phone = COALESCE($5, phone),
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(input.first_name.as_deref())
            .bind(input.last_name.as_deref())
            .bind(email.as_deref())
            .bind(input.phone.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(AppError::conflict_on_unique(EMAIL_TAKEN))?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound("User not found".to_string()));
            }
        }

        if input.touches_member() {
            let result = sqlx::query(
                r#"
                UPDATE members
                SET school = COALESCE($2, school),
                    class_year = COALESCE($3, class_year)
                WHERE user_id = $1
                "#,
            )
            .bind(id)
            .bind(input.school.as_deref())
            .bind(input.class_year.as_deref())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound("Member profile not found".to_string()));
            }
        }
        tx.commit().await?;

        self.get_profile(id).await
    }

    /// Links the user's member profile to a workspace identity, replacing any
    /// previous link of that member.
    pub async fn link_slack_user(&self, user_id: Uuid, slack_id: &str) -> Result<SlackUser> {
        let slack_id = slack_id.trim();
        if slack_id.is_empty() {
            return Err(AppError::Validation("Slack id is required".to_string()));
        }
        let member = self.require_member(user_id).await?;

        let owner: Option<Uuid> =
            sqlx::query_scalar("SELECT member_id FROM slack_users WHERE id = $1")
                .bind(slack_id)
                .fetch_optional(&self.db)
                .await?;
        if owner.is_some_and(|owner| owner != member.id) {
            return Err(AppError::Conflict(
                "Slack user is linked to another member".to_string(),
            ));
        }

        let slack_user = sqlx::query_as::<_, SlackUser>(
            r#"
            INSERT INTO slack_users (id, member_id)
            VALUES ($1, $2)
            ON CONFLICT (member_id) DO UPDATE SET id = EXCLUDED.id
            RETURNING id, member_id
            "#,
        )
        .bind(slack_id)
        .bind(member.id)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Linked member {} to Slack user {}", member.id, slack_user.id);
        Ok(slack_user)
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }
    if !is_valid_email(email) {
        return Err(AppError::Validation(format!("{} is not a valid email", email)));
    }
    Ok(email.to_string())
}

async fn create_member(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO members (id, user_id, created_at)
        VALUES ($1, $2, NOW())
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
