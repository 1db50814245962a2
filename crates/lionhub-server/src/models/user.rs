use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Troupe profile of an active user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub id: Uuid,
    pub user_id: Uuid,
    pub school: Option<String>,
    pub class_year: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user together with their member profile, as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub member: Option<Member>,
    pub slack_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update of a user and their member profile.
///
/// Every editable field is listed here; anything else in the request body is
/// rejected instead of being assigned by name.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUser {
    // users
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    // members
    pub school: Option<String>,
    pub class_year: Option<String>,
}

impl UpdateUser {
    pub fn touches_user(&self) -> bool {
        self.first_name.is_some()
            || self.last_name.is_some()
            || self.email.is_some()
            || self.phone.is_some()
    }

    pub fn touches_member(&self) -> bool {
        self.school.is_some() || self.class_year.is_some()
    }
}

#[derive(Debug, Deserialize)]
pub struct LinkSlackUser {
    pub slack_id: String,
}

/// Loose shape check; deliverability is the mail layer's problem.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("lion@culiondance.org"));
        assert!(!is_valid_email("abc"));
        assert!(!is_valid_email("@culiondance.org"));
        assert!(!is_valid_email("lion@localhost"));
        assert!(!is_valid_email("li on@culiondance.org"));
    }

    #[test]
    fn update_rejects_unlisted_fields() {
        let err = serde_json::from_str::<UpdateUser>(r#"{"is_staff": true}"#);
        assert!(err.is_err());

        let update: UpdateUser = serde_json::from_str(r#"{"school": "SEAS"}"#).unwrap();
        assert!(update.touches_member());
        assert!(!update.touches_user());
    }
}
