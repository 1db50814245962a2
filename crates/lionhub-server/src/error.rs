use crate::slack::ChatError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Operation invoked in a state that makes it meaningless
    #[error("Wrong usage: {0}")]
    Usage(String),

    /// Malformed caller input, rejected before any chat call is made
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Chat platform error: {0}")]
    Chat(#[from] ChatError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Maps a unique-constraint violation to [`AppError::Conflict`], anything
    /// else to [`AppError::Database`]. For writes racing a check-then-insert.
    pub fn conflict_on_unique(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
        move |e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(message.to_string())
            }
            e => e.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) | AppError::Usage(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Chat(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::Usage(msg)
            | AppError::Validation(msg) => msg.clone(),
            AppError::Chat(e) => {
                tracing::warn!("Chat platform error: {}", e);
                self.to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Jwt(_) => "Invalid token".to_string(),
            AppError::Unauthorized | AppError::Forbidden => self.to_string(),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_and_validation_map_to_client_errors() {
        assert_eq!(
            AppError::Usage("no briefing".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Validation("no fields".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn non_unique_database_errors_stay_internal() {
        let err = AppError::conflict_on_unique("Email already registered")(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn chat_failures_are_bad_gateway() {
        let err: AppError = ChatError::RateLimited { retry_after: 30 }.into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
