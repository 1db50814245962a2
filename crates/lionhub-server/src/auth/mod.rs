//! Bearer token verification.
//!
//! Tokens are minted by the login flow, which lives outside this service; the
//! hub only checks the signature and expiry and reads the user id.

use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // User ID
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, expires_in_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            exp: (now + Duration::hours(expires_in_hours)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

pub fn create_token(user_id: Uuid, secret: &str) -> Result<String> {
    let claims = Claims::new(user_id, 24 * 7);

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Extractor for authenticated requests
pub struct AuthUser {
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized)?;

        let claims = verify_token(bearer.token(), &state.config.jwt_secret)?;

        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}

impl AuthUser {
    /// Fails with `Forbidden` unless the user is active staff
    pub async fn require_staff(&self, state: &AppState) -> Result<()> {
        let user = state.user_service.get_by_id(self.user_id).await?;
        if !(user.is_active && user.is_staff) {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_user_id() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, "secret").unwrap();
        assert_eq!(verify_token(&token, "secret").unwrap().sub, user_id);
    }

    #[test]
    fn token_with_other_secret_is_rejected() {
        let token = create_token(Uuid::new_v4(), "secret").unwrap();
        assert!(matches!(
            verify_token(&token, "other"),
            Err(AppError::Jwt(_))
        ));
    }
}
