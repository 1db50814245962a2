use crate::auth::AuthUser;
use crate::error::Result;
use crate::models::{CreateUser, LinkSlackUser, SlackUser, UpdateUser, User, UserProfile};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct Activation {
    /// `false` when the user was already active
    pub activated: bool,
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>)> {
    let user = state.user_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<UserProfile>> {
    let profile = state.user_service.get_profile(auth.user_id).await?;
    Ok(Json(profile))
}

pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<UpdateUser>,
) -> Result<Json<UserProfile>> {
    let profile = state.user_service.update(auth.user_id, input).await?;
    Ok(Json(profile))
}

pub async fn link_slack(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<LinkSlackUser>,
) -> Result<Json<SlackUser>> {
    let slack_user = state
        .user_service
        .link_slack_user(auth.user_id, &input.slack_id)
        .await?;
    Ok(Json(slack_user))
}

/// Staff activation of a pending user, which also creates their member profile
pub async fn activate_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Activation>> {
    auth.require_staff(&state).await?;
    let activated = state.user_service.activate(id).await?;
    Ok(Json(Activation { activated }))
}
