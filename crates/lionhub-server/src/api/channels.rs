use crate::auth::AuthUser;
use crate::error::Result;
use crate::models::SlackChannel;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

pub async fn list_channels(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(show_id): Path<Uuid>,
) -> Result<Json<Vec<SlackChannel>>> {
    auth.require_staff(&state).await?;
    let channels = state.channel_service.list_by_show(show_id).await?;
    Ok(Json(channels))
}

pub async fn schedule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(show_id): Path<Uuid>,
) -> Result<(StatusCode, Json<SlackChannel>)> {
    auth.require_staff(&state).await?;
    let channel = state.sync.show_scheduled(show_id).await?;
    Ok((StatusCode::CREATED, Json(channel)))
}

pub async fn refresh(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(show_id): Path<Uuid>,
) -> Result<Json<SlackChannel>> {
    auth.require_staff(&state).await?;
    let mut channel = state.channel_service.get_active_for_show(show_id).await?;
    state.sync.force_refresh(&mut channel).await?;
    Ok(Json(channel))
}

pub async fn archive(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(show_id): Path<Uuid>,
) -> Result<StatusCode> {
    auth.require_staff(&state).await?;
    state.sync.show_cancelled(show_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
