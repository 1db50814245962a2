use crate::auth::AuthUser;
use crate::error::Result;
use crate::models::{CreateShow, Role, Show, ShowSnapshot, UpdateShow};
use crate::state::AppState;
use crate::sync::ShowDirectory;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ShowUpdated {
    pub show: Show,
    pub updated_fields: Vec<&'static str>,
}

pub async fn create_show(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateShow>,
) -> Result<(StatusCode, Json<Show>)> {
    auth.require_staff(&state).await?;
    let show = state.show_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(show)))
}

pub async fn get_show(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ShowSnapshot>> {
    let show = state.show_service.snapshot(id).await?;
    Ok(Json(show))
}

pub async fn update_show(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateShow>,
) -> Result<Json<ShowUpdated>> {
    auth.require_staff(&state).await?;
    let (show, updated_fields) = state.show_service.update(id, input).await?;

    // Channel sync runs after the change is stored
    if !updated_fields.is_empty() {
        state.sync.show_updated(id, &updated_fields).await?;
    }

    Ok(Json(ShowUpdated {
        show,
        updated_fields,
    }))
}

pub async fn sign_up(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Role>)> {
    let member = state.user_service.require_member(auth.user_id).await?;
    let role = state.show_service.create_role(id, member.id).await?;
    state.sync.performer_added(id, member.id).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn withdraw(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let member = state.user_service.require_member(auth.user_id).await?;
    state.show_service.delete_role(id, member.id).await?;
    state.sync.performer_removed(id, member.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
