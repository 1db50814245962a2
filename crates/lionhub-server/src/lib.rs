//! Lion Hub server library
//!
//! Members, shows and sign-ups, plus the per-show chat channel sync. This
//! module exposes the server components for testing and embedding.

pub mod api;
pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod slack;
pub mod state;
pub mod sync;

use anyhow::Result;
use std::sync::Arc;

/// Create and configure the server application
pub async fn create_app(config: state::Config) -> Result<(axum::Router, sqlx::PgPool)> {
    let db_pool = db::init_pool(&config.database_url).await?;
    db::run_migrations(&db_pool).await?;

    let chat = slack::SlackWebClient::new(
        &config.slack.api_url,
        &config.slack.bot_token,
        config.slack.timeout,
    )?;
    let app_state = state::AppState::new(config, db_pool.clone(), Arc::new(chat));
    let router = api::create_router(app_state);
    Ok((router, db_pool))
}
