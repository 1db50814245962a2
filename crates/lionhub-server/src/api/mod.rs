mod channels;
mod shows;
mod users;

use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // User routes
        .route("/api/users", post(users::create_user))
        .route("/api/users/me", get(users::get_me).patch(users::update_me))
        .route("/api/users/me/slack", put(users::link_slack))
        .route("/api/users/{id}/activate", post(users::activate_user))
        // Show routes
        .route("/api/shows", post(shows::create_show))
        .route("/api/shows/{id}", get(shows::get_show).patch(shows::update_show))
        .route(
            "/api/shows/{id}/roles",
            post(shows::sign_up).delete(shows::withdraw),
        )
        // Show channel routes
        .route(
            "/api/shows/{id}/channel",
            get(channels::list_channels).post(channels::schedule),
        )
        .route("/api/shows/{id}/channel/refresh", post(channels::refresh))
        .route("/api/shows/{id}/channel/archive", post(channels::archive))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
