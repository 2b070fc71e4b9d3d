//! Route table for the REST server.

use crate::handlers;
use crate::openapi::ApiDoc;
use crate::state::AppState;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

/// Build the application router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/in-patients/ds/:id/edit",
            get(handlers::edit_form).post(handlers::submit_edit_form),
        )
        .route("/in-patients/ds/:id/view", get(handlers::view_discharge_summary))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state)
        .layer(CorsLayer::permissive())
}
