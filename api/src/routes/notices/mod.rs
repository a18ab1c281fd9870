//! Notice broadcast endpoints under `/notices`.

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde_json::Value;
use util::state::AppState;

use crate::response::ApiResponse;

pub mod delete;
pub mod get;
pub mod post;

pub fn notice_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(post::create_notice).get(get::list_notices))
        .route(
            "/{notice_id}",
            axum::routing::delete(delete::delete_notice),
        )
        .route("/{notice_id}/read", post(post::mark_notice_read))
        .route("/{notice_id}/analytics", get(get::notice_analytics))
}

type HandlerError = (StatusCode, Json<ApiResponse<Value>>);

pub(crate) fn degraded_write() -> HandlerError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse::error("Service is running in degraded mode")),
    )
}

pub(crate) fn internal(e: impl std::fmt::Display) -> HandlerError {
    tracing::error!(error = %e, "Notice operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error("An internal error occurred")),
    )
}
