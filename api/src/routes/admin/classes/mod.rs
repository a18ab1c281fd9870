//! Class and roster administration under `/admin/classes`.

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use db::models::class::RosterError;
use serde_json::Value;
use util::state::AppState;

use crate::response::ApiResponse;

pub mod delete;
pub mod get;
pub mod post;
pub mod put;

pub fn class_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(post::create_class).get(get::list_classes))
        .route("/reassign", post(post::reassign_classes))
        .route(
            "/{class_id}",
            get(get::get_class)
                .put(put::update_class)
                .delete(delete::delete_class),
        )
        .route("/{class_id}/students", post(post::add_student))
        .route(
            "/{class_id}/students/{student_id}",
            axum::routing::delete(delete::remove_student),
        )
        .route("/{class_id}/schedule", post(post::add_schedule_slot))
        .route(
            "/{class_id}/schedule/{slot_id}",
            axum::routing::delete(delete::remove_schedule_slot),
        )
}

/// Maps roster failures onto HTTP statuses: missing entities are 404,
/// state conflicts are 409, database failures are logged 500s.
pub(crate) fn roster_error(e: RosterError) -> (StatusCode, Json<ApiResponse<Value>>) {
    let status = match &e {
        RosterError::ClassNotFound | RosterError::StudentNotFound => StatusCode::NOT_FOUND,
        RosterError::DuplicateName
        | RosterError::AlreadyAssigned
        | RosterError::CapacityReached
        | RosterError::NotAMember
        | RosterError::SlotTaken => StatusCode::CONFLICT,
        RosterError::Db(err) => {
            tracing::error!(error = %err, "Roster operation failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            );
        }
    };
    (status, Json(ApiResponse::error(e.to_string())))
}

pub(crate) fn degraded_write() -> (StatusCode, Json<ApiResponse<Value>>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse::error("Service is running in degraded mode")),
    )
}
