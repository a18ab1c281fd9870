use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::{class, class_schedule};
use serde_json::{Value, json};
use util::state::AppState;

use super::{degraded_write, roster_error};
use crate::response::ApiResponse;

/// DELETE /admin/classes/{class_id}
///
/// Deletes a class. Members are detached first (class, grade and section
/// cleared); schedule slots cascade.
///
/// ### Responses
/// - `200 OK`
/// - `404 Not Found`
pub async fn delete_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return degraded_write();
    };

    match class::Model::delete(db, class_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success(json!({}), "Class deleted successfully")),
        ),
        Err(e) => roster_error(e),
    }
}

/// DELETE /admin/classes/{class_id}/schedule/{slot_id}
///
/// Removes one timetable slot.
///
/// ### Responses
/// - `200 OK`
/// - `404 Not Found` (no such slot)
pub async fn remove_schedule_slot(
    State(state): State<AppState>,
    Path((_class_id, slot_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return degraded_write();
    };

    match class_schedule::Model::delete(db, slot_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                json!({}),
                "Schedule slot removed successfully",
            )),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Value>::error("Schedule slot not found")),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Schedule slot removal failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            )
        }
    }
}

/// DELETE /admin/classes/{class_id}/students/{student_id}
///
/// Removes a student from the roster, clearing their class membership and
/// denormalized grade/section.
///
/// ### Responses
/// - `200 OK` with the updated student
/// - `404 Not Found` (student missing)
/// - `409 Conflict` (student not in this class)
pub async fn remove_student(
    State(state): State<AppState>,
    Path((class_id, student_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return degraded_write();
    };

    match class::Model::remove_student(db, class_id, student_id).await {
        Ok(s) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                json!(s),
                "Student removed from class successfully",
            )),
        ),
        Err(e) => roster_error(e),
    }
}
