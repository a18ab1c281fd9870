//! Assignment workflow endpoints under `/assignments`.
//!
//! The route group is mounted behind `allow_authenticated`; the finer
//! role scoping (teacher-only creation, student-only submission, role-scoped
//! listing) lives in the handlers because several roles share each path.

use axum::{Json, Router, http::StatusCode, routing::put};
use db::models::submission::SubmissionError;
use db::models::{student, teacher};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use util::state::AppState;

use crate::auth::claims::Claims;
use crate::response::ApiResponse;

pub mod delete;
pub mod get;
pub mod post;
pub mod put;

pub fn assignment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            axum::routing::post(post::create_assignment).get(get::list_assignments),
        )
        .route(
            "/{assignment_id}",
            axum::routing::delete(delete::delete_assignment),
        )
        .route("/{assignment_id}/status", put(put::update_status))
        .route(
            "/{assignment_id}/submissions",
            axum::routing::post(post::submit_assignment).get(get::list_submissions),
        )
        .route(
            "/{assignment_id}/submissions/{submission_id}/grade",
            put(put::grade_submission),
        )
}

type HandlerError = (StatusCode, Json<ApiResponse<Value>>);

pub(crate) fn degraded_write() -> HandlerError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse::error("Service is running in degraded mode")),
    )
}

pub(crate) fn internal(e: impl std::fmt::Display) -> HandlerError {
    tracing::error!(error = %e, "Assignment operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error("An internal error occurred")),
    )
}

/// Resolves the caller's teacher record; 403 when the caller has none.
pub(crate) async fn require_teacher_record(
    db: &DatabaseConnection,
    claims: &Claims,
) -> Result<teacher::Model, HandlerError> {
    match teacher::Model::find_by_user_id(db, claims.sub).await {
        Ok(Some(t)) => Ok(t),
        Ok(None) => Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Teacher access required")),
        )),
        Err(e) => Err(internal(e)),
    }
}

/// Resolves the caller's student record; 403 when the caller has none.
pub(crate) async fn require_student_record(
    db: &DatabaseConnection,
    claims: &Claims,
) -> Result<student::Model, HandlerError> {
    match student::Model::find_by_user_id(db, claims.sub).await {
        Ok(Some(s)) => Ok(s),
        Ok(None) => Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Student access required")),
        )),
        Err(e) => Err(internal(e)),
    }
}

/// Maps submission failures onto HTTP statuses.
pub(crate) fn submission_error(e: SubmissionError) -> HandlerError {
    let status = match &e {
        SubmissionError::AssignmentNotFound | SubmissionError::NotFound => StatusCode::NOT_FOUND,
        SubmissionError::NotOpen => StatusCode::FORBIDDEN,
        SubmissionError::DeadlinePassed | SubmissionError::AlreadySubmitted => StatusCode::CONFLICT,
        SubmissionError::Db(err) => {
            return internal(err);
        }
    };
    (status, Json(ApiResponse::error(e.to_string())))
}
