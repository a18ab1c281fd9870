use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use db::models::assignment::{self, AssignmentError, AssignmentStatus};
use db::models::submission;
use db::models::user::Role;
use sea_orm::EntityTrait;
use serde::Deserialize;
use serde_json::{Value, json};
use util::state::AppState;
use validator::Validate;

use super::{degraded_write, internal, require_teacher_record, submission_error};
use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use util::validation::format_validation_errors;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AssignmentStatus,
}

/// PUT /assignments/{assignment_id}/status
///
/// Applies a lifecycle transition (draft → published → completed |
/// archived). Allowed for the authoring teacher and for admins.
///
/// ### Responses
/// - `200 OK` with the updated assignment
/// - `403 Forbidden` (not the author)
/// - `404 Not Found`
/// - `409 Conflict` (invalid transition)
pub async fn update_status(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(assignment_id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return degraded_write();
    };

    if claims.role == Role::Student {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Teacher access required")),
        );
    }

    if claims.role == Role::Teacher {
        let teacher = match require_teacher_record(db, &claims).await {
            Ok(t) => t,
            Err(resp) => return resp,
        };
        match assignment::Entity::find_by_id(assignment_id).one(db).await {
            Ok(Some(a)) if a.teacher_id != teacher.id => {
                return (
                    StatusCode::FORBIDDEN,
                    Json(ApiResponse::error(
                        "Only the authoring teacher may modify this assignment",
                    )),
                );
            }
            Ok(_) => {}
            Err(e) => return internal(e),
        }
    }

    match assignment::Model::set_status(db, assignment_id, req.status).await {
        Ok(a) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                json!(a),
                "Assignment status updated successfully",
            )),
        ),
        Err(AssignmentError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Assignment not found")),
        ),
        Err(AssignmentError::InvalidTransition) => (
            StatusCode::CONFLICT,
            Json(ApiResponse::error("Invalid status transition")),
        ),
        Err(e) => internal(e),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct GradeRequest {
    #[validate(range(min = 0, max = 100, message = "Marks must be between 0 and 100"))]
    pub marks: i32,
    pub feedback: Option<String>,
}

/// PUT /assignments/{assignment_id}/submissions/{submission_id}/grade
///
/// Teacher-only. Sets marks, feedback, the grading teacher and timestamp,
/// and moves the submission to `graded`.
///
/// ### Request Body
/// ```json
/// { "marks": 85, "feedback": "Well argued" }
/// ```
///
/// ### Responses
/// - `200 OK` with the graded submission
/// - `404 Not Found` ("Submission not found")
pub async fn grade_submission(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path((assignment_id, submission_id)): Path<(i64, i64)>,
    Json(req): Json<GradeRequest>,
) -> impl IntoResponse {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Value>::error(format_validation_errors(
                &validation_errors,
            ))),
        );
    }

    let Some(db) = state.db() else {
        return degraded_write();
    };

    let teacher = match require_teacher_record(db, &claims).await {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    // The submission must belong to the assignment in the path.
    match submission::Entity::find_by_id(submission_id).one(db).await {
        Ok(Some(s)) if s.assignment_id == assignment_id => {}
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Submission not found")),
            );
        }
        Err(e) => return internal(e),
    }

    match submission::Model::grade(db, submission_id, req.marks, req.feedback, teacher.id, Utc::now())
        .await
    {
        Ok(s) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                json!(s),
                "Submission graded successfully",
            )),
        ),
        Err(e) => submission_error(e),
    }
}
