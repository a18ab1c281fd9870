use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::assignment::{self, AssignmentError};
use db::models::user::Role;
use sea_orm::EntityTrait;
use serde_json::json;
use util::state::AppState;

use super::{degraded_write, internal, require_teacher_record};
use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;

/// DELETE /assignments/{assignment_id}
///
/// Removes an assignment and, via cascade, its submissions. Allowed for
/// the authoring teacher and for admins.
///
/// ### Responses
/// - `200 OK`
/// - `403 Forbidden` (not the author)
/// - `404 Not Found`
pub async fn delete_assignment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(assignment_id): Path<i64>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return degraded_write();
    };

    match claims.role {
        Role::Student => (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Teacher access required")),
        ),
        Role::Teacher => {
            let teacher = match require_teacher_record(db, &claims).await {
                Ok(t) => t,
                Err(resp) => return resp,
            };
            match assignment::Model::delete(db, assignment_id, teacher.id).await {
                Ok(()) => (
                    StatusCode::OK,
                    Json(ApiResponse::success(
                        json!({}),
                        "Assignment deleted successfully",
                    )),
                ),
                Err(AssignmentError::NotFound) => (
                    StatusCode::NOT_FOUND,
                    Json(ApiResponse::error("Assignment not found")),
                ),
                Err(AssignmentError::NotOwner) => (
                    StatusCode::FORBIDDEN,
                    Json(ApiResponse::error(
                        "Only the authoring teacher may modify this assignment",
                    )),
                ),
                Err(e) => internal(e),
            }
        }
        Role::Admin => {
            match assignment::Entity::find_by_id(assignment_id).one(db).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    return (
                        StatusCode::NOT_FOUND,
                        Json(ApiResponse::error("Assignment not found")),
                    );
                }
                Err(e) => return internal(e),
            }
            match assignment::Entity::delete_by_id(assignment_id).exec(db).await {
                Ok(_) => (
                    StatusCode::OK,
                    Json(ApiResponse::success(
                        json!({}),
                        "Assignment deleted successfully",
                    )),
                ),
                Err(e) => internal(e),
            }
        }
    }
}
