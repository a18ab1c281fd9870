use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::assignment::{self, AssignmentStatus};
use db::models::submission;
use db::models::user::Role;
use sea_orm::EntityTrait;
use serde::Deserialize;
use serde_json::{Value, json};
use util::state::AppState;

use super::{internal, require_student_record, require_teacher_record};
use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use crate::services::degraded;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<AssignmentStatus>,
}

/// GET /assignments
///
/// Role-scoped listing:
/// - students see published assignments addressed to their grade/section;
/// - teachers see the assignments they authored, with submission counts;
/// - admins see everything, optionally narrowed by `?status=`.
pub async fn list_assignments(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return (
            StatusCode::OK,
            Json(ApiResponse::success(
                degraded::assignments(),
                "Assignments fetched (degraded mode)",
            )),
        );
    };

    match claims.role {
        Role::Student => {
            let student = match require_student_record(db, &claims).await {
                Ok(s) => s,
                Err(resp) => return resp,
            };
            let (Some(grade), Some(section)) = (&student.grade, &student.section) else {
                // Unassigned students have no audience yet.
                return (
                    StatusCode::OK,
                    Json(ApiResponse::success(
                        json!([]),
                        "Assignments fetched successfully",
                    )),
                );
            };
            match assignment::Model::for_student(db, grade, section).await {
                Ok(list) => (
                    StatusCode::OK,
                    Json(ApiResponse::success(
                        json!(list),
                        "Assignments fetched successfully",
                    )),
                ),
                Err(e) => internal(e),
            }
        }
        Role::Teacher => {
            let teacher = match require_teacher_record(db, &claims).await {
                Ok(t) => t,
                Err(resp) => return resp,
            };
            let list = match assignment::Model::for_teacher(db, teacher.id).await {
                Ok(l) => l,
                Err(e) => return internal(e),
            };
            match with_submission_counts(db, list).await {
                Ok(list) => (
                    StatusCode::OK,
                    Json(ApiResponse::success(
                        json!(list),
                        "Assignments fetched successfully",
                    )),
                ),
                Err(e) => internal(e),
            }
        }
        Role::Admin => {
            let list = match assignment::Model::all(db, query.status).await {
                Ok(l) => l,
                Err(e) => return internal(e),
            };
            match with_submission_counts(db, list).await {
                Ok(list) => (
                    StatusCode::OK,
                    Json(ApiResponse::success(
                        json!(list),
                        "Assignments fetched successfully",
                    )),
                ),
                Err(e) => internal(e),
            }
        }
    }
}

/// Attaches the derived submission count to each assignment for staff views.
async fn with_submission_counts(
    db: &sea_orm::DatabaseConnection,
    list: Vec<assignment::Model>,
) -> Result<Vec<Value>, sea_orm::DbErr> {
    let mut out = Vec::with_capacity(list.len());
    for a in list {
        let count = submission::Model::count_for_assignment(db, a.id).await?;
        let mut v = json!(a);
        if let Value::Object(map) = &mut v {
            map.insert("submission_count".into(), json!(count));
        }
        out.push(v);
    }
    Ok(out)
}

/// GET /assignments/{assignment_id}/submissions
///
/// The authoring teacher or an admin sees every submission; a student sees
/// only their own (an empty list before they submit).
///
/// ### Responses
/// - `200 OK` with the submissions in arrival order
/// - `403 Forbidden` (a teacher who is not the author)
/// - `404 Not Found`
pub async fn list_submissions(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(assignment_id): Path<i64>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::error("Service is running in degraded mode")),
        );
    };

    let assignment = match assignment::Entity::find_by_id(assignment_id).one(db).await {
        Ok(a) => a,
        Err(e) => return internal(e),
    };
    let Some(assignment) = assignment else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Assignment not found")),
        );
    };

    match claims.role {
        Role::Admin => {}
        Role::Teacher => {
            let teacher = match require_teacher_record(db, &claims).await {
                Ok(t) => t,
                Err(resp) => return resp,
            };
            if assignment.teacher_id != teacher.id {
                return (
                    StatusCode::FORBIDDEN,
                    Json(ApiResponse::error(
                        "Only the authoring teacher may view submissions",
                    )),
                );
            }
        }
        Role::Student => {
            let student = match require_student_record(db, &claims).await {
                Ok(s) => s,
                Err(resp) => return resp,
            };
            let own = match submission::Model::find_for_student(db, assignment_id, student.id).await
            {
                Ok(s) => s,
                Err(e) => return internal(e),
            };
            let list: Vec<submission::Model> = own.into_iter().collect();
            return (
                StatusCode::OK,
                Json(ApiResponse::success(
                    json!(list),
                    "Submissions fetched successfully",
                )),
            );
        }
    }

    match submission::Model::for_assignment(db, assignment_id).await {
        Ok(list) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                json!(list),
                "Submissions fetched successfully",
            )),
        ),
        Err(e) => internal(e),
    }
}
