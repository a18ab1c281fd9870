use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::notice::{self, NoticeStatus};
use db::models::student;
use db::models::user::Role;
use sea_orm::EntityTrait;
use serde::Deserialize;
use serde_json::{Value, json};
use util::state::AppState;

use super::internal;
use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use crate::services::degraded;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<NoticeStatus>,
}

/// GET /notices
///
/// Role-scoped listing:
/// - students see published notices for everyone, for students, or for
///   their grade;
/// - teachers see published notices for everyone or for teachers;
/// - admins see every notice and may filter by `?status=`.
pub async fn list_notices(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return (
            StatusCode::OK,
            Json(ApiResponse::success(
                degraded::notices(),
                "Notices fetched (degraded mode)",
            )),
        );
    };

    let list = match claims.role {
        Role::Student => {
            let grade = match student::Model::find_by_user_id(db, claims.sub).await {
                Ok(Some(s)) => s.grade,
                Ok(None) => None,
                Err(e) => return internal(e),
            };
            // Students without a grade still receive all/students notices.
            notice::Model::for_student_grade(db, grade.as_deref().unwrap_or("")).await
        }
        Role::Teacher => notice::Model::for_teachers(db).await,
        Role::Admin => notice::Model::for_admin(db, query.status).await,
    };

    match list {
        Ok(notices) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                json!(notices),
                "Notices fetched successfully",
            )),
        ),
        Err(e) => internal(e),
    }
}

/// GET /notices/{notice_id}/analytics
///
/// Admin-only read tracking: reach, read count, derived read percentage,
/// and the full receipt list.
///
/// ### Responses
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": {
///     "total_reach": 120,
///     "read_count": 40,
///     "read_percentage": 33,
///     "receipts": [ { "user_id": 9, "read_at": "2026-03-02T08:00:00Z" } ]
///   },
///   "message": "Notice analytics fetched successfully"
/// }
/// ```
/// - `403 Forbidden` / `404 Not Found`
pub async fn notice_analytics(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(notice_id): Path<i64>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<Value>::error("Service is running in degraded mode")),
        );
    };

    if claims.role != Role::Admin {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Admin access required")),
        );
    }

    let found = match notice::Entity::find_by_id(notice_id).one(db).await {
        Ok(Some(n)) => n,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Notice not found")),
            );
        }
        Err(e) => return internal(e),
    };

    let receipts = match notice::Model::receipts(db, notice_id).await {
        Ok(r) => r,
        Err(e) => return internal(e),
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            json!({
                "total_reach": found.total_reach,
                "read_count": found.read_count,
                "read_percentage": found.read_percentage(),
                "receipts": receipts,
            }),
            "Notice analytics fetched successfully",
        )),
    )
}
