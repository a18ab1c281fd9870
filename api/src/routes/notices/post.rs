use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use db::models::notice::{self, Audience, NewNotice, NoticeError, NoticeStatus};
use db::models::{admin, user::Role};
use serde::Deserialize;
use serde_json::{Value, json};
use util::state::AppState;
use util::validation::format_validation_errors;
use validator::Validate;

use super::{degraded_write, internal};
use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNoticeRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    pub audience: Audience,
    #[serde(default)]
    pub target_grades: Vec<String>,
    pub status: Option<NoticeStatus>,
    pub publish_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// POST /notices
///
/// Admin-only. Computes the notice's total reach from the audience rule at
/// creation time.
///
/// ### Request Body
/// ```json
/// {
///   "title": "Sports day",
///   "content": "The annual sports day is on Friday.",
///   "audience": "specific_grade",
///   "target_grades": ["10"]
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with the new notice
/// - `403 Forbidden` (caller has no admin record)
pub async fn create_notice(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<CreateNoticeRequest>,
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

    if claims.role != Role::Admin {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Admin access required")),
        );
    }
    let admin = match admin::Model::find_by_user_id(db, claims.sub).await {
        Ok(Some(a)) => a,
        Ok(None) => {
            return (
                StatusCode::FORBIDDEN,
                Json(ApiResponse::error("Admin access required")),
            );
        }
        Err(e) => return internal(e),
    };

    if matches!(req.audience, Audience::SpecificGrade | Audience::SpecificClass)
        && req.target_grades.is_empty()
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                "Target grades are required for this audience",
            )),
        );
    }

    let new = NewNotice {
        title: req.title,
        content: req.content,
        audience: req.audience,
        target_grades: req.target_grades,
        status: req.status.unwrap_or(NoticeStatus::Published),
        publish_at: req.publish_at,
        expires_at: req.expires_at,
    };

    match notice::Model::create(db, admin.id, new).await {
        Ok(n) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(json!(n), "Notice created successfully")),
        ),
        Err(e) => internal(e),
    }
}

/// POST /notices/{notice_id}/read
///
/// Records a read receipt for the caller. Idempotent: marking the same
/// notice twice leaves the read count unchanged.
///
/// ### Responses
/// - `200 OK` with `{ "read_count": n, "read_percentage": p }`
/// - `404 Not Found`
pub async fn mark_notice_read(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(notice_id): Path<i64>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return degraded_write();
    };

    match notice::Model::mark_read(db, notice_id, claims.sub).await {
        Ok(n) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                json!({
                    "read_count": n.read_count,
                    "read_percentage": n.read_percentage(),
                }),
                "Notice marked as read",
            )),
        ),
        Err(NoticeError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Notice not found")),
        ),
        Err(e) => internal(e),
    }
}
