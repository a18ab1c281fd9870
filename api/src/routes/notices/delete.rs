use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::notice::{self, NoticeError};
use db::models::user::Role;
use serde_json::{Value, json};
use util::state::AppState;

use super::{degraded_write, internal};
use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;

/// DELETE /notices/{notice_id}
///
/// Admin-only. Read receipts are removed with the notice via FK cascade.
///
/// ### Responses
/// - `200 OK`
/// - `403 Forbidden` (non-admin caller)
/// - `404 Not Found`
pub async fn delete_notice(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(notice_id): Path<i64>,
) -> impl IntoResponse {
    if claims.role != Role::Admin {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::<Value>::error("Admin access required")),
        );
    }

    let Some(db) = state.db() else {
        return degraded_write();
    };

    match notice::Model::delete(db, notice_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success(json!({}), "Notice deleted successfully")),
        ),
        Err(NoticeError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Notice not found")),
        ),
        Err(e) => internal(e),
    }
}
