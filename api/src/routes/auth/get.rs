use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use db::models::user::Role;
use db::models::{admin, student, teacher, user};
use sea_orm::EntityTrait;
use serde_json::{Value, json};
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use crate::services::degraded;

/// GET /auth/me
///
/// Returns the caller's merged profile: the user record's fields plus the
/// role-specific record (student, teacher or admin).
///
/// ### Responses
///
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": {
///     "id": 1,
///     "email": "user@example.com",
///     "role": "student",
///     "name": "Alice Brown",
///     "profile": { "student_number": "S2026-042", "grade": "10", "section": "A" }
///   },
///   "message": "Profile fetched successfully"
/// }
/// ```
///
/// - `404 Not Found` (role record missing)
pub async fn me(State(state): State<AppState>, AuthUser(claims): AuthUser) -> impl IntoResponse {
    let Some(db) = state.db() else {
        // The only identity that can authenticate in degraded mode is the
        // fixed offline administrator.
        return (
            StatusCode::OK,
            Json(ApiResponse::success(
                degraded::admin_profile(),
                "Profile fetched successfully (degraded mode)",
            )),
        );
    };

    let user = match user::Entity::find_by_id(claims.sub).one(db).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Value>::error("User not found")),
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Profile lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            );
        }
    };

    let profile = match role_profile(db, &user).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Role record not found")),
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Profile lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            );
        }
    };

    let mut merged = json!(user);
    if let Value::Object(map) = &mut merged {
        map.insert("profile".into(), profile);
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(merged, "Profile fetched successfully")),
    )
}

/// Resolves the role-specific record for a user as a JSON value.
async fn role_profile(
    db: &sea_orm::DatabaseConnection,
    user: &user::Model,
) -> Result<Option<Value>, sea_orm::DbErr> {
    let profile = match user.role {
        Role::Student => student::Model::find_by_user_id(db, user.id)
            .await?
            .map(|m| json!(m)),
        Role::Teacher => teacher::Model::find_by_user_id(db, user.id)
            .await?
            .map(|m| json!(m)),
        Role::Admin => admin::Model::find_by_user_id(db, user.id)
            .await?
            .map(|m| json!(m)),
    };
    Ok(profile)
}
