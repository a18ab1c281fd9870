use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::{teacher, user};
use sea_orm::EntityTrait;
use serde_json::{Value, json};
use util::state::AppState;

use crate::response::ApiResponse;
use crate::services::degraded;

fn merged(record: &teacher::Model, account: Option<&user::Model>) -> Value {
    let mut v = json!(record);
    if let (Value::Object(map), Some(u)) = (&mut v, account) {
        map.insert("name".into(), json!(u.name));
        map.insert("email".into(), json!(u.email));
        map.insert("active".into(), json!(u.active));
    }
    v
}

/// GET /teachers
///
/// Lists every teacher together with name/email from the linked account.
pub async fn list_teachers(State(state): State<AppState>) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return (
            StatusCode::OK,
            Json(ApiResponse::success(
                degraded::teachers(),
                "Teachers fetched (degraded mode)",
            )),
        );
    };

    match teacher::Entity::find()
        .find_also_related(user::Entity)
        .all(db)
        .await
    {
        Ok(rows) => {
            let list: Vec<Value> = rows.iter().map(|(t, u)| merged(t, u.as_ref())).collect();
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    json!(list),
                    "Teachers fetched successfully",
                )),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Teacher listing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            )
        }
    }
}

/// GET /teachers/{teacher_id}
///
/// ### Responses
/// - `200 OK` with the merged teacher record
/// - `404 Not Found`
pub async fn get_teacher(
    State(state): State<AppState>,
    Path(teacher_id): Path<i64>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<Value>::error("Service is running in degraded mode")),
        );
    };

    match teacher::Entity::find_by_id(teacher_id)
        .find_also_related(user::Entity)
        .one(db)
        .await
    {
        Ok(Some((t, u))) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                merged(&t, u.as_ref()),
                "Teacher fetched successfully",
            )),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Teacher not found")),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Teacher lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            )
        }
    }
}
