use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::{class, class_schedule};
use sea_orm::EntityTrait;
use serde_json::{Value, json};
use util::state::AppState;

use crate::response::ApiResponse;
use crate::services::degraded;

/// GET /admin/classes
///
/// Lists every class.
pub async fn list_classes(State(state): State<AppState>) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return (
            StatusCode::OK,
            Json(ApiResponse::success(
                degraded::classes(),
                "Classes fetched (degraded mode)",
            )),
        );
    };

    match class::Entity::find().all(db).await {
        Ok(classes) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                json!(classes),
                "Classes fetched successfully",
            )),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Class listing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            )
        }
    }
}

/// GET /admin/classes/{class_id}
///
/// One class with its roster and weekly schedule.
///
/// ### Responses
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": {
///     "id": 3,
///     "name": "Grade 10-A",
///     "roster": [ { "id": 9, "student_number": "S2026-042" } ],
///     "schedule": [ { "day_of_week": 1, "period": 1, "subject": "Mathematics" } ]
///   },
///   "message": "Class fetched successfully"
/// }
/// ```
/// - `404 Not Found`
pub async fn get_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<Value>::error("Service is running in degraded mode")),
        );
    };

    let found = match class::Entity::find_by_id(class_id).one(db).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Class lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            );
        }
    };

    let Some(found) = found else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Class not found")),
        );
    };

    let roster = class::Model::roster(db, class_id).await;
    let schedule = class_schedule::Model::for_class(db, class_id).await;
    let (roster, schedule) = match (roster, schedule) {
        (Ok(r), Ok(s)) => (r, s),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, "Class detail lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            );
        }
    };

    let mut detail = json!(found);
    if let Value::Object(map) = &mut detail {
        map.insert("roster".into(), json!(roster));
        map.insert("schedule".into(), json!(schedule));
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(detail, "Class fetched successfully")),
    )
}
