use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::class;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait};
use serde::Deserialize;
use serde_json::{Value, json};
use util::state::AppState;
use util::validation::format_validation_errors;
use validator::Validate;

use super::degraded_write;
use crate::response::ApiResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClassRequest {
    #[validate(range(min = 1, max = 200, message = "Capacity must be between 1 and 200"))]
    pub capacity: Option<i32>,
    pub academic_year: Option<String>,
    pub teacher_id: Option<i64>,
}

/// PUT /admin/classes/{class_id}
///
/// Update class fields. Grade and section are immutable because the
/// canonical name is derived from them; a different grade/section is a
/// different class.
///
/// ### Responses
/// - `200 OK` with the updated class
/// - `404 Not Found`
pub async fn update_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Json(req): Json<UpdateClassRequest>,
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

    let existing = match class::Entity::find_by_id(class_id).one(db).await {
        Ok(Some(c)) => c,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Class not found")),
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Class lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            );
        }
    };

    let mut update = class::ActiveModel {
        id: Set(existing.id),
        updated_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    if let Some(capacity) = req.capacity {
        update.capacity = Set(capacity);
    }
    if let Some(year) = req.academic_year {
        update.academic_year = Set(year);
    }
    if let Some(teacher_id) = req.teacher_id {
        update.teacher_id = Set(Some(teacher_id));
    }

    match update.update(db).await {
        Ok(c) => (
            StatusCode::OK,
            Json(ApiResponse::success(json!(c), "Class updated successfully")),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Class update failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            )
        }
    }
}
