use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use db::models::attendance_record;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use serde_json::{Value, json};
use util::state::AppState;

use crate::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub date: Option<NaiveDate>,
}

/// GET /attendance/classes/{class_id}
///
/// A class's attendance records, optionally narrowed to one day with
/// `?date=YYYY-MM-DD`.
pub async fn class_attendance(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Query(query): Query<AttendanceQuery>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<Value>::error("Service is running in degraded mode")),
        );
    };

    let mut find = attendance_record::Entity::find()
        .filter(attendance_record::Column::ClassId.eq(class_id))
        .order_by_desc(attendance_record::Column::Date);
    if let Some(date) = query.date {
        find = find.filter(attendance_record::Column::Date.eq(date));
    }

    match find.all(db).await {
        Ok(records) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                json!(records),
                "Attendance fetched successfully",
            )),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Attendance lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            )
        }
    }
}
