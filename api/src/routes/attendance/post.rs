use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use db::models::attendance_record::{self, AttendanceStatus};
use db::models::class::RosterError;
use serde::Deserialize;
use serde_json::{Value, json};
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct AttendanceEntry {
    pub student_id: i64,
    pub status: AttendanceStatus,
}

#[derive(Debug, Deserialize)]
pub struct RecordAttendanceRequest {
    pub class_id: i64,
    pub date: NaiveDate,
    pub entries: Vec<AttendanceEntry>,
}

/// POST /attendance
///
/// Marks attendance for a class on one day. One record is kept per
/// `(class, student, date)`; re-marking a student overwrites the earlier
/// status.
///
/// ### Request Body
/// ```json
/// {
///   "class_id": 3,
///   "date": "2026-03-02",
///   "entries": [
///     { "student_id": 9, "status": "present" },
///     { "student_id": 10, "status": "late" }
///   ]
/// }
/// ```
///
/// ### Responses
/// - `200 OK` with the recorded marks
/// - `404 Not Found` (unknown class or student)
pub async fn record_attendance(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<RecordAttendanceRequest>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<Value>::error("Service is running in degraded mode")),
        );
    };

    if req.entries.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("At least one entry is required")),
        );
    }

    let mut recorded = Vec::with_capacity(req.entries.len());
    for entry in &req.entries {
        match attendance_record::Model::record(
            db,
            req.class_id,
            entry.student_id,
            req.date,
            entry.status,
            Some(claims.sub),
        )
        .await
        {
            Ok(r) => recorded.push(r),
            Err(RosterError::ClassNotFound) => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(ApiResponse::error("Class not found")),
                );
            }
            Err(RosterError::StudentNotFound) => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(ApiResponse::error(format!(
                        "Student {} not found",
                        entry.student_id
                    ))),
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Attendance recording failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error("An internal error occurred")),
                );
            }
        }
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            json!(recorded),
            "Attendance recorded successfully",
        )),
    )
}
