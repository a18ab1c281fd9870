use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::{class, class_schedule};
use serde::Deserialize;
use serde_json::{Value, json};
use util::state::AppState;
use util::validation::format_validation_errors;
use validator::Validate;

use super::{degraded_write, roster_error};
use crate::response::ApiResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassRequest {
    #[validate(length(min = 1, message = "Grade is required"))]
    pub grade: String,
    #[validate(length(min = 1, message = "Section is required"))]
    pub section: String,
    #[validate(length(min = 4, message = "Academic year is required"))]
    pub academic_year: String,
    #[validate(range(min = 1, max = 200, message = "Capacity must be between 1 and 200"))]
    pub capacity: Option<i32>,
    pub teacher_id: Option<i64>,
}

/// POST /admin/classes
///
/// Create a class. The class name is always derived as
/// `Grade {grade}-{section}`.
///
/// ### Request Body
/// ```json
/// { "grade": "10", "section": "A", "academic_year": "2026", "capacity": 40 }
/// ```
///
/// ### Responses
/// - `201 Created` with the new class
/// - `409 Conflict` (duplicate name)
pub async fn create_class(
    State(state): State<AppState>,
    Json(req): Json<CreateClassRequest>,
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

    match class::Model::create(
        db,
        &req.grade,
        &req.section,
        &req.academic_year,
        req.capacity.unwrap_or(40),
        req.teacher_id,
    )
    .await
    {
        Ok(c) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(json!(c), "Class created successfully")),
        ),
        Err(e) => roster_error(e),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddStudentRequest {
    pub student_id: i64,
}

/// POST /admin/classes/{class_id}/students
///
/// Add a student to the roster. The student must not already belong to a
/// class and the class must have room; on success the student's
/// denormalized grade/section are rewritten from the class.
///
/// ### Responses
/// - `200 OK` with the updated student
/// - `404 Not Found` (class or student missing)
/// - `409 Conflict` (already assigned, or class at capacity)
pub async fn add_student(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Json(req): Json<AddStudentRequest>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return degraded_write();
    };

    match class::Model::add_student(db, class_id, req.student_id).await {
        Ok(s) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                json!(s),
                "Student added to class successfully",
            )),
        ),
        Err(e) => roster_error(e),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddScheduleSlotRequest {
    #[validate(range(min = 1, max = 7, message = "Day must be between 1 and 7"))]
    pub day_of_week: i32,
    #[validate(range(min = 1, max = 12, message = "Period must be between 1 and 12"))]
    pub period: i32,
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,
    pub teacher_id: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// POST /admin/classes/{class_id}/schedule
///
/// Add a timetable slot. `(day_of_week, period)` must be free for the class.
///
/// ### Responses
/// - `201 Created` with the new slot
/// - `409 Conflict` (slot already occupied)
pub async fn add_schedule_slot(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Json(req): Json<AddScheduleSlotRequest>,
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

    let slot = class_schedule::NewScheduleSlot {
        day_of_week: req.day_of_week,
        period: req.period,
        subject: req.subject,
        teacher_id: req.teacher_id,
        start_time: req.start_time,
        end_time: req.end_time,
    };

    match class_schedule::Model::create(db, class_id, slot).await {
        Ok(s) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                json!(s),
                "Schedule slot added successfully",
            )),
        ),
        Err(e) => roster_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub academic_year: Option<String>,
    pub default_capacity: Option<i32>,
}

/// POST /admin/classes/reassign
///
/// Clears every roster, then re-derives each student's class from their
/// grade/section fields. Composite labels like "Grade 10-A" are normalized
/// first; missing classes are created, full classes skip the student.
///
/// ### Responses
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": { "assigned": 120, "skipped": 3 },
///   "message": "Classes reassigned"
/// }
/// ```
pub async fn reassign_classes(
    State(state): State<AppState>,
    Json(req): Json<ReassignRequest>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return degraded_write();
    };

    let year = req
        .academic_year
        .unwrap_or_else(|| chrono::Utc::now().format("%Y").to_string());

    match class::Model::reassign_all(db, &year, req.default_capacity.unwrap_or(40)).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(ApiResponse::success(json!(summary), "Classes reassigned")),
        ),
        Err(e) => roster_error(e),
    }
}
