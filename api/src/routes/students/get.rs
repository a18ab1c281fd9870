use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use db::models::{attendance_record, student, user};
use sea_orm::EntityTrait;
use serde_json::{Value, json};
use util::state::AppState;

use crate::response::ApiResponse;
use crate::services::degraded;

fn merged(record: &student::Model, account: Option<&user::Model>) -> Value {
    let mut v = json!(record);
    if let (Value::Object(map), Some(u)) = (&mut v, account) {
        map.insert("name".into(), json!(u.name));
        map.insert("email".into(), json!(u.email));
        map.insert("active".into(), json!(u.active));
    }
    v
}

/// GET /students
///
/// Lists every student together with name/email from the linked account.
///
/// ### Responses
/// - `200 OK` with an array of student records
pub async fn list_students(State(state): State<AppState>) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return (
            StatusCode::OK,
            Json(ApiResponse::success(
                degraded::students(),
                "Students fetched (degraded mode)",
            )),
        );
    };

    match student::Entity::find()
        .find_also_related(user::Entity)
        .all(db)
        .await
    {
        Ok(rows) => {
            let list: Vec<Value> = rows
                .iter()
                .map(|(s, u)| merged(s, u.as_ref()))
                .collect();
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    json!(list),
                    "Students fetched successfully",
                )),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Student listing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            )
        }
    }
}

/// GET /students/{student_id}
///
/// ### Responses
/// - `200 OK` with the merged student record
/// - `404 Not Found`
pub async fn get_student(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<Value>::error("Service is running in degraded mode")),
        );
    };

    match student::Entity::find_by_id(student_id)
        .find_also_related(user::Entity)
        .one(db)
        .await
    {
        Ok(Some((s, u))) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                merged(&s, u.as_ref()),
                "Student fetched successfully",
            )),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Student not found")),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Student lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            )
        }
    }
}

/// GET /students/{student_id}/attendance
///
/// A student's attendance history, most recent day first.
pub async fn get_student_attendance(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<Value>::error("Service is running in degraded mode")),
        );
    };

    match student::Entity::find_by_id(student_id).one(db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Student not found")),
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Student lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            );
        }
    }

    match attendance_record::Model::for_student(db, student_id).await {
        Ok(history) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                json!(history),
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
