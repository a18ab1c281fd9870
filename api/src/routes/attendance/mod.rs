//! Attendance endpoints under `/attendance` (teachers and admins).

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod get;
pub mod post;

pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(post::record_attendance))
        .route("/classes/{class_id}", get(get::class_attendance))
}
