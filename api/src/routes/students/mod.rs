//! Student directory endpoints under `/students` (staff only).

use axum::{Router, routing::get};
use util::state::AppState;

pub mod get;

use get::{get_student, get_student_attendance, list_students};

pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students))
        .route("/{student_id}", get(get_student))
        .route("/{student_id}/attendance", get(get_student_attendance))
}
