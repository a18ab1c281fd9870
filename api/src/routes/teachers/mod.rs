//! Teacher directory endpoints under `/teachers` (admin only).

use axum::{Router, routing::get};
use util::state::AppState;

pub mod get;

use get::{get_teacher, list_teachers};

pub fn teacher_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_teachers))
        .route("/{teacher_id}", get(get_teacher))
}
