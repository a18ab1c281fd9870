//! Administration endpoints under `/admin` (admin only).

use axum::Router;
use util::state::AppState;

pub mod classes;

use classes::class_routes;

pub fn admin_routes() -> Router<AppState> {
    Router::new().nest("/classes", class_routes())
}
