//! HTTP route entry point for `/api/...`.
//!
//! Routes are organized by domain, each protected via the appropriate access
//! control middleware:
//! - `/health` → Liveness endpoint (public)
//! - `/auth` → Registration, login, password change, profile (login/register public)
//! - `/students` → Student directory (staff)
//! - `/teachers` → Teacher directory (admin-only)
//! - `/admin` → Class and roster administration (admin-only)
//! - `/assignments` → Assignment workflow (authenticated, role-scoped in handlers)
//! - `/notices` → Notice broadcast and read tracking (authenticated)
//! - `/attendance` → Attendance marking and history (teachers and admins)

use crate::auth::guards::{allow_admin, allow_authenticated, allow_teacher};
use crate::routes::{
    admin::admin_routes, assignments::assignment_routes, attendance::attendance_routes,
    auth::auth_routes, health::health_routes, notices::notice_routes, students::student_routes,
    teachers::teacher_routes,
};
use axum::{Router, middleware::from_fn_with_state};
use util::state::AppState;

pub mod admin;
pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod health;
pub mod notices;
pub mod students;
pub mod teachers;

/// Builds the complete application router for all HTTP endpoints.
///
/// The returned router has `AppState` as its state type and mounts all core
/// API routes under their respective base paths.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes())
        .nest(
            "/students",
            student_routes().route_layer(from_fn_with_state(app_state.clone(), allow_teacher)),
        )
        .nest(
            "/teachers",
            teacher_routes().route_layer(from_fn_with_state(app_state.clone(), allow_admin)),
        )
        .nest(
            "/admin",
            admin_routes().route_layer(from_fn_with_state(app_state.clone(), allow_admin)),
        )
        .nest(
            "/assignments",
            assignment_routes()
                .route_layer(from_fn_with_state(app_state.clone(), allow_authenticated)),
        )
        .nest(
            "/notices",
            notice_routes().route_layer(from_fn_with_state(app_state.clone(), allow_authenticated)),
        )
        .nest(
            "/attendance",
            attendance_routes().route_layer(from_fn_with_state(app_state.clone(), allow_teacher)),
        )
        .with_state(app_state)
}
