//! Authentication endpoints under `/auth`.
//!
//! `register` and `login` are public; `change-password` and `me` resolve the
//! caller through the `AuthUser` extractor and therefore require a valid
//! bearer token.

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod get;
pub mod post;

use get::me;
use post::{change_password, login, register};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/change-password", post(change_password))
        .route("/me", get(me))
}
