use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use util::state::AppState;

#[derive(serde::Serialize, Default)]
pub struct Empty;

/// Helper to extract and validate the caller from the request, inserting the
/// resolved `AuthUser` back into the request extensions for handlers.
async fn extract_and_insert_authuser(
    state: &AppState,
    req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), (StatusCode, Json<ApiResponse<Empty>>)> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, state)
        .await
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Authentication required")),
            )
        })?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

fn forbidden(msg: &str) -> (StatusCode, Json<ApiResponse<Empty>>) {
    (StatusCode::FORBIDDEN, Json(ApiResponse::error(msg)))
}

/// Any authenticated caller passes; role scoping happens in the handler.
pub async fn allow_authenticated(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, _user) = extract_and_insert_authuser(&state, req).await?;
    Ok(next.run(req).await)
}

/// Admins only.
pub async fn allow_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, user) = extract_and_insert_authuser(&state, req).await?;

    if !user.0.is_admin() {
        return Err(forbidden("Admin access required"));
    }
    Ok(next.run(req).await)
}

/// Teacher-only guard (admins pass as well).
pub async fn allow_teacher(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, user) = extract_and_insert_authuser(&state, req).await?;

    if !(user.0.is_teacher() || user.0.is_admin()) {
        return Err(forbidden("Teacher access required"));
    }
    Ok(next.run(req).await)
}

