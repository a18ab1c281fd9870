use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts},
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::TypedHeader;
use headers::{Authorization, UserAgent, authorization::Bearer};
use std::net::SocketAddr;
use tracing::info;

use crate::auth::claims::Claims;

/// Request logging layer.
///
/// Emits one `info` line per request with the method, path, caller IP,
/// user id (0 when the bearer token is absent or invalid) and user agent.
/// CORS preflight `OPTIONS` requests are not logged.
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();

    // Preflight noise is not worth a log line.
    if parts.method == Method::OPTIONS {
        let req = Request::from_parts(parts, body);
        return next.run(req).await;
    }

    let user_id = TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &())
        .await
        .ok()
        .and_then(|TypedHeader(Authorization(bearer))| Claims::from_token(bearer.token()))
        .map(|c| c.sub);

    let user_agent = TypedHeader::<UserAgent>::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|TypedHeader(ua)| ua.to_string());

    info!(
        method = %parts.method,
        path = %parts.uri.path(),
        ip = %addr.ip(),
        user = user_id.unwrap_or(0),
        user_agent = user_agent.as_deref().unwrap_or("-"),
        "request"
    );

    let req = Request::from_parts(parts, body);
    next.run(req).await
}
