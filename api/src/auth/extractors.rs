use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use axum_extra::extract::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use sea_orm::EntityTrait;
use util::{config, state::AppState};

use crate::auth::claims::{AuthUser, Claims};
use crate::services::degraded;

/// Implements extraction of `AuthUser` from request headers.
///
/// Checks for a valid Bearer token in the `Authorization` header, verifies
/// the JWT against the configured secret, and resolves the claims into an
/// `AuthUser`. The referenced account must still exist and be active.
///
/// The degraded-mode sentinel token is honored here, and only while the
/// persistence layer is unreachable; it never short-circuits production
/// credential validation. The reverse also holds: while the database is
/// down, ordinary JWTs are rejected even if their signature and expiry
/// are valid, so the sentinel is the sole degraded-mode credential.
///
/// # Errors
/// - Returns `401 Unauthorized` if the header is missing, malformed, the
///   token is invalid or expired, or the account is deactivated.
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    (
                        StatusCode::UNAUTHORIZED,
                        "Missing or invalid Authorization header",
                    )
                })?;

        if bearer.token() == config::degraded_admin_token() {
            if state.is_available() {
                return Err((StatusCode::UNAUTHORIZED, "Invalid or expired token"));
            }
            return Ok(AuthUser(degraded::admin_claims()));
        }

        let claims = Claims::from_token(bearer.token())
            .ok_or((StatusCode::UNAUTHORIZED, "Invalid or expired token"))?;

        // While the database is unreachable the referenced account cannot
        // be checked, so tokens issued before the outage are rejected too;
        // the sentinel above is the only credential that authenticates.
        let Some(db) = state.db() else {
            return Err((StatusCode::UNAUTHORIZED, "Invalid or expired token"));
        };

        let user = db::models::User::find_by_id(claims.sub)
            .one(db)
            .await
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?;

        match user {
            Some(u) if u.active => {}
            _ => return Err((StatusCode::UNAUTHORIZED, "Invalid or expired token")),
        }

        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::generate_jwt;
    use axum::http::{Request, header::AUTHORIZATION};
    use db::models::user::Role;
    use serial_test::serial;
    use util::config::AppConfig;

    fn parts_with_bearer(token: &str) -> axum::http::request::Parts {
        let req = Request::builder()
            .uri("/")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap();
        req.into_parts().0
    }

    #[tokio::test]
    #[serial]
    async fn degraded_mode_rejects_pre_outage_tokens() {
        AppConfig::set_jwt_secret("test-secret");
        AppConfig::set_degraded_admin_token("degraded-admin-token");

        // A perfectly valid token issued before the outage.
        let (token, _) = generate_jwt(42, "pupil@example.com", Role::Student);

        let state = AppState::unavailable();
        let mut parts = parts_with_bearer(&token);
        let result = AuthUser::from_request_parts(&mut parts, &state).await;
        assert!(result.is_err());

        // The sentinel is the one credential that still works.
        let mut parts = parts_with_bearer("degraded-admin-token");
        let user = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(user.0.role, Role::Admin);
        assert_eq!(user.0.sub, degraded::ADMIN_USER_ID);
    }

    #[tokio::test]
    #[serial]
    async fn sentinel_is_rejected_while_the_database_is_up() {
        AppConfig::set_jwt_secret("test-secret");
        AppConfig::set_degraded_admin_token("degraded-admin-token");

        let db = db::test_utils::setup_test_db().await;
        let state = AppState::with_db(db);

        let mut parts = parts_with_bearer("degraded-admin-token");
        let result = AuthUser::from_request_parts(&mut parts, &state).await;
        assert!(result.is_err());
    }
}
