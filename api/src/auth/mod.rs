pub mod claims;
pub mod extractors;
pub mod guards;
pub mod middleware;

pub use claims::{AuthUser, Claims};

use chrono::{Duration, Utc};
use db::models::user::Role;
use jsonwebtoken::{EncodingKey, Header, encode};
use util::config;

/// Generates a JWT and its expiry timestamp for a given user.
pub fn generate_jwt(user_id: i64, email: &str, role: Role) -> (String, String) {
    let expiry = Utc::now() + Duration::minutes(config::jwt_duration_minutes() as i64);

    let claims = Claims {
        sub: user_id,
        email: email.to_owned(),
        role,
        exp: expiry.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config::jwt_secret().as_bytes()),
    )
    .expect("Token encoding failed");

    (token, expiry.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use util::config::AppConfig;

    #[test]
    #[serial]
    fn issued_tokens_round_trip() {
        AppConfig::set_jwt_secret("test-secret");
        let (token, _expiry) = generate_jwt(7, "alice@example.com", Role::Teacher);

        let claims = Claims::from_token(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, Role::Teacher);
    }

    #[test]
    #[serial]
    fn garbage_tokens_are_rejected() {
        AppConfig::set_jwt_secret("test-secret");
        assert!(Claims::from_token("not-a-jwt").is_none());
    }
}
