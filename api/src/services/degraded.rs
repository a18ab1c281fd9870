//! Fixed fallback dataset served while the database is unreachable.
//!
//! When the persistence layer cannot be reached at startup the server still
//! boots: the sentinel token from configuration resolves to the one identity
//! below, primary list endpoints answer with this dataset, and every mutating
//! endpoint answers 503. Nothing here is consulted while a database
//! connection exists.

use crate::auth::claims::Claims;
use db::models::user::Role;
use serde_json::{Value, json};
use util::config;

pub const ADMIN_USER_ID: i64 = 0;
pub const ADMIN_EMAIL: &str = "admin@offline.local";

/// Claims the sentinel token resolves to.
pub fn admin_claims() -> Claims {
    Claims {
        sub: ADMIN_USER_ID,
        email: ADMIN_EMAIL.to_owned(),
        role: Role::Admin,
        // The sentinel is re-validated on every request, so the embedded
        // expiry only needs to outlive the current request.
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    }
}

/// Whether a degraded-mode login attempt matches the fixed credential.
pub fn credentials_match(email: &str, role: Role, password: &str) -> bool {
    email.eq_ignore_ascii_case(ADMIN_EMAIL)
        && role == Role::Admin
        && password == config::degraded_admin_token()
}

pub fn admin_profile() -> Value {
    json!({
        "id": ADMIN_USER_ID,
        "email": ADMIN_EMAIL,
        "role": "admin",
        "name": "Offline Administrator",
        "active": true,
    })
}

pub fn classes() -> Value {
    json!([
        { "id": 1, "name": "Grade 10-A", "grade": "10", "section": "A", "capacity": 40, "academic_year": "2026" },
        { "id": 2, "name": "Grade 10-B", "grade": "10", "section": "B", "capacity": 40, "academic_year": "2026" },
    ])
}

pub fn students() -> Value {
    json!([
        { "id": 1, "student_number": "S0001", "name": "Sample Student", "grade": "10", "section": "A", "class_id": 1 },
    ])
}

pub fn teachers() -> Value {
    json!([
        { "id": 1, "teacher_number": "T0001", "name": "Sample Teacher", "department": "Mathematics" },
    ])
}

pub fn assignments() -> Value {
    json!([
        {
            "id": 1,
            "title": "Sample assignment",
            "subject": "Mathematics",
            "targets": [{ "grade": "10", "section": "A" }],
            "status": "published",
        },
    ])
}

pub fn notices() -> Value {
    json!([
        {
            "id": 1,
            "title": "Service notice",
            "content": "The server is running without its database; data shown is placeholder data.",
            "audience": "all",
            "status": "published",
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use util::config::AppConfig;

    #[test]
    #[serial]
    fn only_the_fixed_credential_matches() {
        AppConfig::set_degraded_admin_token("degraded-admin-token");

        assert!(credentials_match(ADMIN_EMAIL, Role::Admin, "degraded-admin-token"));
        assert!(credentials_match("Admin@Offline.Local", Role::Admin, "degraded-admin-token"));

        assert!(!credentials_match(ADMIN_EMAIL, Role::Admin, "wrong"));
        assert!(!credentials_match(ADMIN_EMAIL, Role::Teacher, "degraded-admin-token"));
        assert!(!credentials_match("other@example.com", Role::Admin, "degraded-admin-token"));
    }
}
