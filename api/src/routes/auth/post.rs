use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{Datelike, NaiveDate, Utc};
use db::models::user::{CredentialError, NewUser, Role};
use db::models::{admin, class, student, teacher, user};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use util::state::AppState;
use util::validation::format_validation_errors;
use validator::Validate;

use crate::auth::claims::AuthUser;
use crate::auth::generate_jwt;
use crate::response::ApiResponse;
use crate::services::degraded;

lazy_static::lazy_static! {
    static ref ROLE_NUMBER_REGEX: regex::Regex = regex::Regex::new("^[A-Za-z0-9-]{3,20}$").unwrap();
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    pub role: Role,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,

    // Student fields
    #[validate(regex(
        path = *ROLE_NUMBER_REGEX,
        message = "Student number must be 3-20 alphanumeric characters"
    ))]
    pub student_number: Option<String>,
    pub grade: Option<String>,
    pub section: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub admission_date: Option<NaiveDate>,

    // Teacher fields
    #[validate(regex(
        path = *ROLE_NUMBER_REGEX,
        message = "Teacher number must be 3-20 alphanumeric characters"
    ))]
    pub teacher_number: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,

    // Admin fields
    #[validate(regex(
        path = *ROLE_NUMBER_REGEX,
        message = "Admin number must be 3-20 alphanumeric characters"
    ))]
    pub admin_number: Option<String>,
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Default)]
pub struct AuthResponse {
    pub id: i64,
    pub email: String,
    pub role: String,
    pub name: String,
    pub token: String,
    pub expires_at: String,
}

fn auth_response(u: &user::Model, token: String, expires_at: String) -> AuthResponse {
    AuthResponse {
        id: u.id,
        email: u.email.clone(),
        role: serde_json::json!(u.role).as_str().unwrap_or_default().to_owned(),
        name: u.name.clone(),
        token,
        expires_at,
    }
}

/// POST /auth/register
///
/// Register a new user together with its role-specific record.
///
/// ### Request Body
/// ```json
/// {
///   "role": "student",
///   "email": "user@example.com",
///   "password": "strongpassword",
///   "name": "Alice Brown",
///   "student_number": "S2026-042",
///   "grade": "10",
///   "section": "A"
/// }
/// ```
///
/// ### Responses
///
/// - `201 Created`
/// ```json
/// {
///   "success": true,
///   "data": {
///     "id": 1,
///     "email": "user@example.com",
///     "role": "student",
///     "name": "Alice Brown",
///     "token": "jwt_token_here",
///     "expires_at": "2026-03-09T11:00:00Z"
///   },
///   "message": "User registered successfully"
/// }
/// ```
///
/// - `400 Bad Request` (validation failure)
/// - `409 Conflict` (duplicate email or role number)
/// - `503 Service Unavailable` (database unreachable)
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<AuthResponse>::error(format_validation_errors(
                &validation_errors,
            ))),
        );
    }

    let Some(db) = state.db() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::error("Service is running in degraded mode")),
        );
    };

    match user::Model::find_by_email(db, &req.email).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error("A user with this email already exists")),
            );
        }
        Ok(None) => {}
        Err(e) => return internal(e),
    }

    if let Err(resp) = check_role_number(db, &req).await {
        return resp;
    }

    let new_user = NewUser {
        email: req.email.clone(),
        password: req.password.clone(),
        role: Some(req.role),
        name: req.name.clone(),
        phone: req.phone.clone(),
        address: req.address.clone(),
        date_of_birth: req.date_of_birth,
        gender: req.gender.clone(),
    };

    let created = match user::Model::create(db, new_user, req.role).await {
        Ok(u) => u,
        Err(e) => return internal(e),
    };

    // Identity and role record are created in two steps without a
    // transaction; if the second insert fails the user row is removed
    // best-effort so the email is not left unusable.
    if let Err(resp) = create_role_record(db, &created, &req).await {
        tracing::warn!(user_id = created.id, "Rolling back user row after role record failure");
        let _ = user::Entity::delete_by_id(created.id).exec(db).await;
        return resp;
    }

    let (token, expires_at) = generate_jwt(created.id, &created.email, created.role);
    (
        StatusCode::CREATED,
        Json(ApiResponse::success(
            auth_response(&created, token, expires_at),
            "User registered successfully",
        )),
    )
}

type HandlerError = (StatusCode, Json<ApiResponse<AuthResponse>>);

fn internal(e: impl std::fmt::Display) -> (StatusCode, Json<ApiResponse<AuthResponse>>) {
    tracing::error!(error = %e, "Registration failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error("An internal error occurred")),
    )
}

/// Rejects registration when the role-specific number is missing or taken.
async fn check_role_number(
    db: &sea_orm::DatabaseConnection,
    req: &RegisterRequest,
) -> Result<(), HandlerError> {
    let conflict = |msg: &str| {
        Err((
            StatusCode::CONFLICT,
            Json(ApiResponse::<AuthResponse>::error(msg)),
        ))
    };
    let missing = |msg: &str| {
        Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<AuthResponse>::error(msg)),
        ))
    };

    match req.role {
        Role::Student => match &req.student_number {
            None => return missing("Student number is required"),
            Some(n) => {
                if matches!(student::Model::find_by_number(db, n).await, Ok(Some(_))) {
                    return conflict("A student with this student number already exists");
                }
            }
        },
        Role::Teacher => match &req.teacher_number {
            None => return missing("Teacher number is required"),
            Some(n) => {
                if matches!(teacher::Model::find_by_number(db, n).await, Ok(Some(_))) {
                    return conflict("A teacher with this teacher number already exists");
                }
            }
        },
        Role::Admin => match &req.admin_number {
            None => return missing("Admin number is required"),
            Some(n) => {
                if matches!(admin::Model::find_by_number(db, n).await, Ok(Some(_))) {
                    return conflict("An admin with this admin number already exists");
                }
            }
        },
    }
    Ok(())
}

async fn create_role_record(
    db: &sea_orm::DatabaseConnection,
    created: &user::Model,
    req: &RegisterRequest,
) -> Result<(), HandlerError> {
    match req.role {
        Role::Student => {
            let number = req.student_number.clone().unwrap_or_default();
            let new = student::NewStudent {
                student_number: number,
                grade: req.grade.clone(),
                section: req.section.clone(),
                guardian_name: req.guardian_name.clone(),
                guardian_phone: req.guardian_phone.clone(),
                admission_date: req.admission_date,
            };
            let record = student::Model::create(db, created.id, new).await.map_err(|e| internal(e))?;

            // Onboarding with a grade and section places the student in the
            // canonical class when there is room; a full class just leaves
            // the student unassigned.
            if let (Some(raw_grade), Some(section)) = (&req.grade, &req.section) {
                if let Some(grade) = class::normalize_grade(raw_grade) {
                    let year = Utc::now().year().to_string();
                    match class::Model::find_or_create(db, &grade, section, &year, 40).await {
                        Ok(c) => {
                            if let Err(e) = class::Model::add_student(db, c.id, record.id).await {
                                tracing::info!(
                                    student_id = record.id,
                                    class = %c.name,
                                    error = %e,
                                    "Student left unassigned at registration"
                                );
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Could not resolve class at registration");
                        }
                    }
                }
            }
        }
        Role::Teacher => {
            let number = req.teacher_number.clone().unwrap_or_default();
            teacher::Model::create(
                db,
                created.id,
                &number,
                req.department.clone(),
                req.position.clone(),
            )
            .await
            .map_err(|e| internal(e))?;
        }
        Role::Admin => {
            let number = req.admin_number.clone().unwrap_or_default();
            let permissions = req.permissions.clone().unwrap_or_default();
            admin::Model::create(db, created.id, &number, &permissions)
                .await
                .map_err(|e| internal(e))?;
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub role: Role,
    pub password: String,
}

/// POST /auth/login
///
/// Authenticate an existing user and issue a JWT.
///
/// Every mismatch (unknown email, wrong role, wrong password, deactivated
/// account) produces the identical `401 Invalid credentials` body so callers
/// cannot probe which part failed.
///
/// ### Request Body
/// ```json
/// {
///   "email": "user@example.com",
///   "role": "student",
///   "password": "strongpassword"
/// }
/// ```
///
/// ### Responses
///
/// - `200 OK` (same shape as registration)
/// - `401 Unauthorized`
/// ```json
/// {
///   "success": false,
///   "message": "Invalid credentials"
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<AuthResponse>::error(format_validation_errors(
                &validation_errors,
            ))),
        );
    }

    let Some(db) = state.db() else {
        // Degraded mode: only the fixed offline credential is accepted and
        // the sentinel token is issued instead of a signed JWT.
        if degraded::credentials_match(&req.email, req.role, &req.password) {
            let response = AuthResponse {
                id: degraded::ADMIN_USER_ID,
                email: degraded::ADMIN_EMAIL.to_owned(),
                role: "admin".to_owned(),
                name: "Offline Administrator".to_owned(),
                token: util::config::degraded_admin_token(),
                expires_at: String::new(),
            };
            return (
                StatusCode::OK,
                Json(ApiResponse::success(response, "Logged in (degraded mode)")),
            );
        }
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Invalid credentials")),
        );
    };

    match user::Model::verify_credentials(db, &req.email, req.role, &req.password).await {
        Ok(u) => {
            if let Err(e) = user::Model::touch_last_login(db, u.id).await {
                tracing::warn!(user_id = u.id, error = %e, "Failed to record last login");
            }
            let (token, expires_at) = generate_jwt(u.id, &u.email, u.role);
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    auth_response(&u, token, expires_at),
                    "Logged in successfully",
                )),
            )
        }
        Err(CredentialError::InvalidCredentials) => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Invalid credentials")),
        ),
        Err(e) => internal(e),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// POST /auth/change-password
///
/// Replace the caller's password after verifying the current one.
///
/// ### Responses
/// - `200 OK` on success
/// - `400 Bad Request` (validation failure)
/// - `401 Unauthorized` (current password mismatch)
/// - `503 Service Unavailable` (database unreachable)
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> impl IntoResponse {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(format_validation_errors(
                &validation_errors,
            ))),
        );
    }

    let Some(db) = state.db() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::error("Service is running in degraded mode")),
        );
    };

    match user::Model::change_password(db, claims.sub, &req.current_password, &req.new_password)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Password changed successfully")),
        ),
        Err(CredentialError::InvalidCredentials) => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Current password is incorrect")),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Password change failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("An internal error occurred")),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::response::IntoResponse;
    use db::test_utils::setup_test_db;
    use serde_json::Value;
    use serial_test::serial;
    use util::config::AppConfig;

    async fn body_of(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn register_request(role: Role, email: &str) -> RegisterRequest {
        RegisterRequest {
            role,
            email: email.into(),
            password: "strongpassword".into(),
            name: "Test User".into(),
            phone: None,
            address: None,
            date_of_birth: None,
            gender: None,
            student_number: Some("S2026-001".into()),
            grade: Some("10".into()),
            section: Some("A".into()),
            guardian_name: None,
            guardian_phone: None,
            admission_date: None,
            teacher_number: Some("T2026-001".into()),
            department: None,
            position: None,
            admin_number: Some("A2026-001".into()),
            permissions: None,
        }
    }

    #[tokio::test]
    #[serial]
    async fn register_then_login_round_trip() {
        AppConfig::set_jwt_secret("test-secret");
        let state = AppState::with_db(setup_test_db().await);

        let response = register(
            State(state.clone()),
            Json(register_request(Role::Student, "alice@example.com")),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_of(response).await;
        assert_eq!(json["data"]["role"], "student");
        assert!(json["data"].get("password").is_none());
        assert!(json["data"]["token"].as_str().unwrap().len() > 20);

        // Duplicate email is a conflict.
        let response = register(
            State(state.clone()),
            Json(register_request(Role::Student, "alice@example.com")),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "alice@example.com".into(),
                role: Role::Student,
                password: "strongpassword".into(),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    #[serial]
    async fn login_failures_are_uniform() {
        AppConfig::set_jwt_secret("test-secret");
        let state = AppState::with_db(setup_test_db().await);

        register(
            State(state.clone()),
            Json(register_request(Role::Student, "bob@example.com")),
        )
        .await
        .into_response();

        let attempts = [
            ("bob@example.com", Role::Student, "wrongpassword"),
            ("ghost@example.com", Role::Student, "strongpassword"),
            ("bob@example.com", Role::Teacher, "strongpassword"),
        ];
        for (email, role, password) in attempts {
            let response = login(
                State(state.clone()),
                Json(LoginRequest {
                    email: email.into(),
                    role,
                    password: password.into(),
                }),
            )
            .await
            .into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let json = body_of(response).await;
            assert_eq!(json["message"], "Invalid credentials");
        }
    }

    #[tokio::test]
    #[serial]
    async fn degraded_mode_accepts_only_the_fixed_credential() {
        AppConfig::set_degraded_admin_token("degraded-admin-token");
        let state = AppState::unavailable();

        // Registration is a write and is refused outright.
        let response = register(
            State(state.clone()),
            Json(register_request(Role::Student, "alice@example.com")),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        // The fixed offline credential logs in and receives the sentinel.
        let response = login(
            State(state.clone()),
            Json(LoginRequest {
                email: crate::services::degraded::ADMIN_EMAIL.into(),
                role: Role::Admin,
                password: "degraded-admin-token".into(),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_of(response).await;
        assert_eq!(json["data"]["token"], "degraded-admin-token");

        // Anything else is rejected.
        let response = login(
            State(state),
            Json(LoginRequest {
                email: "alice@example.com".into(),
                role: Role::Admin,
                password: "degraded-admin-token".into(),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
