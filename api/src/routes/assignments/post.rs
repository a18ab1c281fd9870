use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use db::models::assignment::{self, NewAssignment, TargetPair};
use db::models::submission;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait};
use serde_json::{Value, json};
use util::{paths, state::AppState};

use super::{degraded_write, internal, require_student_record, require_teacher_record, submission_error};
use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use crate::services::uploads::{self, UploadError};

fn bad_request(msg: impl Into<String>) -> (StatusCode, Json<ApiResponse<Value>>) {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(msg)))
}

fn upload_error(e: UploadError) -> (StatusCode, Json<ApiResponse<Value>>) {
    match e {
        UploadError::Io(err) => internal(err),
        other => bad_request(other.to_string()),
    }
}

/// POST /assignments
///
/// Teacher-only. Multipart form with text fields `title`, `description`
/// (optional), `subject` (optional), `targets` (JSON array of
/// `{"grade": "10", "section": "A"}` pairs), `due_date` (RFC 3339), plus
/// any number of material file parts. The created assignment is published
/// immediately.
///
/// ### Responses
/// - `201 Created` with the new assignment
/// - `400 Bad Request` (missing fields, bad targets/due date, bad upload)
/// - `403 Forbidden` (caller has no teacher record)
pub async fn create_assignment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    multipart: Multipart,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return degraded_write();
    };

    let teacher = match require_teacher_record(db, &claims).await {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    let form = match uploads::parse_form(multipart).await {
        Ok(f) => f,
        Err(e) => return upload_error(e),
    };

    let Some(title) = form.field("title").filter(|t| !t.is_empty()) else {
        return bad_request("Title is required");
    };
    let Some(raw_targets) = form.field("targets") else {
        return bad_request("Targets are required");
    };
    let targets: Vec<TargetPair> = match serde_json::from_str(raw_targets) {
        Ok(t) => t,
        Err(_) => return bad_request("Targets must be a JSON array of grade/section pairs"),
    };
    if targets.is_empty() {
        return bad_request("At least one target grade/section is required");
    }
    let due_date: DateTime<Utc> = match form.field("due_date").map(|d| d.parse()) {
        Some(Ok(d)) => d,
        _ => return bad_request("A valid RFC 3339 due date is required"),
    };

    let new = NewAssignment {
        title: title.to_owned(),
        description: form.field("description").map(str::to_owned),
        subject: form.field("subject").map(str::to_owned),
        targets,
        due_date,
        materials: vec![],
    };

    let created = match assignment::Model::create(db, teacher.id, new).await {
        Ok(a) => a,
        Err(e) => return internal(e),
    };

    // Materials are stored under the new assignment's id, then attached.
    // A failed upload removes the fresh row so no half-created assignment
    // is published.
    if !form.files.is_empty() {
        let dir = paths::assignment_dir(created.id);
        let stored = match uploads::store_all(&dir, &form) {
            Ok(s) => s,
            Err(e) => {
                let _ = assignment::Entity::delete_by_id(created.id).exec(db).await;
                return upload_error(e);
            }
        };

        let update = assignment::ActiveModel {
            id: Set(created.id),
            materials: Set(json!(stored)),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        return match update.update(db).await {
            Ok(a) => (
                StatusCode::CREATED,
                Json(ApiResponse::success(
                    json!(a),
                    "Assignment created successfully",
                )),
            ),
            Err(e) => internal(e),
        };
    }

    (
        StatusCode::CREATED,
        Json(ApiResponse::success(
            json!(created),
            "Assignment created successfully",
        )),
    )
}

/// POST /assignments/{assignment_id}/submissions
///
/// Student-only. Multipart form whose file parts make up the submission.
/// Rejected when the assignment is not published, is not targeted at the
/// student's grade/section, the due date has passed, or the student has
/// already submitted.
///
/// ### Responses
/// - `201 Created` with the new submission
/// - `403 Forbidden` (not a student, not targeted, not open)
/// - `409 Conflict` ("You have already submitted this assignment" /
///   "The submission deadline has passed")
pub async fn submit_assignment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(assignment_id): Path<i64>,
    multipart: Multipart,
) -> impl IntoResponse {
    let Some(db) = state.db() else {
        return degraded_write();
    };

    let student = match require_student_record(db, &claims).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let assignment = match assignment::Entity::find_by_id(assignment_id).one(db).await {
        Ok(Some(a)) => a,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Assignment not found")),
            );
        }
        Err(e) => return internal(e),
    };

    let targeted = match (&student.grade, &student.section) {
        (Some(g), Some(s)) => assignment.is_targeted_at(g, s),
        _ => false,
    };
    if !targeted {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error(
                "This assignment is not addressed to you",
            )),
        );
    }

    let form = match uploads::parse_form(multipart).await {
        Ok(f) => f,
        Err(e) => return upload_error(e),
    };
    if form.files.is_empty() {
        return bad_request("At least one file is required");
    }

    let dir = paths::submission_dir(assignment_id, student.id);
    let stored = match uploads::store_all(&dir, &form) {
        Ok(s) => s,
        Err(e) => return upload_error(e),
    };

    match submission::Model::submit(db, assignment_id, student.id, stored.clone(), Utc::now()).await
    {
        Ok(s) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                json!(s),
                "Assignment submitted successfully",
            )),
        ),
        Err(e) => {
            // A rejected submission (deadline, duplicate, not open) owns no
            // row, so its files must not stay on disk either.
            for f in &stored {
                let _ = std::fs::remove_file(dir.join(&f.filename));
            }
            submission_error(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Claims;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{Request, header::CONTENT_TYPE};
    use chrono::TimeZone;
    use db::models::user::{self, NewUser, Role};
    use db::models::{student, teacher};
    use db::test_utils::setup_test_db;
    use sea_orm::DbConn;
    use serial_test::serial;
    use util::config::AppConfig;

    async fn make_student(db: &DbConn) -> (user::Model, student::Model) {
        let u = user::Model::create(
            db,
            NewUser {
                email: "pupil@example.com".into(),
                password: "secret123".into(),
                name: "Pupil".into(),
                ..Default::default()
            },
            Role::Student,
        )
        .await
        .unwrap();
        let s = student::Model::create(
            db,
            u.id,
            student::NewStudent {
                student_number: "S001".into(),
                grade: Some("10".into()),
                section: Some("A".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        (u, s)
    }

    async fn make_assignment(db: &DbConn, due_year: i32) -> assignment::Model {
        let u = user::Model::create(
            db,
            NewUser {
                email: format!("t{due_year}@example.com"),
                password: "secret123".into(),
                name: "Teacher".into(),
                ..Default::default()
            },
            Role::Teacher,
        )
        .await
        .unwrap();
        let t = teacher::Model::create(db, u.id, &format!("T{due_year}"), None, None)
            .await
            .unwrap();
        assignment::Model::create(
            db,
            t.id,
            NewAssignment {
                title: "Essay".into(),
                description: None,
                subject: None,
                targets: vec![TargetPair {
                    grade: "10".into(),
                    section: "A".into(),
                }],
                due_date: Utc.with_ymd_and_hms(due_year, 1, 10, 23, 59, 59).unwrap(),
                materials: vec![],
            },
        )
        .await
        .unwrap()
    }

    fn student_claims(u: &user::Model) -> AuthUser {
        AuthUser(Claims {
            sub: u.id,
            email: u.email.clone(),
            role: Role::Student,
            exp: (Utc::now().timestamp() + 3600) as usize,
        })
    }

    async fn multipart_with_file(name: &str, content: &[u8]) -> Multipart {
        let boundary = "test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let req = Request::builder()
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(req, &()).await.unwrap()
    }

    fn stored_file_count(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).map(|it| it.count()).unwrap_or(0)
    }

    #[tokio::test]
    #[serial]
    async fn rejected_submissions_leave_no_files_behind() {
        let storage = tempfile::tempdir().unwrap();
        AppConfig::set_storage_root(storage.path().to_string_lossy().to_string());
        AppConfig::set_max_upload_bytes(1024u64);

        let db = setup_test_db().await;
        let state = AppState::with_db(db.clone());
        let (u, s) = make_student(&db).await;
        let past_due = make_assignment(&db, 2020).await;
        let dir = paths::submission_dir(past_due.id, s.id);

        let response = submit_assignment(
            State(state),
            student_claims(&u),
            Path(past_due.id),
            multipart_with_file("essay.pdf", b"%PDF-1.4").await,
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(stored_file_count(&dir), 0);
    }

    #[tokio::test]
    #[serial]
    async fn duplicate_submissions_keep_only_the_first_files() {
        let storage = tempfile::tempdir().unwrap();
        AppConfig::set_storage_root(storage.path().to_string_lossy().to_string());
        AppConfig::set_max_upload_bytes(1024u64);

        let db = setup_test_db().await;
        let state = AppState::with_db(db.clone());
        let (u, s) = make_student(&db).await;
        let open = make_assignment(&db, 2099).await;
        let dir = paths::submission_dir(open.id, s.id);

        let response = submit_assignment(
            State(state.clone()),
            student_claims(&u),
            Path(open.id),
            multipart_with_file("essay.pdf", b"%PDF-1.4").await,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(stored_file_count(&dir), 1);

        let response = submit_assignment(
            State(state),
            student_claims(&u),
            Path(open.id),
            multipart_with_file("second.pdf", b"%PDF-1.4").await,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(stored_file_count(&dir), 1);
    }
}
