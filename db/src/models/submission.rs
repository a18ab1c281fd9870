use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::assignment::{self, AssignmentStatus, StoredFile};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "graded")]
    Graded,
    #[sea_orm(string_value = "returned")]
    Returned,
}

/// A student's response to an assignment.
///
/// `(assignment_id, student_id)` is unique: a student submits at most
/// once per assignment.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    /// JSON array of [`StoredFile`].
    pub files: Json,
    pub status: SubmissionStatus,
    pub marks: Option<i32>,
    pub feedback: Option<String>,
    pub graded_by: Option<i64>,
    pub graded_at: Option<DateTimeUtc>,
    pub submitted_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignment::Entity",
        from = "Column::AssignmentId",
        to = "super::assignment::Column::Id",
        on_delete = "Cascade"
    )]
    Assignment,

    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Assignment not found")]
    AssignmentNotFound,
    #[error("This assignment is not open for submissions")]
    NotOpen,
    #[error("The submission deadline has passed")]
    DeadlinePassed,
    #[error("You have already submitted this assignment")]
    AlreadySubmitted,
    #[error("Submission not found")]
    NotFound,
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl Model {
    /// Records a student's submission.
    ///
    /// `now` is passed by the caller so deadline behavior can be driven
    /// from a fixed clock in tests.
    pub async fn submit(
        db: &DbConn,
        assignment_id: i64,
        student_id: i64,
        files: Vec<StoredFile>,
        now: DateTimeUtc,
    ) -> Result<Model, SubmissionError> {
        let assignment = assignment::Entity::find_by_id(assignment_id)
            .one(db)
            .await?
            .ok_or(SubmissionError::AssignmentNotFound)?;

        if assignment.status != AssignmentStatus::Published {
            return Err(SubmissionError::NotOpen);
        }
        if now > assignment.due_date {
            return Err(SubmissionError::DeadlinePassed);
        }

        let existing = Entity::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::StudentId.eq(student_id))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(SubmissionError::AlreadySubmitted);
        }

        let submission = ActiveModel {
            assignment_id: Set(assignment_id),
            student_id: Set(student_id),
            files: Set(serde_json::json!(files)),
            status: Set(SubmissionStatus::Submitted),
            marks: Set(None),
            feedback: Set(None),
            graded_by: Set(None),
            graded_at: Set(None),
            submitted_at: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(submission.insert(db).await?)
    }

    /// Records a grade against an existing submission.
    pub async fn grade(
        db: &DbConn,
        submission_id: i64,
        marks: i32,
        feedback: Option<String>,
        graded_by: i64,
        now: DateTimeUtc,
    ) -> Result<Model, SubmissionError> {
        if Entity::find_by_id(submission_id).one(db).await?.is_none() {
            return Err(SubmissionError::NotFound);
        }

        let update = ActiveModel {
            id: Set(submission_id),
            status: Set(SubmissionStatus::Graded),
            marks: Set(Some(marks)),
            feedback: Set(feedback),
            graded_by: Set(Some(graded_by)),
            graded_at: Set(Some(now)),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(update.update(db).await?)
    }

    pub fn submitted_files(&self) -> Vec<StoredFile> {
        serde_json::from_value(self.files.clone()).unwrap_or_default()
    }

    pub async fn count_for_assignment(db: &DbConn, assignment_id: i64) -> Result<u64, DbErr> {
        use sea_orm::PaginatorTrait;
        Entity::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .count(db)
            .await
    }

    pub async fn for_assignment(db: &DbConn, assignment_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .order_by_asc(Column::SubmittedAt)
            .all(db)
            .await
    }

    pub async fn find_for_student(
        db: &DbConn,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::StudentId.eq(student_id))
            .one(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignment::{NewAssignment, TargetPair};
    use crate::models::user::{self, NewUser, Role};
    use crate::models::{student, teacher};
    use crate::test_utils::setup_test_db;
    use chrono::{TimeZone, Utc};

    async fn make_teacher(db: &DbConn) -> teacher::Model {
        let u = user::Model::create(
            db,
            NewUser {
                email: "t@example.com".into(),
                password: "secret123".into(),
                name: "Teacher".into(),
                ..Default::default()
            },
            Role::Teacher,
        )
        .await
        .unwrap();
        teacher::Model::create(db, u.id, "T001", None, None)
            .await
            .unwrap()
    }

    async fn make_student(db: &DbConn, email: &str, number: &str) -> student::Model {
        let u = user::Model::create(
            db,
            NewUser {
                email: email.into(),
                password: "secret123".into(),
                name: email.into(),
                ..Default::default()
            },
            Role::Student,
        )
        .await
        .unwrap();
        student::Model::create(
            db,
            u.id,
            student::NewStudent {
                student_number: number.into(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    async fn make_assignment(db: &DbConn, teacher_id: i64) -> assignment::Model {
        assignment::Model::create(
            db,
            teacher_id,
            NewAssignment {
                title: "Essay".into(),
                description: None,
                subject: None,
                targets: vec![TargetPair {
                    grade: "10".into(),
                    section: "A".into(),
                }],
                due_date: Utc.with_ymd_and_hms(2025, 1, 10, 23, 59, 59).unwrap(),
                materials: vec![],
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn deadline_and_duplicate_rules() {
        let db = setup_test_db().await;
        let t = make_teacher(&db).await;
        let a = make_assignment(&db, t.id).await;
        let x = make_student(&db, "x@example.com", "S001").await;
        let y = make_student(&db, "y@example.com", "S002").await;

        let before_due = Utc.with_ymd_and_hms(2025, 1, 9, 12, 0, 0).unwrap();
        let after_due = Utc.with_ymd_and_hms(2025, 1, 11, 12, 0, 0).unwrap();

        // First submission before the deadline is accepted.
        let files = vec![StoredFile {
            filename: "3f2c.pdf".into(),
            original_name: "essay.pdf".into(),
            mime_type: "application/pdf".into(),
            size: 2048,
        }];
        let sub = Model::submit(&db, a.id, x.id, files, before_due).await.unwrap();
        assert_eq!(sub.status, SubmissionStatus::Submitted);
        assert_eq!(sub.submitted_files()[0].original_name, "essay.pdf");

        // A second attempt by the same student is rejected.
        let err = Model::submit(&db, a.id, x.id, vec![], before_due)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You have already submitted this assignment");

        // A first-time submission after the deadline is rejected.
        let err = Model::submit(&db, a.id, y.id, vec![], after_due)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "The submission deadline has passed");

        assert_eq!(Model::count_for_assignment(&db, a.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn grading_requires_an_existing_submission() {
        let db = setup_test_db().await;
        let t = make_teacher(&db).await;
        let a = make_assignment(&db, t.id).await;
        let s = make_student(&db, "x@example.com", "S001").await;

        let now = Utc.with_ymd_and_hms(2025, 1, 9, 12, 0, 0).unwrap();

        let err = Model::grade(&db, 999, 80, None, t.id, now).await.unwrap_err();
        assert!(matches!(err, SubmissionError::NotFound));

        let sub = Model::submit(&db, a.id, s.id, vec![], now).await.unwrap();
        let graded = Model::grade(&db, sub.id, 85, Some("Well argued".into()), t.id, now)
            .await
            .unwrap();

        assert_eq!(graded.status, SubmissionStatus::Graded);
        assert_eq!(graded.marks, Some(85));
        assert_eq!(graded.feedback.as_deref(), Some("Well argued"));
        assert_eq!(graded.graded_by, Some(t.id));
        assert!(graded.graded_at.is_some());
    }

    #[tokio::test]
    async fn archived_assignments_are_closed() {
        let db = setup_test_db().await;
        let t = make_teacher(&db).await;
        let a = make_assignment(&db, t.id).await;
        let s = make_student(&db, "x@example.com", "S001").await;

        assignment::Model::set_status(&db, a.id, assignment::AssignmentStatus::Archived)
            .await
            .unwrap();

        let now = Utc.with_ymd_and_hms(2025, 1, 9, 12, 0, 0).unwrap();
        let err = Model::submit(&db, a.id, s.id, vec![], now).await.unwrap_err();
        assert!(matches!(err, SubmissionError::NotOpen));
    }
}
