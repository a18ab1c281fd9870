use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::class::normalize_grade;

/// Lifecycle of an assignment. Handlers publish on create; draft exists
/// for teachers who stage work before releasing it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "published")]
    Published,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "archived")]
    Archived,
}

/// Metadata for one stored upload (material or submission file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
}

/// One grade/section audience pair an assignment is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPair {
    pub grade: String,
    pub section: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub teacher_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub subject: Option<String>,
    /// JSON array of [`TargetPair`].
    pub targets: Json,
    pub due_date: DateTimeUtc,
    /// JSON array of [`StoredFile`].
    pub materials: Json,
    pub status: AssignmentStatus,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::teacher::Entity",
        from = "Column::TeacherId",
        to = "super::teacher::Column::Id",
        on_delete = "Cascade"
    )]
    Teacher,

    #[sea_orm(has_many = "super::submission::Entity")]
    Submissions,
}

impl Related<super::teacher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("Assignment not found")]
    NotFound,
    #[error("Invalid status transition")]
    InvalidTransition,
    #[error("Only the authoring teacher may modify this assignment")]
    NotOwner,
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Fields accepted when a teacher creates an assignment.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub title: String,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub targets: Vec<TargetPair>,
    pub due_date: DateTimeUtc,
    pub materials: Vec<StoredFile>,
}

impl Model {
    /// Creates and immediately publishes an assignment.
    pub async fn create(
        db: &DbConn,
        teacher_id: i64,
        new: NewAssignment,
    ) -> Result<Model, AssignmentError> {
        let now = Utc::now();
        let assignment = ActiveModel {
            teacher_id: Set(teacher_id),
            title: Set(new.title),
            description: Set(new.description),
            subject: Set(new.subject),
            targets: Set(serde_json::json!(new.targets)),
            due_date: Set(new.due_date),
            materials: Set(serde_json::json!(new.materials)),
            status: Set(AssignmentStatus::Published),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(assignment.insert(db).await?)
    }

    pub fn target_pairs(&self) -> Vec<TargetPair> {
        serde_json::from_value(self.targets.clone()).unwrap_or_default()
    }

    pub fn material_files(&self) -> Vec<StoredFile> {
        serde_json::from_value(self.materials.clone()).unwrap_or_default()
    }

    /// Whether a student with this grade/section is in the audience.
    ///
    /// Grades are normalized (so "Grade 10-A" matches a target grade of
    /// "10") and sections compare case-insensitively.
    pub fn is_targeted_at(&self, grade: &str, section: &str) -> bool {
        let Some(grade) = normalize_grade(grade) else {
            return false;
        };
        self.target_pairs().iter().any(|t| {
            normalize_grade(&t.grade).as_deref() == Some(grade.as_str())
                && t.section.eq_ignore_ascii_case(section)
        })
    }

    /// Applies a status transition: draft → published → completed or
    /// archived. Anything else is rejected.
    pub async fn set_status(
        db: &DbConn,
        assignment_id: i64,
        next: AssignmentStatus,
    ) -> Result<Model, AssignmentError> {
        let current = Entity::find_by_id(assignment_id)
            .one(db)
            .await?
            .ok_or(AssignmentError::NotFound)?;

        let allowed = matches!(
            (current.status, next),
            (AssignmentStatus::Draft, AssignmentStatus::Published)
                | (AssignmentStatus::Published, AssignmentStatus::Completed)
                | (AssignmentStatus::Published, AssignmentStatus::Archived)
        );
        if !allowed {
            return Err(AssignmentError::InvalidTransition);
        }

        let update = ActiveModel {
            id: Set(assignment_id),
            status: Set(next),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        Ok(update.update(db).await?)
    }

    /// Assignments authored by one teacher, newest first.
    pub async fn for_teacher(db: &DbConn, teacher_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .order_by_desc(Column::CreatedAt)
            .all(db)
            .await
    }

    /// Published assignments targeted at a student's grade/section.
    ///
    /// Target pairs live in a JSON column, so audience matching happens
    /// in memory after narrowing to published rows.
    pub async fn for_student(
        db: &DbConn,
        grade: &str,
        section: &str,
    ) -> Result<Vec<Model>, DbErr> {
        let published = Entity::find()
            .filter(Column::Status.eq(AssignmentStatus::Published))
            .order_by_desc(Column::CreatedAt)
            .all(db)
            .await?;

        Ok(published
            .into_iter()
            .filter(|a| a.is_targeted_at(grade, section))
            .collect())
    }

    /// All assignments, optionally narrowed by status. Admin view.
    pub async fn all(db: &DbConn, status: Option<AssignmentStatus>) -> Result<Vec<Model>, DbErr> {
        let mut query = Entity::find().order_by_desc(Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(Column::Status.eq(status));
        }
        query.all(db).await
    }

    /// Deletes an assignment (submissions cascade). Only the authoring
    /// teacher may delete.
    pub async fn delete(
        db: &DbConn,
        assignment_id: i64,
        teacher_id: i64,
    ) -> Result<(), AssignmentError> {
        let assignment = Entity::find_by_id(assignment_id)
            .one(db)
            .await?
            .ok_or(AssignmentError::NotFound)?;

        if assignment.teacher_id != teacher_id {
            return Err(AssignmentError::NotOwner);
        }

        Entity::delete_by_id(assignment_id).exec(db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::teacher;
    use crate::models::user::{self, NewUser, Role};
    use crate::test_utils::setup_test_db;
    use chrono::TimeZone;

    async fn make_teacher(db: &DbConn, email: &str, number: &str) -> teacher::Model {
        let u = user::Model::create(
            db,
            NewUser {
                email: email.into(),
                password: "secret123".into(),
                name: email.into(),
                ..Default::default()
            },
            Role::Teacher,
        )
        .await
        .unwrap();
        teacher::Model::create(db, u.id, number, None, None)
            .await
            .unwrap()
    }

    fn new_assignment(title: &str, targets: Vec<(&str, &str)>) -> NewAssignment {
        NewAssignment {
            title: title.into(),
            description: None,
            subject: Some("Mathematics".into()),
            targets: targets
                .into_iter()
                .map(|(g, s)| TargetPair {
                    grade: g.into(),
                    section: s.into(),
                })
                .collect(),
            due_date: Utc.with_ymd_and_hms(2026, 1, 10, 23, 59, 59).unwrap(),
            materials: vec![],
        }
    }

    #[tokio::test]
    async fn create_publishes_immediately() {
        let db = setup_test_db().await;
        let t = make_teacher(&db, "t@example.com", "T001").await;

        let mut new = new_assignment("Algebra homework", vec![("10", "A")]);
        new.materials = vec![StoredFile {
            filename: "9a1b.pdf".into(),
            original_name: "worksheet.pdf".into(),
            mime_type: "application/pdf".into(),
            size: 1024,
        }];

        let a = Model::create(&db, t.id, new).await.unwrap();
        assert_eq!(a.status, AssignmentStatus::Published);
        assert_eq!(a.target_pairs().len(), 1);
        assert_eq!(a.material_files()[0].original_name, "worksheet.pdf");
    }

    #[tokio::test]
    async fn audience_matching_normalizes_grades() {
        let db = setup_test_db().await;
        let t = make_teacher(&db, "t@example.com", "T001").await;
        let a = Model::create(&db, t.id, new_assignment("Essay", vec![("10", "A")]))
            .await
            .unwrap();

        assert!(a.is_targeted_at("10", "A"));
        assert!(a.is_targeted_at("Grade 10-A", "a"));
        assert!(!a.is_targeted_at("10", "B"));
        assert!(!a.is_targeted_at("11", "A"));
    }

    #[tokio::test]
    async fn student_listing_is_scoped_to_published_and_targeted() {
        let db = setup_test_db().await;
        let t = make_teacher(&db, "t@example.com", "T001").await;

        let visible = Model::create(&db, t.id, new_assignment("For 10-A", vec![("10", "A")]))
            .await
            .unwrap();
        let other = Model::create(&db, t.id, new_assignment("For 11-B", vec![("11", "B")]))
            .await
            .unwrap();
        Model::set_status(&db, other.id, AssignmentStatus::Archived)
            .await
            .unwrap();

        let listed = Model::for_student(&db, "10", "A").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, visible.id);

        assert!(Model::for_student(&db, "11", "B").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_transitions_follow_the_lifecycle() {
        let db = setup_test_db().await;
        let t = make_teacher(&db, "t@example.com", "T001").await;
        let a = Model::create(&db, t.id, new_assignment("Quiz", vec![("10", "A")]))
            .await
            .unwrap();

        // Published → Completed is allowed; Completed → Published is not.
        let a = Model::set_status(&db, a.id, AssignmentStatus::Completed)
            .await
            .unwrap();
        assert_eq!(a.status, AssignmentStatus::Completed);

        let err = Model::set_status(&db, a.id, AssignmentStatus::Published)
            .await
            .unwrap_err();
        assert!(matches!(err, AssignmentError::InvalidTransition));
    }

    #[tokio::test]
    async fn only_the_author_may_delete() {
        let db = setup_test_db().await;
        let author = make_teacher(&db, "a@example.com", "T001").await;
        let other = make_teacher(&db, "b@example.com", "T002").await;

        let a = Model::create(&db, author.id, new_assignment("Quiz", vec![("10", "A")]))
            .await
            .unwrap();

        let err = Model::delete(&db, a.id, other.id).await.unwrap_err();
        assert!(matches!(err, AssignmentError::NotOwner));

        Model::delete(&db, a.id, author.id).await.unwrap();
        assert!(matches!(
            Model::delete(&db, a.id, author.id).await.unwrap_err(),
            AssignmentError::NotFound
        ));
    }
}
