use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{PaginatorTrait, QueryFilter, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::student;

/// A class owns a roster (via `students.class_id`) and a weekly schedule.
///
/// The canonical name is always derived from grade and section, so
/// "Grade 10-A" is the one and only class for grade 10 section A.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub grade: String,
    pub section: String,
    pub academic_year: String,
    pub capacity: i32,
    pub teacher_id: Option<i64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::teacher::Entity",
        from = "Column::TeacherId",
        to = "super::teacher::Column::Id",
        on_delete = "SetNull"
    )]
    Teacher,

    #[sea_orm(has_many = "super::student::Entity")]
    Students,

    #[sea_orm(has_many = "super::class_schedule::Entity")]
    Schedule,
}

impl Related<super::teacher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl Related<super::class_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Roster and schedule failures, mapped to 404/409 by the API layer.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("A class with this name already exists")]
    DuplicateName,
    #[error("Class not found")]
    ClassNotFound,
    #[error("Student not found")]
    StudentNotFound,
    #[error("Student is already assigned to a class")]
    AlreadyAssigned,
    #[error("Class is at full capacity")]
    CapacityReached,
    #[error("Student is not a member of this class")]
    NotAMember,
    #[error("This day and period is already scheduled for the class")]
    SlotTaken,
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Outcome of a bulk roster reassignment.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ReassignSummary {
    pub assigned: u32,
    pub skipped: u32,
}

/// Extracts the bare grade label from either "10" or a composite
/// "Grade 10-A" class name.
pub fn normalize_grade(raw: &str) -> Option<String> {
    let s = raw.trim();
    let s = s
        .strip_prefix("Grade")
        .or_else(|| s.strip_prefix("grade"))
        .unwrap_or(s)
        .trim();
    let s = s.split('-').next().unwrap_or(s).trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Canonical class name for a grade/section pair.
pub fn class_name(grade: &str, section: &str) -> String {
    format!("Grade {}-{}", grade, section)
}

impl Model {
    pub async fn create(
        db: &DbConn,
        grade: &str,
        section: &str,
        academic_year: &str,
        capacity: i32,
        teacher_id: Option<i64>,
    ) -> Result<Model, RosterError> {
        let name = class_name(grade, section);

        if Self::find_by_name(db, &name).await?.is_some() {
            return Err(RosterError::DuplicateName);
        }

        let now = Utc::now();
        let class = ActiveModel {
            name: Set(name),
            grade: Set(grade.to_owned()),
            section: Set(section.to_owned()),
            academic_year: Set(academic_year.to_owned()),
            capacity: Set(capacity),
            teacher_id: Set(teacher_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(class.insert(db).await?)
    }

    pub async fn find_by_name(db: &DbConn, name: &str) -> Result<Option<Model>, DbErr> {
        Entity::find().filter(Column::Name.eq(name)).one(db).await
    }

    /// Looks up the canonical class for a grade/section, creating it with
    /// the given defaults when absent. Used by student onboarding and bulk
    /// reassignment.
    pub async fn find_or_create(
        db: &DbConn,
        grade: &str,
        section: &str,
        academic_year: &str,
        capacity: i32,
    ) -> Result<Model, RosterError> {
        let name = class_name(grade, section);
        if let Some(existing) = Self::find_by_name(db, &name).await? {
            return Ok(existing);
        }
        Self::create(db, grade, section, academic_year, capacity, None).await
    }

    pub async fn member_count(db: &DbConn, class_id: i64) -> Result<u64, DbErr> {
        student::Entity::find()
            .filter(student::Column::ClassId.eq(class_id))
            .count(db)
            .await
    }

    pub async fn roster(db: &DbConn, class_id: i64) -> Result<Vec<student::Model>, DbErr> {
        student::Entity::find()
            .filter(student::Column::ClassId.eq(class_id))
            .all(db)
            .await
    }

    /// Adds a student to the roster.
    ///
    /// Rejected when the student is already in any class (membership is
    /// exclusive) or the class is at capacity. On success the student's
    /// denormalized grade/section are rewritten from the class.
    pub async fn add_student(
        db: &DbConn,
        class_id: i64,
        student_id: i64,
    ) -> Result<student::Model, RosterError> {
        let class = Entity::find_by_id(class_id)
            .one(db)
            .await?
            .ok_or(RosterError::ClassNotFound)?;
        let student = student::Entity::find_by_id(student_id)
            .one(db)
            .await?
            .ok_or(RosterError::StudentNotFound)?;

        if student.class_id.is_some() {
            return Err(RosterError::AlreadyAssigned);
        }

        if Self::member_count(db, class_id).await? >= class.capacity as u64 {
            return Err(RosterError::CapacityReached);
        }

        let update = student::ActiveModel {
            id: Set(student.id),
            class_id: Set(Some(class.id)),
            grade: Set(Some(class.grade.clone())),
            section: Set(Some(class.section.clone())),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        Ok(update.update(db).await?)
    }

    /// Removes a student from the roster, clearing membership and the
    /// denormalized grade/section fields.
    pub async fn remove_student(
        db: &DbConn,
        class_id: i64,
        student_id: i64,
    ) -> Result<student::Model, RosterError> {
        let student = student::Entity::find_by_id(student_id)
            .one(db)
            .await?
            .ok_or(RosterError::StudentNotFound)?;

        if student.class_id != Some(class_id) {
            return Err(RosterError::NotAMember);
        }

        let update = student::ActiveModel {
            id: Set(student.id),
            class_id: Set(None),
            grade: Set(None),
            section: Set(None),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        Ok(update.update(db).await?)
    }

    /// Deletes the class, first clearing every member's membership and
    /// grade/section (schedule slots cascade at the database level).
    pub async fn delete(db: &DbConn, class_id: i64) -> Result<(), RosterError> {
        if Entity::find_by_id(class_id).one(db).await?.is_none() {
            return Err(RosterError::ClassNotFound);
        }

        student::Entity::update_many()
            .col_expr(student::Column::ClassId, Expr::value(Value::BigInt(None)))
            .col_expr(student::Column::Grade, Expr::value(Value::String(None)))
            .col_expr(student::Column::Section, Expr::value(Value::String(None)))
            .filter(student::Column::ClassId.eq(class_id))
            .exec(db)
            .await?;

        Entity::delete_by_id(class_id).exec(db).await?;
        Ok(())
    }

    /// Clears every roster, then re-derives each student's class from
    /// their grade/section fields. Grade labels arriving as "10" or
    /// "Grade 10-A" are normalized first. Missing classes are created;
    /// students whose derived class is full are skipped.
    pub async fn reassign_all(
        db: &DbConn,
        academic_year: &str,
        default_capacity: i32,
    ) -> Result<ReassignSummary, RosterError> {
        student::Entity::update_many()
            .col_expr(student::Column::ClassId, Expr::value(Value::BigInt(None)))
            .exec(db)
            .await?;

        let students = student::Entity::find().all(db).await?;
        let mut summary = ReassignSummary::default();

        for s in students {
            let (Some(raw_grade), Some(section)) = (s.grade.as_deref(), s.section.as_deref())
            else {
                summary.skipped += 1;
                continue;
            };

            let Some(grade) = normalize_grade(raw_grade) else {
                summary.skipped += 1;
                continue;
            };

            let class =
                Self::find_or_create(db, &grade, section, academic_year, default_capacity).await?;

            if Self::member_count(db, class.id).await? >= class.capacity as u64 {
                summary.skipped += 1;
                continue;
            }

            let update = student::ActiveModel {
                id: Set(s.id),
                class_id: Set(Some(class.id)),
                grade: Set(Some(class.grade.clone())),
                section: Set(Some(class.section.clone())),
                updated_at: Set(Utc::now()),
                ..Default::default()
            };
            update.update(db).await?;
            summary.assigned += 1;
        }

        tracing::info!(
            assigned = summary.assigned,
            skipped = summary.skipped,
            "Class reassignment complete"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{self, NewUser, Role};
    use crate::test_utils::setup_test_db;

    async fn make_student(
        db: &DbConn,
        email: &str,
        number: &str,
        grade: Option<&str>,
        section: Option<&str>,
    ) -> student::Model {
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
                grade: grade.map(Into::into),
                section: section.map(Into::into),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    #[test]
    fn normalize_grade_handles_bare_and_composite_labels() {
        assert_eq!(normalize_grade("10"), Some("10".into()));
        assert_eq!(normalize_grade("Grade 10-A"), Some("10".into()));
        assert_eq!(normalize_grade("grade 7"), Some("7".into()));
        assert_eq!(normalize_grade(" Grade 12-B "), Some("12".into()));
        assert_eq!(normalize_grade(""), None);
        assert_eq!(normalize_grade("Grade "), None);
    }

    #[test]
    fn class_name_is_canonical() {
        assert_eq!(class_name("10", "A"), "Grade 10-A");
    }

    #[tokio::test]
    async fn duplicate_class_name_is_rejected() {
        let db = setup_test_db().await;
        Model::create(&db, "10", "A", "2026", 40, None).await.unwrap();

        let err = Model::create(&db, "10", "A", "2026", 40, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RosterError::DuplicateName));
    }

    #[tokio::test]
    async fn roster_respects_capacity() {
        let db = setup_test_db().await;
        let class = Model::create(&db, "10", "A", "2026", 2, None).await.unwrap();

        let s1 = make_student(&db, "s1@example.com", "S001", None, None).await;
        let s2 = make_student(&db, "s2@example.com", "S002", None, None).await;
        let s3 = make_student(&db, "s3@example.com", "S003", None, None).await;

        let s1 = Model::add_student(&db, class.id, s1.id).await.unwrap();
        assert_eq!(s1.class_id, Some(class.id));
        assert_eq!(s1.grade.as_deref(), Some("10"));

        Model::add_student(&db, class.id, s2.id).await.unwrap();
        assert_eq!(Model::member_count(&db, class.id).await.unwrap(), 2);

        let err = Model::add_student(&db, class.id, s3.id).await.unwrap_err();
        assert!(matches!(err, RosterError::CapacityReached));
        assert_eq!(Model::member_count(&db, class.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn student_cannot_join_two_classes() {
        let db = setup_test_db().await;
        let a = Model::create(&db, "10", "A", "2026", 40, None).await.unwrap();
        let b = Model::create(&db, "10", "B", "2026", 40, None).await.unwrap();

        let s = make_student(&db, "s@example.com", "S001", None, None).await;
        Model::add_student(&db, a.id, s.id).await.unwrap();

        let err = Model::add_student(&db, b.id, s.id).await.unwrap_err();
        assert!(matches!(err, RosterError::AlreadyAssigned));
    }

    #[tokio::test]
    async fn removing_a_student_clears_grade_and_section() {
        let db = setup_test_db().await;
        let class = Model::create(&db, "10", "A", "2026", 40, None).await.unwrap();
        let s = make_student(&db, "s@example.com", "S001", None, None).await;

        Model::add_student(&db, class.id, s.id).await.unwrap();
        let removed = Model::remove_student(&db, class.id, s.id).await.unwrap();

        assert_eq!(removed.class_id, None);
        assert_eq!(removed.grade, None);
        assert_eq!(removed.section, None);

        let err = Model::remove_student(&db, class.id, s.id).await.unwrap_err();
        assert!(matches!(err, RosterError::NotAMember));
    }

    #[tokio::test]
    async fn deleting_a_class_clears_members() {
        let db = setup_test_db().await;
        let class = Model::create(&db, "10", "A", "2026", 40, None).await.unwrap();
        let s = make_student(&db, "s@example.com", "S001", None, None).await;
        Model::add_student(&db, class.id, s.id).await.unwrap();

        Model::delete(&db, class.id).await.unwrap();

        let s = student::Entity::find_by_id(s.id).one(&db).await.unwrap().unwrap();
        assert_eq!(s.class_id, None);
        assert_eq!(s.grade, None);
        assert!(Entity::find_by_id(class.id).one(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reassign_normalizes_composite_grade_labels() {
        let db = setup_test_db().await;

        // One student with a bare grade, one with a composite label,
        // one with no grade at all.
        make_student(&db, "a@example.com", "S001", Some("10"), Some("A")).await;
        make_student(&db, "b@example.com", "S002", Some("Grade 10-A"), Some("A")).await;
        make_student(&db, "c@example.com", "S003", None, None).await;

        let summary = Model::reassign_all(&db, "2026", 40).await.unwrap();
        assert_eq!(summary, ReassignSummary { assigned: 2, skipped: 1 });

        let class = Model::find_by_name(&db, "Grade 10-A").await.unwrap().unwrap();
        assert_eq!(Model::member_count(&db, class.id).await.unwrap(), 2);

        // Both members now carry the normalized grade.
        for member in Model::roster(&db, class.id).await.unwrap() {
            assert_eq!(member.grade.as_deref(), Some("10"));
        }
    }

    #[tokio::test]
    async fn reassign_skips_students_when_derived_class_is_full() {
        let db = setup_test_db().await;
        Model::create(&db, "9", "B", "2026", 1, None).await.unwrap();

        make_student(&db, "a@example.com", "S001", Some("9"), Some("B")).await;
        make_student(&db, "b@example.com", "S002", Some("9"), Some("B")).await;

        let summary = Model::reassign_all(&db, "2026", 40).await.unwrap();
        assert_eq!(summary.assigned, 1);
        assert_eq!(summary.skipped, 1);
    }
}
