use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};

use super::class::RosterError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,
    #[sea_orm(string_value = "absent")]
    Absent,
    #[sea_orm(string_value = "late")]
    Late,
}

/// One attendance mark. `(class_id, student_id, date)` is unique;
/// re-marking the same day overwrites the earlier status.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_id: i64,
    pub student_id: i64,
    pub date: Date,
    pub status: AttendanceStatus,
    pub recorded_by: Option<i64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id",
        on_delete = "Cascade"
    )]
    Class,

    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Marks attendance for one student on one day, overwriting any
    /// earlier mark for the same class/student/date.
    pub async fn record(
        db: &DbConn,
        class_id: i64,
        student_id: i64,
        date: Date,
        status: AttendanceStatus,
        recorded_by: Option<i64>,
    ) -> Result<Model, RosterError> {
        if super::class::Entity::find_by_id(class_id)
            .one(db)
            .await?
            .is_none()
        {
            return Err(RosterError::ClassNotFound);
        }
        if super::student::Entity::find_by_id(student_id)
            .one(db)
            .await?
            .is_none()
        {
            return Err(RosterError::StudentNotFound);
        }

        let now = Utc::now();
        let existing = Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Date.eq(date))
            .one(db)
            .await?;

        if let Some(row) = existing {
            let update = ActiveModel {
                id: Set(row.id),
                status: Set(status),
                recorded_by: Set(recorded_by),
                updated_at: Set(now),
                ..Default::default()
            };
            return Ok(update.update(db).await?);
        }

        let mark = ActiveModel {
            class_id: Set(class_id),
            student_id: Set(student_id),
            date: Set(date),
            status: Set(status),
            recorded_by: Set(recorded_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(mark.insert(db).await?)
    }

    /// A class's marks for one day.
    pub async fn for_class_on(
        db: &DbConn,
        class_id: i64,
        date: Date,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::Date.eq(date))
            .all(db)
            .await
    }

    /// A student's attendance history, most recent first.
    pub async fn for_student(db: &DbConn, student_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::Date)
            .all(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{self, NewUser, Role};
    use crate::models::{class, student};
    use crate::test_utils::setup_test_db;
    use chrono::NaiveDate;

    async fn setup(db: &DbConn) -> (class::Model, student::Model) {
        let class = class::Model::create(db, "10", "A", "2026", 40, None)
            .await
            .unwrap();
        let u = user::Model::create(
            db,
            NewUser {
                email: "s@example.com".into(),
                password: "secret123".into(),
                name: "Student".into(),
                ..Default::default()
            },
            Role::Student,
        )
        .await
        .unwrap();
        let student = student::Model::create(
            db,
            u.id,
            student::NewStudent {
                student_number: "S001".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        (class, student)
    }

    #[tokio::test]
    async fn remarking_the_same_day_overwrites() {
        let db = setup_test_db().await;
        let (class, student) = setup(&db).await;
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        let first = Model::record(&db, class.id, student.id, day, AttendanceStatus::Absent, None)
            .await
            .unwrap();
        assert_eq!(first.status, AttendanceStatus::Absent);

        let second = Model::record(&db, class.id, student.id, day, AttendanceStatus::Late, None)
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.status, AttendanceStatus::Late);

        assert_eq!(Model::for_class_on(&db, class.id, day).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn history_is_ordered_most_recent_first() {
        let db = setup_test_db().await;
        let (class, student) = setup(&db).await;

        for (d, status) in [
            (1, AttendanceStatus::Present),
            (3, AttendanceStatus::Absent),
            (2, AttendanceStatus::Present),
        ] {
            let day = NaiveDate::from_ymd_opt(2026, 3, d).unwrap();
            Model::record(&db, class.id, student.id, day, status, None)
                .await
                .unwrap();
        }

        let history = Model::for_student(&db, student.id).await.unwrap();
        let days: Vec<u32> = history.iter().map(|r| {
            use chrono::Datelike;
            r.date.day()
        }).collect();
        assert_eq!(days, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn unknown_class_or_student_is_rejected() {
        let db = setup_test_db().await;
        let (class, student) = setup(&db).await;
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        let err = Model::record(&db, 999, student.id, day, AttendanceStatus::Present, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RosterError::ClassNotFound));

        let err = Model::record(&db, class.id, 999, day, AttendanceStatus::Present, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RosterError::StudentNotFound));
    }
}
