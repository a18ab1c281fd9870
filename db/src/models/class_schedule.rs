use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};

use super::class::RosterError;

/// One slot in a class's weekly timetable.
///
/// `(class_id, day_of_week, period)` is unique: a class cannot hold two
/// subjects in the same slot.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "class_schedules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_id: i64,
    /// Monday = 1 through Sunday = 7.
    pub day_of_week: i32,
    pub period: i32,
    pub subject: String,
    pub teacher_id: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
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
        belongs_to = "super::teacher::Entity",
        from = "Column::TeacherId",
        to = "super::teacher::Column::Id",
        on_delete = "SetNull"
    )]
    Teacher,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::teacher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fields accepted when adding a timetable slot.
#[derive(Debug, Clone, Default)]
pub struct NewScheduleSlot {
    pub day_of_week: i32,
    pub period: i32,
    pub subject: String,
    pub teacher_id: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl Model {
    pub async fn create(
        db: &DbConn,
        class_id: i64,
        slot: NewScheduleSlot,
    ) -> Result<Model, RosterError> {
        if super::class::Entity::find_by_id(class_id)
            .one(db)
            .await?
            .is_none()
        {
            return Err(RosterError::ClassNotFound);
        }

        let taken = Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::DayOfWeek.eq(slot.day_of_week))
            .filter(Column::Period.eq(slot.period))
            .one(db)
            .await?
            .is_some();
        if taken {
            return Err(RosterError::SlotTaken);
        }

        let now = Utc::now();
        let entry = ActiveModel {
            class_id: Set(class_id),
            day_of_week: Set(slot.day_of_week),
            period: Set(slot.period),
            subject: Set(slot.subject),
            teacher_id: Set(slot.teacher_id),
            start_time: Set(slot.start_time),
            end_time: Set(slot.end_time),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(entry.insert(db).await?)
    }

    /// Full timetable for a class, ordered by day then period.
    pub async fn for_class(db: &DbConn, class_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .order_by_asc(Column::DayOfWeek)
            .order_by_asc(Column::Period)
            .all(db)
            .await
    }

    pub async fn delete(db: &DbConn, slot_id: i64) -> Result<bool, DbErr> {
        let res = Entity::delete_by_id(slot_id).exec(db).await?;
        Ok(res.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::class;
    use crate::test_utils::setup_test_db;

    fn slot(day: i32, period: i32, subject: &str) -> NewScheduleSlot {
        NewScheduleSlot {
            day_of_week: day,
            period,
            subject: subject.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn duplicate_slot_is_rejected() {
        let db = setup_test_db().await;
        let class = class::Model::create(&db, "10", "A", "2026", 40, None)
            .await
            .unwrap();

        Model::create(&db, class.id, slot(1, 1, "Mathematics"))
            .await
            .unwrap();

        let err = Model::create(&db, class.id, slot(1, 1, "Physics"))
            .await
            .unwrap_err();
        assert!(matches!(err, RosterError::SlotTaken));

        // Another period on the same day is fine.
        Model::create(&db, class.id, slot(1, 2, "Physics"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn timetable_is_ordered_by_day_then_period() {
        let db = setup_test_db().await;
        let class = class::Model::create(&db, "10", "A", "2026", 40, None)
            .await
            .unwrap();

        Model::create(&db, class.id, slot(2, 1, "History")).await.unwrap();
        Model::create(&db, class.id, slot(1, 3, "English")).await.unwrap();
        Model::create(&db, class.id, slot(1, 1, "Mathematics")).await.unwrap();

        let timetable = Model::for_class(&db, class.id).await.unwrap();
        let subjects: Vec<&str> = timetable.iter().map(|s| s.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Mathematics", "English", "History"]);
    }

    #[tokio::test]
    async fn unknown_class_is_rejected() {
        let db = setup_test_db().await;
        let err = Model::create(&db, 999, slot(1, 1, "Mathematics"))
            .await
            .unwrap_err();
        assert!(matches!(err, RosterError::ClassNotFound));
    }
}
