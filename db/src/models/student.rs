use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::QueryFilter;
use serde::{Deserialize, Serialize};

/// Role profile for a student, joined 1:1 to a `users` row.
///
/// `class_id` is the class-roster membership: a student belongs to at most
/// one class by construction. `grade` and `section` are denormalized copies
/// kept in sync by the roster operations in [`super::class`].
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub student_number: String,
    pub grade: Option<String>,
    pub section: Option<String>,
    pub class_id: Option<i64>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub admission_date: Option<Date>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id",
        on_delete = "SetNull"
    )]
    Class,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Student-specific registration fields.
#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    pub student_number: String,
    pub grade: Option<String>,
    pub section: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub admission_date: Option<Date>,
}

impl Model {
    pub async fn create(db: &DbConn, user_id: i64, new: NewStudent) -> Result<Model, DbErr> {
        let now = Utc::now();
        let student = ActiveModel {
            user_id: Set(user_id),
            student_number: Set(new.student_number),
            grade: Set(new.grade),
            section: Set(new.section),
            class_id: Set(None),
            guardian_name: Set(new.guardian_name),
            guardian_phone: Set(new.guardian_phone),
            admission_date: Set(new.admission_date),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        student.insert(db).await
    }

    pub async fn find_by_user_id(db: &DbConn, user_id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .one(db)
            .await
    }

    pub async fn find_by_number(db: &DbConn, student_number: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::StudentNumber.eq(student_number))
            .one(db)
            .await
    }
}
