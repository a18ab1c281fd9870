use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::QueryFilter;
use serde::{Deserialize, Serialize};

/// Role profile for a teacher, joined 1:1 to a `users` row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teachers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub teacher_number: String,
    pub department: Option<String>,
    pub position: Option<String>,
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

    #[sea_orm(has_many = "super::assignment::Entity")]
    Assignments,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DbConn,
        user_id: i64,
        teacher_number: &str,
        department: Option<String>,
        position: Option<String>,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        let teacher = ActiveModel {
            user_id: Set(user_id),
            teacher_number: Set(teacher_number.to_owned()),
            department: Set(department),
            position: Set(position),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        teacher.insert(db).await
    }

    pub async fn find_by_user_id(db: &DbConn, user_id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .one(db)
            .await
    }

    pub async fn find_by_number(db: &DbConn, teacher_number: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::TeacherNumber.eq(teacher_number))
            .one(db)
            .await
    }
}
