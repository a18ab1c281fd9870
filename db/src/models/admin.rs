use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::QueryFilter;
use serde::{Deserialize, Serialize};

/// Role profile for an administrator, joined 1:1 to a `users` row.
///
/// `permissions` is a JSON array of free-form capability strings
/// (e.g. `"manage_users"`, `"publish_notices"`).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admins")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub admin_number: String,
    pub permissions: Json,
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

    #[sea_orm(has_many = "super::notice::Entity")]
    Notices,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::notice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DbConn,
        user_id: i64,
        admin_number: &str,
        permissions: &[String],
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        let admin = ActiveModel {
            user_id: Set(user_id),
            admin_number: Set(admin_number.to_owned()),
            permissions: Set(serde_json::json!(permissions)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        admin.insert(db).await
    }

    pub async fn find_by_user_id(db: &DbConn, user_id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .one(db)
            .await
    }

    pub async fn find_by_number(db: &DbConn, admin_number: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::AdminNumber.eq(admin_number))
            .one(db)
            .await
    }

}
