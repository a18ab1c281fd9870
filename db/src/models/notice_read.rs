use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder, SqlErr};
use serde::{Deserialize, Serialize};

/// A read receipt. `(notice_id, user_id)` is unique, so receipts are
/// recorded at most once per reader.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notice_reads")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub notice_id: i64,
    pub user_id: i64,
    pub read_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::notice::Entity",
        from = "Column::NoticeId",
        to = "super::notice::Column::Id",
        on_delete = "Cascade"
    )]
    Notice,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::notice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notice.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Inserts a receipt if none exists. Returns whether a new receipt
    /// was recorded.
    ///
    /// The unique `(notice_id, user_id)` index is the arbiter: inserting
    /// straight away and mapping the constraint violation keeps two
    /// concurrent first reads from turning one of them into an error.
    pub async fn record(db: &DbConn, notice_id: i64, user_id: i64) -> Result<bool, DbErr> {
        let receipt = ActiveModel {
            notice_id: Set(notice_id),
            user_id: Set(user_id),
            read_at: Set(Utc::now()),
            ..Default::default()
        };
        match receipt.insert(db).await {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn for_notice(db: &DbConn, notice_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::NoticeId.eq(notice_id))
            .order_by_asc(Column::ReadAt)
            .all(db)
            .await
    }

    pub async fn has_read(db: &DbConn, notice_id: i64, user_id: i64) -> Result<bool, DbErr> {
        Ok(Entity::find()
            .filter(Column::NoticeId.eq(notice_id))
            .filter(Column::UserId.eq(user_id))
            .one(db)
            .await?
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notice::{Audience, NewNotice, NoticeStatus};
    use crate::models::user::{NewUser, Role};
    use crate::models::{admin, notice, user};
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn duplicate_receipts_resolve_to_false_not_an_error() {
        let db = setup_test_db().await;

        let admin_user = user::Model::create(
            &db,
            NewUser {
                email: "admin@example.com".into(),
                password: "secret123".into(),
                name: "Admin".into(),
                ..Default::default()
            },
            Role::Admin,
        )
        .await
        .unwrap();
        let admin = admin::Model::create(&db, admin_user.id, "A001", &[])
            .await
            .unwrap();
        let reader = user::Model::create(
            &db,
            NewUser {
                email: "s1@example.com".into(),
                password: "secret123".into(),
                name: "Reader".into(),
                ..Default::default()
            },
            Role::Student,
        )
        .await
        .unwrap();

        let notice = notice::Model::create(
            &db,
            admin.id,
            NewNotice {
                title: "Sports day".into(),
                content: "The annual sports day is on Friday.".into(),
                audience: Audience::All,
                target_grades: vec![],
                status: NoticeStatus::Published,
                publish_at: None,
                expires_at: None,
            },
        )
        .await
        .unwrap();

        // The second insert hits the unique index, not the error path.
        assert!(Model::record(&db, notice.id, reader.id).await.unwrap());
        assert!(!Model::record(&db, notice.id, reader.id).await.unwrap());

        assert_eq!(Model::for_notice(&db, notice.id).await.unwrap().len(), 1);
    }
}
