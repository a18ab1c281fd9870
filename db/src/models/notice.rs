use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::class::normalize_grade;
use super::notice_read;
use super::user::{self, Role};

/// Audience-selection rule for a notice.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    #[sea_orm(string_value = "all")]
    All,
    #[sea_orm(string_value = "students")]
    Students,
    #[sea_orm(string_value = "teachers")]
    Teachers,
    #[sea_orm(string_value = "specific_grade")]
    SpecificGrade,
    #[sea_orm(string_value = "specific_class")]
    SpecificClass,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum NoticeStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "published")]
    Published,
    #[sea_orm(string_value = "archived")]
    Archived,
}

/// A broadcast notice with read-receipt analytics.
///
/// `total_reach` is computed once at creation from the audience rule;
/// `read_count` accumulates monotonically as users mark the notice read.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub admin_id: i64,
    pub title: String,
    pub content: String,
    pub audience: Audience,
    /// JSON array of grade labels, used when audience is `specific_grade`
    /// or `specific_class`.
    pub target_grades: Json,
    pub status: NoticeStatus,
    pub publish_at: Option<DateTimeUtc>,
    pub expires_at: Option<DateTimeUtc>,
    pub total_reach: i64,
    pub read_count: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::admin::Entity",
        from = "Column::AdminId",
        to = "super::admin::Column::Id",
        on_delete = "Cascade"
    )]
    Admin,

    #[sea_orm(has_many = "super::notice_read::Entity")]
    Reads,
}

impl Related<super::admin::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Admin.def()
    }
}

impl Related<super::notice_read::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reads.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Error)]
pub enum NoticeError {
    #[error("Notice not found")]
    NotFound,
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Fields accepted when an admin creates a notice.
#[derive(Debug, Clone)]
pub struct NewNotice {
    pub title: String,
    pub content: String,
    pub audience: Audience,
    pub target_grades: Vec<String>,
    pub status: NoticeStatus,
    pub publish_at: Option<DateTimeUtc>,
    pub expires_at: Option<DateTimeUtc>,
}

impl Model {
    /// Counts the audience reached by a targeting rule.
    ///
    /// Grade-scoped rules count all active students; per-grade filtering
    /// happens at read time, so the reach figure is an upper bound there.
    pub async fn compute_reach(db: &DbConn, audience: Audience) -> Result<u64, DbErr> {
        let role = match audience {
            Audience::All => None,
            Audience::Students | Audience::SpecificGrade | Audience::SpecificClass => {
                Some(Role::Student)
            }
            Audience::Teachers => Some(Role::Teacher),
        };
        user::Model::count_active_by_role(db, role).await
    }

    pub async fn create(db: &DbConn, admin_id: i64, new: NewNotice) -> Result<Model, NoticeError> {
        let reach = Self::compute_reach(db, new.audience).await?;

        let now = Utc::now();
        let notice = ActiveModel {
            admin_id: Set(admin_id),
            title: Set(new.title),
            content: Set(new.content),
            audience: Set(new.audience),
            target_grades: Set(serde_json::json!(new.target_grades)),
            status: Set(new.status),
            publish_at: Set(new.publish_at),
            expires_at: Set(new.expires_at),
            total_reach: Set(reach as i64),
            read_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(notice.insert(db).await?)
    }

    pub fn grade_list(&self) -> Vec<String> {
        serde_json::from_value(self.target_grades.clone()).unwrap_or_default()
    }

    /// Whether a student in this grade is part of the audience.
    pub fn reaches_grade(&self, grade: &str) -> bool {
        match self.audience {
            Audience::All | Audience::Students => true,
            Audience::Teachers => false,
            Audience::SpecificGrade | Audience::SpecificClass => {
                let Some(grade) = normalize_grade(grade) else {
                    return false;
                };
                self.grade_list()
                    .iter()
                    .any(|g| normalize_grade(g).as_deref() == Some(grade.as_str()))
            }
        }
    }

    /// Percentage of the reached audience that has read the notice.
    pub fn read_percentage(&self) -> u32 {
        if self.total_reach <= 0 {
            return 0;
        }
        ((self.read_count as f64 / self.total_reach as f64) * 100.0).round() as u32
    }

    /// Records a read receipt. Idempotent: a second call by the same user
    /// leaves `read_count` unchanged.
    pub async fn mark_read(db: &DbConn, notice_id: i64, user_id: i64) -> Result<Model, NoticeError> {
        let notice = Entity::find_by_id(notice_id)
            .one(db)
            .await?
            .ok_or(NoticeError::NotFound)?;

        if !notice_read::Model::record(db, notice_id, user_id).await? {
            return Ok(notice);
        }

        let update = ActiveModel {
            id: Set(notice_id),
            read_count: Set(notice.read_count + 1),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        Ok(update.update(db).await?)
    }

    /// Published notices visible to a student in the given grade.
    pub async fn for_student_grade(db: &DbConn, grade: &str) -> Result<Vec<Model>, DbErr> {
        let published = Entity::find()
            .filter(Column::Status.eq(NoticeStatus::Published))
            .order_by_desc(Column::CreatedAt)
            .all(db)
            .await?;

        Ok(published
            .into_iter()
            .filter(|n| n.reaches_grade(grade))
            .collect())
    }

    /// Published notices visible to teachers.
    pub async fn for_teachers(db: &DbConn) -> Result<Vec<Model>, DbErr> {
        let published = Entity::find()
            .filter(Column::Status.eq(NoticeStatus::Published))
            .order_by_desc(Column::CreatedAt)
            .all(db)
            .await?;

        Ok(published
            .into_iter()
            .filter(|n| matches!(n.audience, Audience::All | Audience::Teachers))
            .collect())
    }

    /// All notices regardless of status, optionally narrowed. Admin view.
    pub async fn for_admin(db: &DbConn, status: Option<NoticeStatus>) -> Result<Vec<Model>, DbErr> {
        let mut query = Entity::find().order_by_desc(Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(Column::Status.eq(status));
        }
        query.all(db).await
    }

    pub async fn receipts(db: &DbConn, notice_id: i64) -> Result<Vec<notice_read::Model>, DbErr> {
        notice_read::Model::for_notice(db, notice_id).await
    }

    pub async fn delete(db: &DbConn, notice_id: i64) -> Result<(), NoticeError> {
        let res = Entity::delete_by_id(notice_id).exec(db).await?;
        if res.rows_affected == 0 {
            return Err(NoticeError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::admin;
    use crate::models::user::{self, NewUser, Role};
    use crate::test_utils::setup_test_db;

    async fn make_user(db: &DbConn, email: &str, role: Role) -> user::Model {
        user::Model::create(
            db,
            NewUser {
                email: email.into(),
                password: "secret123".into(),
                name: email.into(),
                ..Default::default()
            },
            role,
        )
        .await
        .unwrap()
    }

    async fn make_admin(db: &DbConn) -> admin::Model {
        let u = make_user(db, "admin@example.com", Role::Admin).await;
        admin::Model::create(db, u.id, "A001", &["publish_notices".into()])
            .await
            .unwrap()
    }

    fn new_notice(audience: Audience, grades: Vec<&str>) -> NewNotice {
        NewNotice {
            title: "Sports day".into(),
            content: "The annual sports day is on Friday.".into(),
            audience,
            target_grades: grades.into_iter().map(Into::into).collect(),
            status: NoticeStatus::Published,
            publish_at: None,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn reach_counts_the_targeted_roles() {
        let db = setup_test_db().await;
        let admin = make_admin(&db).await;
        make_user(&db, "s1@example.com", Role::Student).await;
        make_user(&db, "s2@example.com", Role::Student).await;
        make_user(&db, "t1@example.com", Role::Teacher).await;

        let for_students = Model::create(&db, admin.id, new_notice(Audience::Students, vec![]))
            .await
            .unwrap();
        assert_eq!(for_students.total_reach, 2);

        let for_teachers = Model::create(&db, admin.id, new_notice(Audience::Teachers, vec![]))
            .await
            .unwrap();
        assert_eq!(for_teachers.total_reach, 1);

        // 2 students + 1 teacher + 1 admin.
        let for_all = Model::create(&db, admin.id, new_notice(Audience::All, vec![]))
            .await
            .unwrap();
        assert_eq!(for_all.total_reach, 4);
    }

    #[tokio::test]
    async fn marking_read_twice_counts_once() {
        let db = setup_test_db().await;
        let admin = make_admin(&db).await;
        let reader = make_user(&db, "s1@example.com", Role::Student).await;

        let notice = Model::create(&db, admin.id, new_notice(Audience::All, vec![]))
            .await
            .unwrap();
        assert_eq!(notice.read_count, 0);
        assert!(
            !crate::models::notice_read::Model::has_read(&db, notice.id, reader.id)
                .await
                .unwrap()
        );

        let notice = Model::mark_read(&db, notice.id, reader.id).await.unwrap();
        assert_eq!(notice.read_count, 1);

        let notice = Model::mark_read(&db, notice.id, reader.id).await.unwrap();
        assert_eq!(notice.read_count, 1);

        assert_eq!(Model::receipts(&db, notice.id).await.unwrap().len(), 1);
        assert!(
            crate::models::notice_read::Model::has_read(&db, notice.id, reader.id)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn read_percentage_rounds() {
        let n = Model {
            id: 1,
            admin_id: 1,
            title: String::new(),
            content: String::new(),
            audience: Audience::All,
            target_grades: serde_json::json!([]),
            status: NoticeStatus::Published,
            publish_at: None,
            expires_at: None,
            total_reach: 3,
            read_count: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(n.read_percentage(), 33);

        let empty = Model { total_reach: 0, ..n };
        assert_eq!(empty.read_percentage(), 0);
    }

    #[tokio::test]
    async fn listings_are_scoped_by_audience_and_status() {
        let db = setup_test_db().await;
        let admin = make_admin(&db).await;

        Model::create(&db, admin.id, new_notice(Audience::All, vec![]))
            .await
            .unwrap();
        Model::create(&db, admin.id, new_notice(Audience::Teachers, vec![]))
            .await
            .unwrap();
        Model::create(&db, admin.id, new_notice(Audience::SpecificGrade, vec!["10"]))
            .await
            .unwrap();
        let draft = Model::create(
            &db,
            admin.id,
            NewNotice {
                status: NoticeStatus::Draft,
                ..new_notice(Audience::All, vec![])
            },
        )
        .await
        .unwrap();

        // Students in grade 10 see the all-audience and grade-10 notices.
        let grade10 = Model::for_student_grade(&db, "10").await.unwrap();
        assert_eq!(grade10.len(), 2);

        // Grade 11 students only see the all-audience notice.
        assert_eq!(Model::for_student_grade(&db, "11").await.unwrap().len(), 1);

        // Teachers see all-audience and teacher notices.
        assert_eq!(Model::for_teachers(&db).await.unwrap().len(), 2);

        // Admins see everything, including the draft.
        assert_eq!(Model::for_admin(&db, None).await.unwrap().len(), 4);
        let drafts = Model::for_admin(&db, Some(NoticeStatus::Draft)).await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].id, draft.id);
    }
}
