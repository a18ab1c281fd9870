use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::Utc;
use rand::rngs::OsRng;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Global role carried by every identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "student")]
    Student,
    #[sea_orm(string_value = "teacher")]
    Teacher,
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// Represents an identity in the `users` table.
///
/// The password hash is never serialized into API responses.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique email address, stored lowercased.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub active: bool,
    pub last_login_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::student::Entity")]
    Student,
    #[sea_orm(has_one = "super::teacher::Entity")]
    Teacher,
    #[sea_orm(has_one = "super::admin::Entity")]
    Admin,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::teacher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::admin::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Admin.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Credential failures.
///
/// Every login mismatch (unknown email, wrong role, wrong password,
/// deactivated account) collapses into `InvalidCredentials` so callers
/// cannot distinguish which part failed.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Password hashing failed")]
    Hashing,
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Profile fields accepted at registration time.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
}

impl Model {
    /// Hashes a plaintext password with a fresh random salt.
    pub fn hash_password(password: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|_| CredentialError::Hashing)
    }

    /// Verifies a plaintext password against the stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        PasswordHash::new(&self.password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    pub async fn create(db: &DbConn, new: NewUser, role: Role) -> Result<Model, CredentialError> {
        let now = Utc::now();
        let user = ActiveModel {
            email: Set(new.email.to_lowercase()),
            password_hash: Set(Self::hash_password(&new.password)?),
            role: Set(role),
            name: Set(new.name),
            phone: Set(new.phone),
            address: Set(new.address),
            date_of_birth: Set(new.date_of_birth),
            gender: Set(new.gender),
            active: Set(true),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(user.insert(db).await?)
    }

    /// Email lookup is case-insensitive: addresses are stored lowercased.
    pub async fn find_by_email(db: &DbConn, email: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::Email.eq(email.to_lowercase()))
            .one(db)
            .await
    }

    /// Resolves a login attempt.
    ///
    /// The role must match the stored identity: the same email cannot log
    /// in under a different role even with the right password.
    pub async fn verify_credentials(
        db: &DbConn,
        email: &str,
        role: Role,
        password: &str,
    ) -> Result<Model, CredentialError> {
        let user = Self::find_by_email(db, email)
            .await?
            .ok_or(CredentialError::InvalidCredentials)?;

        if user.role != role || !user.active || !user.verify_password(password) {
            return Err(CredentialError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn touch_last_login(db: &DbConn, user_id: i64) -> Result<(), DbErr> {
        let user = ActiveModel {
            id: Set(user_id),
            last_login_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        user.update(db).await?;
        Ok(())
    }

    /// Replaces the password after verifying the current one.
    pub async fn change_password(
        db: &DbConn,
        user_id: i64,
        current: &str,
        new: &str,
    ) -> Result<(), CredentialError> {
        let user = Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or(CredentialError::InvalidCredentials)?;

        if !user.verify_password(current) {
            return Err(CredentialError::InvalidCredentials);
        }

        let update = ActiveModel {
            id: Set(user_id),
            password_hash: Set(Self::hash_password(new)?),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        update.update(db).await?;
        Ok(())
    }

    pub async fn count_active_by_role(db: &DbConn, role: Option<Role>) -> Result<u64, DbErr> {
        let mut query = Entity::find().filter(Column::Active.eq(true));
        if let Some(role) = role {
            query = query.filter(Column::Role.eq(role));
        }
        query.count(db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    fn new_user(email: &str, password: &str, name: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password: password.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_lowercases_email_and_hashes_password() {
        let db = setup_test_db().await;

        let user = Model::create(&db, new_user("Alice@Example.COM", "secret123", "Alice"), Role::Student)
            .await
            .unwrap();

        assert_eq!(user.email, "alice@example.com");
        assert_ne!(user.password_hash, "secret123");
        assert!(user.verify_password("secret123"));
        assert!(!user.verify_password("secret124"));

        // Lookup is case-insensitive.
        let found = Model::find_by_email(&db, "ALICE@example.com").await.unwrap();
        assert_eq!(found.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn password_hash_is_not_serialized() {
        let db = setup_test_db().await;
        let user = Model::create(&db, new_user("bob@example.com", "secret123", "Bob"), Role::Teacher)
            .await
            .unwrap();

        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["email"], "bob@example.com");
    }

    #[tokio::test]
    async fn login_mismatches_are_indistinguishable() {
        let db = setup_test_db().await;
        Model::create(&db, new_user("carol@example.com", "secret123", "Carol"), Role::Student)
            .await
            .unwrap();

        let wrong_password =
            Model::verify_credentials(&db, "carol@example.com", Role::Student, "nope12345")
                .await
                .unwrap_err();
        let unknown_email =
            Model::verify_credentials(&db, "ghost@example.com", Role::Student, "secret123")
                .await
                .unwrap_err();
        let wrong_role =
            Model::verify_credentials(&db, "carol@example.com", Role::Teacher, "secret123")
                .await
                .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.to_string(), wrong_role.to_string());
        assert_eq!(wrong_password.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn deactivated_user_cannot_log_in() {
        use sea_orm::ActiveValue::Set;

        let db = setup_test_db().await;
        let user = Model::create(&db, new_user("dan@example.com", "secret123", "Dan"), Role::Admin)
            .await
            .unwrap();

        let deactivate = ActiveModel {
            id: Set(user.id),
            active: Set(false),
            ..Default::default()
        };
        deactivate.update(&db).await.unwrap();

        let err = Model::verify_credentials(&db, "dan@example.com", Role::Admin, "secret123")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let db = setup_test_db().await;
        let user = Model::create(&db, new_user("eve@example.com", "oldsecret", "Eve"), Role::Student)
            .await
            .unwrap();

        let err = Model::change_password(&db, user.id, "wrongsecret", "newsecret")
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::InvalidCredentials));

        Model::change_password(&db, user.id, "oldsecret", "newsecret")
            .await
            .unwrap();

        Model::verify_credentials(&db, "eve@example.com", Role::Student, "newsecret")
            .await
            .unwrap();
    }
}
