//! Shared test fixtures.

use migration::Migrator;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

/// A fresh in-memory SQLite database with the full schema applied.
///
/// Every call returns an isolated database, so tests never observe each
/// other's rows.
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite should always open");

    Migrator::up(&db, None)
        .await
        .expect("schema migrations should apply cleanly");

    db
}
