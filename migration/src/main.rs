use migration::Migrator;
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::{env, fs, path::Path};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let db_path = env::var("DATABASE_PATH").expect("DATABASE_PATH must be set");
    let url = format!("sqlite://{}?mode=rwc", db_path);
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("clean") => {
            remove_db_file(&db_path);
        }
        Some("fresh") => {
            remove_db_file(&db_path);
            create_db_dir(&db_path);
            run_all_migrations(&url).await;
        }
        _ => {
            create_db_dir(&db_path);
            run_all_migrations(&url).await;
        }
    }
}

async fn run_all_migrations(url: &str) {
    let db = Database::connect(url)
        .await
        .expect("Failed to connect to database");

    Migrator::up(&db, None).await.expect("Migration failed");
    println!("Migrations applied");
}

fn remove_db_file(path: &str) {
    let db_path = Path::new(path);
    if db_path.exists() {
        fs::remove_file(db_path).expect("Failed to delete DB file");
        println!("Deleted DB: {}", db_path.display());
    } else {
        println!("DB file does not exist: {}", db_path.display());
    }

    // Stored uploads belong to rows in the deleted database.
    if let Ok(storage_root) = env::var("STORAGE_ROOT") {
        let storage_path = Path::new(&storage_root);
        if storage_path.exists() {
            fs::remove_dir_all(storage_path).expect("Failed to delete stored uploads");
            println!("Deleted stored uploads: {}", storage_path.display());
        }
    }
}

fn create_db_dir(path: &str) {
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent).expect("Failed to create DB directory");
    }
}
