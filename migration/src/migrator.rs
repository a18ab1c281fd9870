use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202601050001_create_users::Migration),
            Box::new(migrations::m202601050002_create_teachers::Migration),
            Box::new(migrations::m202601050003_create_classes::Migration),
            Box::new(migrations::m202601050004_create_students::Migration),
            Box::new(migrations::m202601050005_create_admins::Migration),
            Box::new(migrations::m202601050006_create_class_schedules::Migration),
            Box::new(migrations::m202601060001_create_assignments::Migration),
            Box::new(migrations::m202601060002_create_submissions::Migration),
            Box::new(migrations::m202601070001_create_notices::Migration),
            Box::new(migrations::m202601070002_create_notice_reads::Migration),
            Box::new(migrations::m202601080001_create_attendance_records::Migration),
        ]
    }
}
