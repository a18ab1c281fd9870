use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202601050006_create_class_schedules"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("class_schedules"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alias::new("class_id")).big_integer().not_null())
                    .col(
                        ColumnDef::new(Alias::new("day_of_week"))
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("period")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("subject")).text().not_null())
                    .col(ColumnDef::new(Alias::new("teacher_id")).big_integer())
                    .col(ColumnDef::new(Alias::new("start_time")).text())
                    .col(ColumnDef::new(Alias::new("end_time")).text())
                    .col(
                        ColumnDef::new(Alias::new("created_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .col(
                        ColumnDef::new(Alias::new("updated_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("class_schedules"), Alias::new("class_id"))
                            .to(Alias::new("classes"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("class_schedules"), Alias::new("teacher_id"))
                            .to(Alias::new("teachers"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_class_schedules_slot")
                    .table(Alias::new("class_schedules"))
                    .col(Alias::new("class_id"))
                    .col(Alias::new("day_of_week"))
                    .col(Alias::new("period"))
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("class_schedules")).to_owned())
            .await
    }
}
