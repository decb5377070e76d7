use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510010006_create_event_course_sections"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("event_course_sections"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("event_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("course_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("section_id")).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ecs_event")
                            .from(Alias::new("event_course_sections"), Alias::new("event_id"))
                            .to(Alias::new("events"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ecs_course")
                            .from(Alias::new("event_course_sections"), Alias::new("course_id"))
                            .to(Alias::new("courses"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ecs_section")
                            .from(Alias::new("event_course_sections"), Alias::new("section_id"))
                            .to(Alias::new("sections"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ecs_unique_pair")
                    .table(Alias::new("event_course_sections"))
                    .col(Alias::new("event_id"))
                    .col(Alias::new("course_id"))
                    .col(Alias::new("section_id"))
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Visibility lookups go from a student's enrollment to events.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ecs_enrollment")
                    .table(Alias::new("event_course_sections"))
                    .col(Alias::new("course_id"))
                    .col(Alias::new("section_id"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("event_course_sections")).to_owned())
            .await
    }
}
