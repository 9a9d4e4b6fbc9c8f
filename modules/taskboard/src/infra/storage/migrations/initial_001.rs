use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum AppUser {
    Table,
    Id,
    Name,
    Email,
    EmailKey,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Project {
    Table,
    Id,
    Name,
    NameKey,
    Description,
    OwnerId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Task {
    Table,
    Id,
    Title,
    TitleKey,
    Description,
    Status,
    Priority,
    DueDate,
    ProjectId,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AppUser::Table)
                    .if_not_exists()
                    // INTEGER (not BIGINT) so SQLite treats it as the rowid alias.
                    .col(
                        ColumnDef::new(AppUser::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AppUser::Name).string_len(100).not_null())
                    .col(ColumnDef::new(AppUser::Email).string_len(120).not_null())
                    .col(ColumnDef::new(AppUser::EmailKey).string_len(120).not_null())
                    .col(
                        ColumnDef::new(AppUser::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_app_user_email_key")
                    .table(AppUser::Table)
                    .col(AppUser::EmailKey)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Project::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Project::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Project::Name).string_len(120).not_null())
                    .col(ColumnDef::new(Project::NameKey).string_len(120).not_null())
                    .col(ColumnDef::new(Project::Description).string_len(500).null())
                    .col(ColumnDef::new(Project::OwnerId).integer().not_null())
                    .col(
                        ColumnDef::new(Project::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_owner")
                            .from(Project::Table, Project::OwnerId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_project_owner_name_key")
                    .table(Project::Table)
                    .col(Project::OwnerId)
                    .col(Project::NameKey)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Task::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Task::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Task::Title).string_len(150).not_null())
                    .col(ColumnDef::new(Task::TitleKey).string_len(150).not_null())
                    .col(ColumnDef::new(Task::Description).string_len(1000).null())
                    .col(ColumnDef::new(Task::Status).string_len(10).not_null())
                    .col(ColumnDef::new(Task::Priority).string_len(10).not_null())
                    .col(ColumnDef::new(Task::DueDate).date().null())
                    .col(ColumnDef::new(Task::ProjectId).integer().not_null())
                    .col(
                        ColumnDef::new(Task::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_project")
                            .from(Task::Table, Task::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_task_project_title_key")
                    .table(Task::Table)
                    .col(Task::ProjectId)
                    .col(Task::TitleKey)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_task_status_priority")
                    .table(Task::Table)
                    .col(Task::Status)
                    .col(Task::Priority)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Task::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Project::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AppUser::Table).to_owned())
            .await
    }
}
