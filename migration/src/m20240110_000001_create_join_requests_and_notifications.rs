use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Khatmas {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ReadingGroups {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum JoinRequests {
    Table,
    Id,
    GroupId,
    UserId,
    Message,
    Status,
    CreatedAt,
    ProcessedAt,
    ProcessedBy,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    UserId,
    NotificationType,
    Message,
    IsRead,
    RelatedKhatmaId,
    RelatedGroupId,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JoinRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JoinRequests::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JoinRequests::GroupId).integer().not_null())
                    .col(ColumnDef::new(JoinRequests::UserId).integer().not_null())
                    .col(ColumnDef::new(JoinRequests::Message).text().null())
                    .col(
                        ColumnDef::new(JoinRequests::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(JoinRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(JoinRequests::ProcessedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(JoinRequests::ProcessedBy).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_join_requests_group")
                            .from(JoinRequests::Table, JoinRequests::GroupId)
                            .to(ReadingGroups::Table, ReadingGroups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_join_requests_user")
                            .from(JoinRequests::Table, JoinRequests::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_join_requests_processed_by")
                            .from(JoinRequests::Table, JoinRequests::ProcessedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_join_requests_group_user")
                    .table(JoinRequests::Table)
                    .col(JoinRequests::GroupId)
                    .col(JoinRequests::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(Notifications::NotificationType)
                            .string_len(30)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notifications::Message).text().not_null())
                    .col(
                        ColumnDef::new(Notifications::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Notifications::RelatedKhatmaId).integer().null())
                    .col(ColumnDef::new(Notifications::RelatedGroupId).integer().null())
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_user")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_khatma")
                            .from(Notifications::Table, Notifications::RelatedKhatmaId)
                            .to(Khatmas::Table, Khatmas::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_group")
                            .from(Notifications::Table, Notifications::RelatedGroupId)
                            .to(ReadingGroups::Table, ReadingGroups::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notifications_user_read")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .col(Notifications::IsRead)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(Notifications::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(JoinRequests::Table).to_owned())
            .await?;
        Ok(())
    }
}
