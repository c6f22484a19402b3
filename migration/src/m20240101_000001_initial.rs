use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    IsStaff,
    IsActive,
    DateJoined,
    LastLogin,
}

#[derive(DeriveIden)]
enum ReadingGroups {
    Table,
    Id,
    Name,
    Description,
    CreatorId,
    IsActive,
    IsPublic,
    AllowJoinRequests,
    MaxMembers,
    EnableKhatmaCreation,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Deceased {
    Table,
    Id,
    Name,
    DeathDate,
    Biography,
    Relation,
    CauseOfDeath,
    BurialPlace,
    MemorialDay,
    MemorialFrequency,
    AddedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Khatmas {
    Table,
    Id,
    Title,
    Description,
    CreatorId,
    DeceasedId,
    GroupId,
    IsGroupKhatma,
    IsPublic,
    CreatedAt,
}

#[derive(DeriveIden)]
enum KhatmaParts {
    Table,
    Id,
    KhatmaId,
    PartNumber,
    IsCompleted,
    CompletedAt,
    AssignedTo,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(150)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Email).string_len(254).null())
                    .col(ColumnDef::new(Users::PasswordHash).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Users::IsStaff)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::DateJoined)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Users::LastLogin)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReadingGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReadingGroups::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReadingGroups::Name)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ReadingGroups::Description).text().null())
                    .col(ColumnDef::new(ReadingGroups::CreatorId).integer().not_null())
                    .col(
                        ColumnDef::new(ReadingGroups::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ReadingGroups::IsPublic)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ReadingGroups::AllowJoinRequests)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ReadingGroups::MaxMembers)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ReadingGroups::EnableKhatmaCreation)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ReadingGroups::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reading_groups_creator")
                            .from(ReadingGroups::Table, ReadingGroups::CreatorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Deceased::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Deceased::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Deceased::Name)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Deceased::DeathDate).date().not_null())
                    .col(
                        ColumnDef::new(Deceased::Biography)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Deceased::Relation).string_len(100).null())
                    .col(ColumnDef::new(Deceased::CauseOfDeath).string_len(200).null())
                    .col(ColumnDef::new(Deceased::BurialPlace).string_len(200).null())
                    .col(
                        ColumnDef::new(Deceased::MemorialDay)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Deceased::MemorialFrequency)
                            .string_len(20)
                            .null(),
                    )
                    .col(ColumnDef::new(Deceased::AddedBy).integer().not_null())
                    .col(
                        ColumnDef::new(Deceased::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deceased_added_by")
                            .from(Deceased::Table, Deceased::AddedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Khatmas::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Khatmas::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Khatmas::Title)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Khatmas::Description).text().null())
                    .col(ColumnDef::new(Khatmas::CreatorId).integer().not_null())
                    .col(ColumnDef::new(Khatmas::DeceasedId).integer().null())
                    .col(ColumnDef::new(Khatmas::GroupId).integer().null())
                    .col(
                        ColumnDef::new(Khatmas::IsGroupKhatma)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Khatmas::IsPublic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Khatmas::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_khatmas_creator")
                            .from(Khatmas::Table, Khatmas::CreatorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_khatmas_deceased")
                            .from(Khatmas::Table, Khatmas::DeceasedId)
                            .to(Deceased::Table, Deceased::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_khatmas_group")
                            .from(Khatmas::Table, Khatmas::GroupId)
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
                    .name("idx_khatmas_creator")
                    .table(Khatmas::Table)
                    .col(Khatmas::CreatorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(KhatmaParts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(KhatmaParts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(KhatmaParts::KhatmaId).integer().not_null())
                    .col(ColumnDef::new(KhatmaParts::PartNumber).integer().not_null())
                    .col(
                        ColumnDef::new(KhatmaParts::IsCompleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(KhatmaParts::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(KhatmaParts::AssignedTo).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_khatma_parts_khatma")
                            .from(KhatmaParts::Table, KhatmaParts::KhatmaId)
                            .to(Khatmas::Table, Khatmas::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_khatma_parts_assigned_to")
                            .from(KhatmaParts::Table, KhatmaParts::AssignedTo)
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
                    .name("uq_khatma_parts_khatma_part")
                    .table(KhatmaParts::Table)
                    .col(KhatmaParts::KhatmaId)
                    .col(KhatmaParts::PartNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_khatma_parts_assigned_to")
                    .table(KhatmaParts::Table)
                    .col(KhatmaParts::AssignedTo)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(KhatmaParts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Khatmas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Deceased::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(ReadingGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
