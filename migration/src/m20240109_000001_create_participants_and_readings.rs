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
enum Deceased {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Participants {
    Table,
    Id,
    KhatmaId,
    UserId,
    PartsRead,
    JoinedAt,
}

#[derive(DeriveIden)]
enum QuranReadings {
    Table,
    Id,
    KhatmaId,
    ParticipantId,
    PartNumber,
    Status,
    RecitationMethod,
    StartDate,
    CompletionDate,
    Reciter,
    Notes,
    Dua,
    DedicatedTo,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Participants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participants::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Participants::KhatmaId).integer().not_null())
                    .col(ColumnDef::new(Participants::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(Participants::PartsRead)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Participants::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participants_khatma")
                            .from(Participants::Table, Participants::KhatmaId)
                            .to(Khatmas::Table, Khatmas::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participants_user")
                            .from(Participants::Table, Participants::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_participants_khatma_user")
                    .table(Participants::Table)
                    .col(Participants::KhatmaId)
                    .col(Participants::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QuranReadings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuranReadings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QuranReadings::KhatmaId).integer().not_null())
                    .col(
                        ColumnDef::new(QuranReadings::ParticipantId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(QuranReadings::PartNumber).integer().not_null())
                    .col(
                        ColumnDef::new(QuranReadings::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(QuranReadings::RecitationMethod)
                            .string_len(20)
                            .not_null()
                            .default("reading"),
                    )
                    .col(
                        ColumnDef::new(QuranReadings::StartDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(QuranReadings::CompletionDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(QuranReadings::Reciter).string_len(100).null())
                    .col(ColumnDef::new(QuranReadings::Notes).text().null())
                    .col(ColumnDef::new(QuranReadings::Dua).text().null())
                    .col(ColumnDef::new(QuranReadings::DedicatedTo).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quran_readings_khatma")
                            .from(QuranReadings::Table, QuranReadings::KhatmaId)
                            .to(Khatmas::Table, Khatmas::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quran_readings_participant")
                            .from(QuranReadings::Table, QuranReadings::ParticipantId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quran_readings_dedicated_to")
                            .from(QuranReadings::Table, QuranReadings::DedicatedTo)
                            .to(Deceased::Table, Deceased::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_quran_readings_khatma_part_participant")
                    .table(QuranReadings::Table)
                    .col(QuranReadings::KhatmaId)
                    .col(QuranReadings::PartNumber)
                    .col(QuranReadings::ParticipantId)
                    .unique()
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
                    .table(QuranReadings::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Participants::Table).to_owned())
            .await?;
        Ok(())
    }
}
