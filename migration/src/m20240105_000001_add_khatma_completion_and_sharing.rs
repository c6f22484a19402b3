use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Khatmas {
    Table,
    IsCompleted,
    CompletedAt,
    SharingLink,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Khatmas::Table)
                    .add_column(
                        ColumnDef::new(Khatmas::IsCompleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Khatmas::Table)
                    .add_column(
                        ColumnDef::new(Khatmas::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Khatmas::Table)
                    .add_column(ColumnDef::new(Khatmas::SharingLink).string_len(36).null())
                    .to_owned(),
            )
            .await?;

        // NULLs are distinct in unique indexes on both Postgres and SQLite,
        // so khatmas without a link never collide.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_khatmas_sharing_link")
                    .table(Khatmas::Table)
                    .col(Khatmas::SharingLink)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("uq_khatmas_sharing_link")
                    .table(Khatmas::Table)
                    .to_owned(),
            )
            .await?;
        for col in [Khatmas::SharingLink, Khatmas::CompletedAt, Khatmas::IsCompleted] {
            manager
                .alter_table(
                    Table::alter()
                        .table(Khatmas::Table)
                        .drop_column(col)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }
}
