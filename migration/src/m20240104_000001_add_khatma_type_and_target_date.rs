use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Khatmas {
    Table,
    KhatmaType,
    TargetCompletionDate,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SQLite accepts one column per ALTER TABLE statement
        manager
            .alter_table(
                Table::alter()
                    .table(Khatmas::Table)
                    .add_column(
                        ColumnDef::new(Khatmas::KhatmaType)
                            .string_len(20)
                            .not_null()
                            .default("regular"),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Khatmas::Table)
                    .add_column(ColumnDef::new(Khatmas::TargetCompletionDate).date().null())
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Khatmas::Table)
                    .drop_column(Khatmas::TargetCompletionDate)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Khatmas::Table)
                    .drop_column(Khatmas::KhatmaType)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
