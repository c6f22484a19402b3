use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Deceased {
    Table,
    BirthDate,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Deceased::Table)
                    .add_column(ColumnDef::new(Deceased::BirthDate).date().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Deceased::Table)
                    .drop_column(Deceased::BirthDate)
                    .to_owned(),
            )
            .await
    }
}
