use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum GroupMemberships {
    Table,
    IsActive,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(GroupMemberships::Table)
                    .add_column(
                        ColumnDef::new(GroupMemberships::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(GroupMemberships::Table)
                    .drop_column(GroupMemberships::IsActive)
                    .to_owned(),
            )
            .await
    }
}
