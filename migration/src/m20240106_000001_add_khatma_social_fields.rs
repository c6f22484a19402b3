use sea_orm_migration::prelude::*;

#[derive(DeriveIden, Clone, Copy)]
enum Khatmas {
    Table,
    Visibility,
    AllowComments,
    SocialMediaHashtags,
    MaxParticipants,
    SendReminders,
    ReminderFrequency,
    MemorialPrayer,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

impl Migration {
    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new(Khatmas::Visibility)
                .string_len(20)
                .not_null()
                .default("public")
                .to_owned(),
            ColumnDef::new(Khatmas::AllowComments)
                .boolean()
                .not_null()
                .default(true)
                .to_owned(),
            ColumnDef::new(Khatmas::SocialMediaHashtags)
                .string_len(255)
                .null()
                .to_owned(),
            ColumnDef::new(Khatmas::MaxParticipants)
                .integer()
                .not_null()
                .default(0)
                .to_owned(),
            ColumnDef::new(Khatmas::SendReminders)
                .boolean()
                .not_null()
                .default(true)
                .to_owned(),
            ColumnDef::new(Khatmas::ReminderFrequency)
                .string_len(20)
                .not_null()
                .default("weekly")
                .to_owned(),
            ColumnDef::new(Khatmas::MemorialPrayer)
                .text()
                .null()
                .to_owned(),
        ]
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for mut col in Self::columns() {
            manager
                .alter_table(
                    Table::alter()
                        .table(Khatmas::Table)
                        .add_column(&mut col)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for col in [
            Khatmas::MemorialPrayer,
            Khatmas::ReminderFrequency,
            Khatmas::SendReminders,
            Khatmas::MaxParticipants,
            Khatmas::SocialMediaHashtags,
            Khatmas::AllowComments,
            Khatmas::Visibility,
        ] {
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
