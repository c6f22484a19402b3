pub use sea_orm_migration::prelude::*;

mod m20240101_000001_initial;
mod m20240102_000001_add_birth_date_to_deceased;
mod m20240103_000001_create_profiles;
mod m20240104_000001_add_khatma_type_and_target_date;
mod m20240105_000001_add_khatma_completion_and_sharing;
mod m20240106_000001_add_khatma_social_fields;
mod m20240107_000001_create_group_memberships;
mod m20240108_000001_add_membership_is_active;
mod m20240109_000001_create_participants_and_readings;
mod m20240110_000001_create_join_requests_and_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_initial::Migration),
            Box::new(m20240102_000001_add_birth_date_to_deceased::Migration),
            Box::new(m20240103_000001_create_profiles::Migration),
            Box::new(m20240104_000001_add_khatma_type_and_target_date::Migration),
            Box::new(m20240105_000001_add_khatma_completion_and_sharing::Migration),
            Box::new(m20240106_000001_add_khatma_social_fields::Migration),
            Box::new(m20240107_000001_create_group_memberships::Migration),
            Box::new(m20240108_000001_add_membership_is_active::Migration),
            Box::new(m20240109_000001_create_participants_and_readings::Migration),
            Box::new(m20240110_000001_create_join_requests_and_notifications::Migration),
        ]
    }
}
