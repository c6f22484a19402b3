use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum MemorialFrequency {
    #[sea_orm(string_value = "yearly")]
    Yearly,
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "weekly")]
    Weekly,
    #[sea_orm(string_value = "daily")]
    Daily,
}

impl MemorialFrequency {
    /// Whether a memorial for someone who died on `death_date` falls on `today`.
    pub fn is_due(&self, death_date: NaiveDate, today: NaiveDate) -> bool {
        if today < death_date {
            return false;
        }
        match self {
            MemorialFrequency::Yearly => {
                today.month() == death_date.month() && today.day() == death_date.day()
            }
            MemorialFrequency::Monthly => today.day() == death_date.day(),
            MemorialFrequency::Weekly => (today - death_date).num_days() % 7 == 0,
            MemorialFrequency::Daily => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "deceased")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub death_date: NaiveDate,
    pub biography: String,
    #[sea_orm(column_name = "relation")]
    pub relationship: Option<String>,
    pub cause_of_death: Option<String>,
    pub burial_place: Option<String>,
    pub memorial_day: bool,
    pub memorial_frequency: Option<MemorialFrequency>,
    pub added_by: i32,
    pub created_at: DateTime<Utc>,
    pub birth_date: Option<NaiveDate>,
}

impl Model {
    /// Age in full years at the date of death, if the birth date is known.
    pub fn age_at_death(&self) -> Option<i32> {
        let birth = self.birth_date?;
        let before_birthday =
            (self.death_date.month(), self.death_date.day()) < (birth.month(), birth.day());
        Some(self.death_date.year() - birth.year() - i32::from(before_birthday))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
