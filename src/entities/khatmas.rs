use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum KhatmaType {
    #[sea_orm(string_value = "regular")]
    Regular,
    #[sea_orm(string_value = "memorial")]
    Memorial,
    #[sea_orm(string_value = "charity")]
    Charity,
}

impl std::fmt::Display for KhatmaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KhatmaType::Regular => write!(f, "regular"),
            KhatmaType::Memorial => write!(f, "memorial"),
            KhatmaType::Charity => write!(f, "charity"),
        }
    }
}

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum KhatmaVisibility {
    #[sea_orm(string_value = "public")]
    Public,
    #[sea_orm(string_value = "private")]
    Private,
    #[sea_orm(string_value = "family")]
    Family,
}

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ReminderFrequency {
    #[sea_orm(string_value = "daily")]
    Daily,
    #[sea_orm(string_value = "weekly")]
    Weekly,
    #[sea_orm(string_value = "never")]
    Never,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "khatmas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub title: String,
    pub description: Option<String>,
    pub creator_id: i32,
    pub deceased_id: Option<i32>,
    pub group_id: Option<i32>,
    pub is_group_khatma: bool,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub khatma_type: KhatmaType,
    pub target_completion_date: Option<NaiveDate>,
    pub is_completed: bool,
    /// Set exactly when `is_completed` is true.
    pub completed_at: Option<DateTime<Utc>>,
    #[sea_orm(unique)]
    pub sharing_link: Option<String>,
    pub visibility: KhatmaVisibility,
    pub allow_comments: bool,
    pub social_media_hashtags: Option<String>,
    /// 0 means unlimited.
    pub max_participants: i32,
    pub send_reminders: bool,
    pub reminder_frequency: ReminderFrequency,
    pub memorial_prayer: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
