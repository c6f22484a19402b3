use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    #[serde(alias = "not_started")]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "skipped")]
    Skipped,
}

impl ReadingStatus {
    /// Allowed moves of the reading state machine. Staying put is always allowed.
    pub fn can_transition_to(&self, next: ReadingStatus) -> bool {
        use ReadingStatus::*;
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Skipped)
                | (InProgress, Completed)
                | (InProgress, Skipped)
                | (Completed, InProgress)
                | (Skipped, Pending)
        )
    }
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadingStatus::Pending => write!(f, "pending"),
            ReadingStatus::InProgress => write!(f, "in_progress"),
            ReadingStatus::Completed => write!(f, "completed"),
            ReadingStatus::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum RecitationMethod {
    #[sea_orm(string_value = "reading")]
    Reading,
    #[sea_orm(string_value = "listening")]
    Listening,
    #[sea_orm(string_value = "memorization")]
    Memorization,
    #[sea_orm(string_value = "tajweed")]
    Tajweed,
    #[sea_orm(string_value = "translation")]
    Translation,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "quran_readings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub khatma_id: i32,
    /// The reading user.
    pub participant_id: i32,
    pub part_number: i32,
    pub status: ReadingStatus,
    pub recitation_method: RecitationMethod,
    pub start_date: DateTime<Utc>,
    pub completion_date: Option<DateTime<Utc>>,
    pub reciter: Option<String>,
    pub notes: Option<String>,
    pub dua: Option<String>,
    pub dedicated_to: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_status_transitions() {
        use ReadingStatus::*;

        assert!(Pending.can_transition_to(InProgress));
        assert!(Pending.can_transition_to(Skipped));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Skipped));
        assert!(Completed.can_transition_to(InProgress));
        assert!(Skipped.can_transition_to(Pending));
        assert!(Completed.can_transition_to(Completed));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Skipped));
        assert!(!Skipped.can_transition_to(Completed));
        assert!(!Skipped.can_transition_to(InProgress));
        assert!(!InProgress.can_transition_to(Pending));
    }

    #[test]
    fn test_reading_status_accepts_not_started_alias() {
        let status: ReadingStatus = serde_json::from_str("\"not_started\"").unwrap();
        assert_eq!(status, ReadingStatus::Pending);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"pending\"");
    }
}
