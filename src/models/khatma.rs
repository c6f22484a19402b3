use crate::entities::{
    KhatmaType, KhatmaVisibility, ReminderFrequency, khatma_entity, khatma_part_entity,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateKhatmaRequest {
    #[schema(example = "Ramadan khatma")]
    pub title: String,
    pub description: Option<String>,
    pub khatma_type: Option<KhatmaType>,
    pub deceased_id: Option<i32>,
    pub group_id: Option<i32>,
    pub is_public: Option<bool>,
    pub visibility: Option<KhatmaVisibility>,
    pub target_completion_date: Option<NaiveDate>,
    /// 0 means unlimited.
    pub max_participants: Option<i32>,
    pub social_media_hashtags: Option<String>,
    pub allow_comments: Option<bool>,
    pub send_reminders: Option<bool>,
    pub reminder_frequency: Option<ReminderFrequency>,
    pub memorial_prayer: Option<String>,
}

impl CreateKhatmaRequest {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            khatma_type: None,
            deceased_id: None,
            group_id: None,
            is_public: None,
            visibility: None,
            target_completion_date: None,
            max_participants: None,
            social_media_hashtags: None,
            allow_comments: None,
            send_reminders: None,
            reminder_frequency: None,
            memorial_prayer: None,
        }
    }
}

/// Completion fields change only through part and khatma completion.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateKhatmaRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub visibility: Option<KhatmaVisibility>,
    pub target_completion_date: Option<NaiveDate>,
    pub max_participants: Option<i32>,
    pub social_media_hashtags: Option<String>,
    pub allow_comments: Option<bool>,
    pub send_reminders: Option<bool>,
    pub reminder_frequency: Option<ReminderFrequency>,
    pub memorial_prayer: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct KhatmaQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub khatma_type: Option<KhatmaType>,
    pub is_completed: Option<bool>,
    pub group_id: Option<i32>,
    /// Matches title or description.
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct KhatmaResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub khatma_type: KhatmaType,
    pub creator_id: i32,
    pub deceased_id: Option<i32>,
    pub group_id: Option<i32>,
    pub is_group_khatma: bool,
    pub is_public: bool,
    pub visibility: KhatmaVisibility,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub target_completion_date: Option<NaiveDate>,
    pub sharing_link: Option<String>,
    pub max_participants: i32,
    pub social_media_hashtags: Option<String>,
    pub allow_comments: bool,
    pub send_reminders: bool,
    pub reminder_frequency: ReminderFrequency,
    pub memorial_prayer: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<khatma_entity::Model> for KhatmaResponse {
    fn from(k: khatma_entity::Model) -> Self {
        Self {
            id: k.id,
            title: k.title,
            description: k.description,
            khatma_type: k.khatma_type,
            creator_id: k.creator_id,
            deceased_id: k.deceased_id,
            group_id: k.group_id,
            is_group_khatma: k.is_group_khatma,
            is_public: k.is_public,
            visibility: k.visibility,
            is_completed: k.is_completed,
            completed_at: k.completed_at,
            target_completion_date: k.target_completion_date,
            sharing_link: k.sharing_link,
            max_participants: k.max_participants,
            social_media_hashtags: k.social_media_hashtags,
            allow_comments: k.allow_comments,
            send_reminders: k.send_reminders,
            reminder_frequency: k.reminder_frequency,
            memorial_prayer: k.memorial_prayer,
            created_at: k.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct KhatmaPartResponse {
    pub id: i32,
    pub part_number: i32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub assigned_to: Option<i32>,
}

impl From<khatma_part_entity::Model> for KhatmaPartResponse {
    fn from(p: khatma_part_entity::Model) -> Self {
        Self {
            id: p.id,
            part_number: p.part_number,
            is_completed: p.is_completed,
            completed_at: p.completed_at,
            assigned_to: p.assigned_to,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct KhatmaProgressResponse {
    pub khatma_id: i32,
    pub total_parts: u64,
    pub completed_parts: u64,
    pub progress_percentage: f64,
    pub is_completed: bool,
    /// Latest five completed parts, newest first.
    pub recent_completions: Vec<KhatmaPartResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct KhatmaDetailResponse {
    pub khatma: KhatmaResponse,
    pub parts: Vec<KhatmaPartResponse>,
    pub participants_count: u64,
    pub progress: KhatmaProgressResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShareKhatmaResponse {
    pub sharing_link: String,
    pub share_url: String,
    pub message: String,
    pub hashtags: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParticipantResponse {
    pub user_id: i32,
    pub username: String,
    pub parts_read: i32,
    pub joined_at: DateTime<Utc>,
    pub is_creator: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignPartRequest {
    /// `null` unassigns the part.
    pub user_id: Option<i32>,
}
