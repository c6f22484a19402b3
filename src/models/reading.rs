use crate::entities::{ReadingStatus, RecitationMethod, quran_reading_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StartReadingRequest {
    pub khatma_id: i32,
    #[schema(example = 1, minimum = 1, maximum = 30)]
    pub part_number: i32,
    /// Defaults to `in_progress`; only `pending` or `in_progress` are accepted.
    pub status: Option<ReadingStatus>,
    pub recitation_method: Option<RecitationMethod>,
    pub reciter: Option<String>,
    pub notes: Option<String>,
    pub dua: Option<String>,
    pub dedicated_to: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateReadingStatusRequest {
    pub status: ReadingStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReadingQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub khatma_id: Option<i32>,
    pub status: Option<ReadingStatus>,
    pub recitation_method: Option<RecitationMethod>,
    /// Matches notes or reciter.
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadingResponse {
    pub id: i32,
    pub khatma_id: i32,
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

impl From<quran_reading_entity::Model> for ReadingResponse {
    fn from(r: quran_reading_entity::Model) -> Self {
        Self {
            id: r.id,
            khatma_id: r.khatma_id,
            participant_id: r.participant_id,
            part_number: r.part_number,
            status: r.status,
            recitation_method: r.recitation_method,
            start_date: r.start_date,
            completion_date: r.completion_date,
            reciter: r.reciter,
            notes: r.notes,
            dua: r.dua,
            dedicated_to: r.dedicated_to,
        }
    }
}
