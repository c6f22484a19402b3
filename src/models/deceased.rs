use crate::entities::{MemorialFrequency, deceased_entity};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateDeceasedRequest {
    pub name: String,
    #[schema(example = "2020-03-15")]
    pub death_date: NaiveDate,
    pub birth_date: Option<NaiveDate>,
    pub biography: Option<String>,
    pub relationship: Option<String>,
    pub cause_of_death: Option<String>,
    pub burial_place: Option<String>,
    #[serde(default)]
    pub memorial_day: bool,
    pub memorial_frequency: Option<MemorialFrequency>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateDeceasedRequest {
    pub name: Option<String>,
    pub death_date: Option<NaiveDate>,
    pub birth_date: Option<NaiveDate>,
    pub biography: Option<String>,
    pub relationship: Option<String>,
    pub cause_of_death: Option<String>,
    pub burial_place: Option<String>,
    pub memorial_day: Option<bool>,
    pub memorial_frequency: Option<MemorialFrequency>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeceasedResponse {
    pub id: i32,
    pub name: String,
    pub death_date: NaiveDate,
    pub birth_date: Option<NaiveDate>,
    pub age_at_death: Option<i32>,
    pub biography: String,
    pub relationship: Option<String>,
    pub cause_of_death: Option<String>,
    pub burial_place: Option<String>,
    pub memorial_day: bool,
    pub memorial_frequency: Option<MemorialFrequency>,
    pub added_by: i32,
    pub created_at: DateTime<Utc>,
}

impl From<deceased_entity::Model> for DeceasedResponse {
    fn from(d: deceased_entity::Model) -> Self {
        let age_at_death = d.age_at_death();
        Self {
            id: d.id,
            name: d.name,
            death_date: d.death_date,
            birth_date: d.birth_date,
            age_at_death,
            biography: d.biography,
            relationship: d.relationship,
            cause_of_death: d.cause_of_death,
            burial_place: d.burial_place,
            memorial_day: d.memorial_day,
            memorial_frequency: d.memorial_frequency,
            added_by: d.added_by,
            created_at: d.created_at,
        }
    }
}
