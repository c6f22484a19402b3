use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Number of parts (juz') a khatma is divided into.
pub const PARTS_PER_KHATMA: i32 = 30;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "khatma_parts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub khatma_id: i32,
    pub part_number: i32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// Nulled by the database when the assignee is deleted.
    pub assigned_to: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
