use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    #[sea_orm(string_value = "welcome")]
    Welcome,
    #[sea_orm(string_value = "khatma_progress")]
    KhatmaProgress,
    #[sea_orm(string_value = "khatma_completed")]
    KhatmaCompleted,
    #[sea_orm(string_value = "part_assigned")]
    PartAssigned,
    #[sea_orm(string_value = "part_completed")]
    PartCompleted,
    #[sea_orm(string_value = "memorial_khatma")]
    MemorialKhatma,
    #[sea_orm(string_value = "new_group_member")]
    NewGroupMember,
    #[sea_orm(string_value = "group_member_left")]
    GroupMemberLeft,
    #[sea_orm(string_value = "join_request")]
    JoinRequest,
    #[sea_orm(string_value = "join_request_approved")]
    JoinRequestApproved,
    #[sea_orm(string_value = "join_request_rejected")]
    JoinRequestRejected,
    #[sea_orm(string_value = "role_changed")]
    RoleChanged,
    #[sea_orm(string_value = "removed_from_group")]
    RemovedFromGroup,
    #[sea_orm(string_value = "system")]
    System,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub notification_type: NotificationType,
    pub message: String,
    pub is_read: bool,
    pub related_khatma_id: Option<i32>,
    pub related_group_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
