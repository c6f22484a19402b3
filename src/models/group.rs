use crate::entities::{
    JoinRequestStatus, MembershipRole, join_request_entity, reading_group_entity,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    #[schema(example = "Friday readers")]
    pub name: String,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub allow_join_requests: Option<bool>,
    /// 0 means unlimited.
    pub max_members: Option<i32>,
    pub enable_khatma_creation: Option<bool>,
}

impl CreateGroupRequest {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            is_public: None,
            allow_join_requests: None,
            max_members: None,
            enable_khatma_creation: None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
    pub allow_join_requests: Option<bool>,
    pub max_members: Option<i32>,
    pub enable_khatma_creation: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GroupQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// Matches name or description.
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: i32,
    pub is_active: bool,
    pub is_public: bool,
    pub allow_join_requests: bool,
    pub max_members: i32,
    pub enable_khatma_creation: bool,
    pub created_at: DateTime<Utc>,
}

impl From<reading_group_entity::Model> for GroupResponse {
    fn from(g: reading_group_entity::Model) -> Self {
        Self {
            id: g.id,
            name: g.name,
            description: g.description,
            creator_id: g.creator_id,
            is_active: g.is_active,
            is_public: g.is_public,
            allow_join_requests: g.allow_join_requests,
            max_members: g.max_members,
            enable_khatma_creation: g.enable_khatma_creation,
            created_at: g.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupDetailResponse {
    pub group: GroupResponse,
    pub members_count: u64,
    pub active_khatmas: u64,
    pub completed_khatmas: u64,
    /// Caller's role, when they hold an active membership.
    pub my_role: Option<MembershipRole>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct JoinGroupRequest {
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JoinGroupOutcome {
    Joined,
    Pending,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JoinGroupResponse {
    pub outcome: JoinGroupOutcome,
    pub group_id: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberResponse {
    pub user_id: i32,
    pub username: String,
    pub role: MembershipRole,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    pub role: MembershipRole,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetMemberActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcessJoinRequestRequest {
    pub approve: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct JoinRequestQuery {
    pub status: Option<JoinRequestStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JoinRequestResponse {
    pub id: i32,
    pub group_id: i32,
    pub user_id: i32,
    pub message: Option<String>,
    pub status: JoinRequestStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<i32>,
}

impl From<join_request_entity::Model> for JoinRequestResponse {
    fn from(r: join_request_entity::Model) -> Self {
        Self {
            id: r.id,
            group_id: r.group_id,
            user_id: r.user_id,
            message: r.message,
            status: r.status,
            created_at: r.created_at,
            processed_at: r.processed_at,
            processed_by: r.processed_by,
        }
    }
}
