use crate::entities::{NotificationType, notification_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i32,
    pub notification_type: NotificationType,
    pub message: String,
    pub is_read: bool,
    pub related_khatma_id: Option<i32>,
    pub related_group_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<notification_entity::Model> for NotificationResponse {
    fn from(n: notification_entity::Model) -> Self {
        Self {
            id: n.id,
            notification_type: n.notification_type,
            message: n.message,
            is_read: n.is_read,
            related_khatma_id: n.related_khatma_id,
            related_group_id: n.related_group_id,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountResponse {
    pub count: u64,
}
