use crate::entities::{NotificationType, notification_entity as notifications};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// Links a notification back to what it is about.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationTarget {
    pub khatma_id: Option<i32>,
    pub group_id: Option<i32>,
}

impl NotificationTarget {
    pub fn khatma(khatma_id: i32) -> Self {
        Self {
            khatma_id: Some(khatma_id),
            group_id: None,
        }
    }

    pub fn group(group_id: i32) -> Self {
        Self {
            khatma_id: None,
            group_id: Some(group_id),
        }
    }
}

#[derive(Clone)]
pub struct NotificationService {
    pool: DatabaseConnection,
}

impl NotificationService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Records a notification on any connection, including an open transaction.
    pub async fn notify<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
        notification_type: NotificationType,
        message: impl Into<String>,
        target: NotificationTarget,
    ) -> Result<notifications::Model, DbErr> {
        notifications::ActiveModel {
            user_id: Set(user_id),
            notification_type: Set(notification_type),
            message: Set(message.into()),
            is_read: Set(false),
            related_khatma_id: Set(target.khatma_id),
            related_group_id: Set(target.group_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await
    }

    pub async fn list(
        &self,
        user_id: i32,
        query: &NotificationQuery,
    ) -> AppResult<PaginatedResponse<NotificationResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut base_query =
            notifications::Entity::find().filter(notifications::Column::UserId.eq(user_id));
        if query.unread_only {
            base_query = base_query.filter(notifications::Column::IsRead.eq(false));
        }

        let total = base_query.clone().count(&self.pool).await?;

        let items = base_query
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            &params,
            total,
        ))
    }

    pub async fn unread_count(&self, user_id: i32) -> AppResult<UnreadCountResponse> {
        let count = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .count(&self.pool)
            .await?;
        Ok(UnreadCountResponse { count })
    }

    pub async fn mark_read(
        &self,
        user_id: i32,
        notification_id: i32,
    ) -> AppResult<NotificationResponse> {
        let notification = self.find_owned(user_id, notification_id).await?;
        if notification.is_read {
            return Ok(notification.into());
        }
        let mut am: notifications::ActiveModel = notification.into();
        am.is_read = Set(true);
        let updated = am.update(&self.pool).await?;
        Ok(updated.into())
    }

    pub async fn mark_all_read(&self, user_id: i32) -> AppResult<AffectedResponse> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(&self.pool)
            .await?;
        Ok(AffectedResponse {
            affected: result.rows_affected,
        })
    }

    pub async fn delete(&self, user_id: i32, notification_id: i32) -> AppResult<()> {
        let notification = self.find_owned(user_id, notification_id).await?;
        notifications::Entity::delete_by_id(notification.id)
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_all(&self, user_id: i32) -> AppResult<AffectedResponse> {
        let result = notifications::Entity::delete_many()
            .filter(notifications::Column::UserId.eq(user_id))
            .exec(&self.pool)
            .await?;
        Ok(AffectedResponse {
            affected: result.rows_affected,
        })
    }

    async fn find_owned(
        &self,
        user_id: i32,
        notification_id: i32,
    ) -> AppResult<notifications::Model> {
        notifications::Entity::find_by_id(notification_id)
            .filter(notifications::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::services::test_support::create_user;

    #[tokio::test]
    async fn test_list_and_mark_read() {
        let db = test_pool().await;
        let service = NotificationService::new(db.clone());
        let user = create_user(&db, "reader").await;
        let other = create_user(&db, "other").await;

        for i in 0..3 {
            NotificationService::notify(
                &db,
                user.id,
                NotificationType::System,
                format!("message {i}"),
                NotificationTarget::default(),
            )
            .await
            .unwrap();
        }
        NotificationService::notify(
            &db,
            other.id,
            NotificationType::System,
            "not yours",
            NotificationTarget::default(),
        )
        .await
        .unwrap();

        let page = service
            .list(user.id, &NotificationQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(service.unread_count(user.id).await.unwrap().count, 3);

        let first = page.data[0].id;
        let read = service.mark_read(user.id, first).await.unwrap();
        assert!(read.is_read);
        assert_eq!(service.unread_count(user.id).await.unwrap().count, 2);

        let unread_only = NotificationQuery {
            unread_only: true,
            ..Default::default()
        };
        assert_eq!(service.list(user.id, &unread_only).await.unwrap().total, 2);

        let affected = service.mark_all_read(user.id).await.unwrap();
        assert_eq!(affected.affected, 2);
        assert_eq!(service.unread_count(user.id).await.unwrap().count, 0);
        assert_eq!(service.unread_count(other.id).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_cannot_touch_other_users_notifications() {
        let db = test_pool().await;
        let service = NotificationService::new(db.clone());
        let owner = create_user(&db, "owner").await;
        let intruder = create_user(&db, "intruder").await;

        let n = NotificationService::notify(
            &db,
            owner.id,
            NotificationType::System,
            "hello",
            NotificationTarget::default(),
        )
        .await
        .unwrap();

        assert!(matches!(
            service.mark_read(intruder.id, n.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(intruder.id, n.id).await,
            Err(AppError::NotFound(_))
        ));

        service.delete(owner.id, n.id).await.unwrap();
        assert_eq!(service.delete_all(owner.id).await.unwrap().affected, 0);
    }
}
