use crate::entities::{
    NotificationType, ReadingStatus, RecitationMethod, khatma_entity as khatmas,
    khatma_part_entity as parts, quran_reading_entity as readings,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::khatma_service::{
    PARTS_PER_KHATMA, find_khatma, is_participant, notify_participants_completed,
    refresh_parts_read,
};
use crate::services::{NotificationService, NotificationTarget};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct PartService {
    pool: DatabaseConnection,
}

impl PartService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Creator hands a part to a participant, or takes it back with `None`.
    pub async fn assign(
        &self,
        user_id: i32,
        khatma_id: i32,
        part_number: i32,
        assignee: Option<i32>,
    ) -> AppResult<KhatmaPartResponse> {
        let khatma = find_khatma(&self.pool, khatma_id).await?;
        if khatma.creator_id != user_id {
            return Err(AppError::PermissionDenied(
                "Only the khatma creator can assign parts".to_string(),
            ));
        }
        let part = find_part(&self.pool, khatma_id, part_number).await?;

        if let Some(assignee_id) = assignee
            && !is_participant(&self.pool, khatma_id, assignee_id).await?
        {
            return Err(AppError::ValidationError(
                "Parts can only be assigned to participants".to_string(),
            ));
        }

        let mut am = part.into_active_model();
        am.assigned_to = Set(assignee);
        let updated = am.update(&self.pool).await?;

        if let Some(assignee_id) = assignee
            && assignee_id != user_id
        {
            NotificationService::notify(
                &self.pool,
                assignee_id,
                NotificationType::PartAssigned,
                format!(
                    "You were assigned part {} of the khatma \"{}\".",
                    part_number, khatma.title
                ),
                NotificationTarget::khatma(khatma_id),
            )
            .await?;
        }

        Ok(updated.into())
    }

    /// Completes a part for its assignee. The reading is upserted and the last
    /// completed part closes the khatma.
    pub async fn complete(
        &self,
        user_id: i32,
        khatma_id: i32,
        part_number: i32,
    ) -> AppResult<KhatmaPartResponse> {
        let khatma = find_khatma(&self.pool, khatma_id).await?;
        let part = find_part(&self.pool, khatma_id, part_number).await?;

        let is_creator = khatma.creator_id == user_id;
        if part.assigned_to != Some(user_id) && !is_creator {
            return Err(AppError::PermissionDenied(
                "Only the assignee or the khatma creator can complete this part".to_string(),
            ));
        }
        if part.is_completed {
            return Err(AppError::ValidationError(
                "This part is already completed".to_string(),
            ));
        }

        let reader_id = part.assigned_to.unwrap_or(user_id);
        let now = Utc::now();
        let txn = self.pool.begin().await?;

        // only one concurrent completion may flip the flag
        let flipped = parts::Entity::update_many()
            .col_expr(parts::Column::IsCompleted, Expr::value(true))
            .col_expr(parts::Column::CompletedAt, Expr::value(now))
            .filter(parts::Column::Id.eq(part.id))
            .filter(parts::Column::IsCompleted.eq(false))
            .exec(&txn)
            .await?;
        if flipped.rows_affected == 0 {
            return Err(AppError::ValidationError(
                "This part is already completed".to_string(),
            ));
        }
        let updated = find_part(&txn, khatma_id, part_number).await?;
        let khatma = find_khatma(&txn, khatma_id).await?;

        upsert_completed_reading(&txn, khatma_id, part_number, reader_id).await?;
        refresh_parts_read(&txn, khatma_id, reader_id).await?;

        if khatma.creator_id != user_id {
            NotificationService::notify(
                &txn,
                khatma.creator_id,
                NotificationType::PartCompleted,
                format!("Part {} of \"{}\" was completed.", part_number, khatma.title),
                NotificationTarget::khatma(khatma_id),
            )
            .await?;
        }

        let remaining = parts::Entity::find()
            .filter(parts::Column::KhatmaId.eq(khatma_id))
            .filter(parts::Column::IsCompleted.eq(false))
            .count(&txn)
            .await?;
        if remaining == 0 && !khatma.is_completed {
            let mut am = khatma.into_active_model();
            am.is_completed = Set(true);
            am.completed_at = Set(Some(now));
            let closed = am.update(&txn).await?;
            notify_participants_completed(&txn, &closed).await?;
            log::info!("Khatma completed by its last part: id={}", khatma_id);
        }

        txn.commit().await?;
        Ok(updated.into())
    }

    /// Reopens a completed part. A completed khatma is reopened with it.
    pub async fn uncomplete(
        &self,
        user_id: i32,
        khatma_id: i32,
        part_number: i32,
    ) -> AppResult<KhatmaPartResponse> {
        let khatma = find_khatma(&self.pool, khatma_id).await?;
        if khatma.creator_id != user_id {
            return Err(AppError::PermissionDenied(
                "Only the khatma creator can reopen parts".to_string(),
            ));
        }
        let part = find_part(&self.pool, khatma_id, part_number).await?;
        if !part.is_completed {
            return Err(AppError::ValidationError(
                "This part is not completed".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;

        let mut am = part.into_active_model();
        am.is_completed = Set(false);
        am.completed_at = Set(None);
        let updated = am.update(&txn).await?;

        let completed_readings = readings::Entity::find()
            .filter(readings::Column::KhatmaId.eq(khatma_id))
            .filter(readings::Column::PartNumber.eq(part_number))
            .filter(readings::Column::Status.eq(ReadingStatus::Completed))
            .all(&txn)
            .await?;
        for reading in completed_readings {
            let reader_id = reading.participant_id;
            let mut am = reading.into_active_model();
            am.status = Set(ReadingStatus::InProgress);
            am.completion_date = Set(None);
            am.update(&txn).await?;
            refresh_parts_read(&txn, khatma_id, reader_id).await?;
        }

        if khatma.is_completed {
            reopen_khatma(&txn, khatma).await?;
        }

        txn.commit().await?;
        Ok(updated.into())
    }
}

async fn find_part<C: ConnectionTrait>(
    conn: &C,
    khatma_id: i32,
    part_number: i32,
) -> AppResult<parts::Model> {
    if !(1..=PARTS_PER_KHATMA).contains(&part_number) {
        return Err(AppError::ValidationError(format!(
            "Part number must be between 1 and {PARTS_PER_KHATMA}"
        )));
    }
    parts::Entity::find()
        .filter(parts::Column::KhatmaId.eq(khatma_id))
        .filter(parts::Column::PartNumber.eq(part_number))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Part not found".to_string()))
}

async fn upsert_completed_reading<C: ConnectionTrait>(
    conn: &C,
    khatma_id: i32,
    part_number: i32,
    reader_id: i32,
) -> AppResult<()> {
    let now = Utc::now();
    let existing = readings::Entity::find()
        .filter(readings::Column::KhatmaId.eq(khatma_id))
        .filter(readings::Column::PartNumber.eq(part_number))
        .filter(readings::Column::ParticipantId.eq(reader_id))
        .one(conn)
        .await?;

    match existing {
        Some(reading) => {
            let mut am = reading.into_active_model();
            am.status = Set(ReadingStatus::Completed);
            am.completion_date = Set(Some(now));
            am.update(conn).await?;
        }
        None => {
            readings::ActiveModel {
                khatma_id: Set(khatma_id),
                participant_id: Set(reader_id),
                part_number: Set(part_number),
                status: Set(ReadingStatus::Completed),
                recitation_method: Set(RecitationMethod::Reading),
                start_date: Set(now),
                completion_date: Set(Some(now)),
                ..Default::default()
            }
            .insert(conn)
            .await?;
        }
    }
    Ok(())
}

async fn reopen_khatma<C: ConnectionTrait>(conn: &C, khatma: khatmas::Model) -> AppResult<()> {
    let mut am = khatma.into_active_model();
    am.is_completed = Set(false);
    am.completed_at = Set(None);
    am.update(conn).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::database::test_pool;
    use crate::entities::{notification_entity as notifications, participant_entity as participants};
    use crate::services::KhatmaService;
    use crate::services::test_support::create_user;

    async fn setup(db: &DatabaseConnection) -> (KhatmaService, PartService) {
        (
            KhatmaService::new(db.clone(), SiteConfig::default()),
            PartService::new(db.clone()),
        )
    }

    #[tokio::test]
    async fn test_assign_rules() {
        let db = test_pool().await;
        let (khatmas_svc, parts_svc) = setup(&db).await;
        let creator = create_user(&db, "creator").await;
        let reader = create_user(&db, "reader").await;
        let outsider = create_user(&db, "outsider").await;

        let khatma = khatmas_svc
            .create(creator.id, CreateKhatmaRequest::titled("Assign"))
            .await
            .unwrap();
        khatmas_svc.join(reader.id, khatma.id).await.unwrap();

        assert!(matches!(
            parts_svc.assign(reader.id, khatma.id, 1, Some(reader.id)).await,
            Err(AppError::PermissionDenied(_))
        ));
        assert!(matches!(
            parts_svc
                .assign(creator.id, khatma.id, 1, Some(outsider.id))
                .await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            parts_svc.assign(creator.id, khatma.id, 31, None).await,
            Err(AppError::ValidationError(_))
        ));

        let part = parts_svc
            .assign(creator.id, khatma.id, 1, Some(reader.id))
            .await
            .unwrap();
        assert_eq!(part.assigned_to, Some(reader.id));

        let part = parts_svc.assign(creator.id, khatma.id, 1, None).await.unwrap();
        assert_eq!(part.assigned_to, None);
    }

    #[tokio::test]
    async fn test_complete_by_assignee_records_reading() {
        let db = test_pool().await;
        let (khatmas_svc, parts_svc) = setup(&db).await;
        let creator = create_user(&db, "creator").await;
        let reader = create_user(&db, "reader").await;

        let khatma = khatmas_svc
            .create(creator.id, CreateKhatmaRequest::titled("Complete"))
            .await
            .unwrap();
        khatmas_svc.join(reader.id, khatma.id).await.unwrap();
        parts_svc
            .assign(creator.id, khatma.id, 7, Some(reader.id))
            .await
            .unwrap();

        // unassigned parts are not open to any participant
        assert!(matches!(
            parts_svc.complete(reader.id, khatma.id, 8).await,
            Err(AppError::PermissionDenied(_))
        ));

        let part = parts_svc.complete(reader.id, khatma.id, 7).await.unwrap();
        assert!(part.is_completed);
        assert!(part.completed_at.is_some());

        let reading = readings::Entity::find()
            .filter(readings::Column::KhatmaId.eq(khatma.id))
            .filter(readings::Column::ParticipantId.eq(reader.id))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reading.status, ReadingStatus::Completed);
        assert!(reading.completion_date.unwrap() >= reading.start_date);

        let participant = participants::Entity::find()
            .filter(participants::Column::KhatmaId.eq(khatma.id))
            .filter(participants::Column::UserId.eq(reader.id))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(participant.parts_read, 1);

        assert!(matches!(
            parts_svc.complete(reader.id, khatma.id, 7).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_completes_flip_the_part_once() {
        let db = test_pool().await;
        let (khatmas_svc, parts_svc) = setup(&db).await;
        let creator = create_user(&db, "creator").await;
        let reader = create_user(&db, "reader").await;

        let khatma = khatmas_svc
            .create(creator.id, CreateKhatmaRequest::titled("Race"))
            .await
            .unwrap();
        khatmas_svc.join(reader.id, khatma.id).await.unwrap();
        parts_svc
            .assign(creator.id, khatma.id, 3, Some(reader.id))
            .await
            .unwrap();

        let (first, second) = tokio::join!(
            parts_svc.complete(reader.id, khatma.id, 3),
            parts_svc.complete(reader.id, khatma.id, 3)
        );
        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            outcomes
                .iter()
                .any(|r| matches!(r, Err(AppError::ValidationError(_))))
        );

        let notified = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(creator.id))
            .filter(notifications::Column::NotificationType.eq(NotificationType::PartCompleted))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(notified, 1);
        let recorded = readings::Entity::find()
            .filter(readings::Column::KhatmaId.eq(khatma.id))
            .filter(readings::Column::PartNumber.eq(3))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(recorded, 1);
    }

    #[tokio::test]
    async fn test_last_part_completes_khatma_and_uncomplete_reopens() {
        let db = test_pool().await;
        let (khatmas_svc, parts_svc) = setup(&db).await;
        let creator = create_user(&db, "creator").await;

        let khatma = khatmas_svc
            .create(creator.id, CreateKhatmaRequest::titled("Cycle"))
            .await
            .unwrap();

        for n in 1..=PARTS_PER_KHATMA {
            parts_svc.complete(creator.id, khatma.id, n).await.unwrap();
            let current = find_khatma(&db, khatma.id).await.unwrap();
            assert_eq!(current.is_completed, current.completed_at.is_some());
            assert_eq!(current.is_completed, n == PARTS_PER_KHATMA);
        }

        let part = parts_svc.uncomplete(creator.id, khatma.id, 12).await.unwrap();
        assert!(!part.is_completed);
        assert!(part.completed_at.is_none());

        let reopened = find_khatma(&db, khatma.id).await.unwrap();
        assert!(!reopened.is_completed);
        assert!(reopened.completed_at.is_none());

        let reading = readings::Entity::find()
            .filter(readings::Column::KhatmaId.eq(khatma.id))
            .filter(readings::Column::PartNumber.eq(12))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reading.status, ReadingStatus::InProgress);
        assert!(reading.completion_date.is_none());

        assert!(matches!(
            parts_svc.uncomplete(creator.id, khatma.id, 12).await,
            Err(AppError::ValidationError(_))
        ));
    }
}
