use crate::entities::{
    ReadingStatus, RecitationMethod, deceased_entity as deceased, quran_reading_entity as readings,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::khatma_service::{
    PARTS_PER_KHATMA, find_khatma, is_participant, refresh_parts_read,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct ReadingService {
    pool: DatabaseConnection,
}

impl ReadingService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn start(
        &self,
        user_id: i32,
        request: StartReadingRequest,
    ) -> AppResult<ReadingResponse> {
        if !(1..=PARTS_PER_KHATMA).contains(&request.part_number) {
            return Err(AppError::ValidationError(format!(
                "Part number must be between 1 and {PARTS_PER_KHATMA}"
            )));
        }
        let status = request.status.unwrap_or(ReadingStatus::InProgress);
        if !matches!(status, ReadingStatus::Pending | ReadingStatus::InProgress) {
            return Err(AppError::ValidationError(
                "A reading can only start as pending or in_progress".to_string(),
            ));
        }

        let khatma = find_khatma(&self.pool, request.khatma_id).await?;
        if !is_participant(&self.pool, khatma.id, user_id).await? {
            return Err(AppError::PermissionDenied(
                "Join the khatma before recording readings".to_string(),
            ));
        }
        if let Some(deceased_id) = request.dedicated_to {
            deceased::Entity::find_by_id(deceased_id)
                .one(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound("Deceased not found".to_string()))?;
        }

        let existing = readings::Entity::find()
            .filter(readings::Column::KhatmaId.eq(khatma.id))
            .filter(readings::Column::PartNumber.eq(request.part_number))
            .filter(readings::Column::ParticipantId.eq(user_id))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "You already have a reading for this part".to_string(),
            ));
        }

        let reading = readings::ActiveModel {
            khatma_id: Set(khatma.id),
            participant_id: Set(user_id),
            part_number: Set(request.part_number),
            status: Set(status),
            recitation_method: Set(request
                .recitation_method
                .unwrap_or(RecitationMethod::Reading)),
            start_date: Set(Utc::now()),
            completion_date: Set(None),
            reciter: Set(request.reciter),
            notes: Set(request.notes),
            dua: Set(request.dua),
            dedicated_to: Set(request.dedicated_to),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        Ok(reading.into())
    }

    /// Moves a reading along the status machine.
    pub async fn update_status(
        &self,
        user_id: i32,
        reading_id: i32,
        request: UpdateReadingStatusRequest,
    ) -> AppResult<ReadingResponse> {
        let reading = readings::Entity::find_by_id(reading_id)
            .filter(readings::Column::ParticipantId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Reading not found".to_string()))?;

        if !reading.status.can_transition_to(request.status) {
            return Err(AppError::ValidationError(format!(
                "Cannot move a reading from {} to {}",
                reading.status, request.status
            )));
        }

        let khatma_id = reading.khatma_id;
        let was_completed = reading.status == ReadingStatus::Completed;
        let start_date = reading.start_date;

        let txn = self.pool.begin().await?;
        let mut am = reading.into_active_model();
        am.status = Set(request.status);
        match request.status {
            ReadingStatus::Completed if !was_completed => {
                am.completion_date = Set(Some(Utc::now().max(start_date)));
            }
            ReadingStatus::Completed => {}
            _ => am.completion_date = Set(None),
        }
        if let Some(notes) = request.notes {
            am.notes = Set(Some(notes));
        }
        let updated = am.update(&txn).await?;

        refresh_parts_read(&txn, khatma_id, user_id).await?;
        txn.commit().await?;

        Ok(updated.into())
    }

    /// The caller's own readings.
    pub async fn list(
        &self,
        user_id: i32,
        query: &ReadingQuery,
    ) -> AppResult<PaginatedResponse<ReadingResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut base = readings::Entity::find().filter(readings::Column::ParticipantId.eq(user_id));
        if let Some(khatma_id) = query.khatma_id {
            base = base.filter(readings::Column::KhatmaId.eq(khatma_id));
        }
        if let Some(status) = query.status {
            base = base.filter(readings::Column::Status.eq(status));
        }
        if let Some(method) = query.recitation_method {
            base = base.filter(readings::Column::RecitationMethod.eq(method));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            base = base.filter(
                Condition::any()
                    .add(readings::Column::Notes.contains(search))
                    .add(readings::Column::Reciter.contains(search)),
            );
        }

        let total = base.clone().count(&self.pool).await?;
        let items = base
            .order_by_desc(readings::Column::StartDate)
            .order_by_desc(readings::Column::Id)
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::database::test_pool;
    use crate::entities::participant_entity as participants;
    use crate::services::KhatmaService;
    use crate::services::test_support::create_user;

    fn start_request(khatma_id: i32, part_number: i32) -> StartReadingRequest {
        StartReadingRequest {
            khatma_id,
            part_number,
            status: None,
            recitation_method: None,
            reciter: Some("Al-Husary".to_string()),
            notes: None,
            dua: None,
            dedicated_to: None,
        }
    }

    #[tokio::test]
    async fn test_start_requires_participation_and_is_unique() {
        let db = test_pool().await;
        let khatmas_svc = KhatmaService::new(db.clone(), SiteConfig::default());
        let service = ReadingService::new(db.clone());
        let creator = create_user(&db, "creator").await;
        let outsider = create_user(&db, "outsider").await;

        let khatma = khatmas_svc
            .create(creator.id, CreateKhatmaRequest::titled("Readings"))
            .await
            .unwrap();

        assert!(matches!(
            service.start(outsider.id, start_request(khatma.id, 1)).await,
            Err(AppError::PermissionDenied(_))
        ));

        let reading = service
            .start(creator.id, start_request(khatma.id, 1))
            .await
            .unwrap();
        assert_eq!(reading.status, ReadingStatus::InProgress);
        assert!(reading.completion_date.is_none());

        assert!(matches!(
            service.start(creator.id, start_request(khatma.id, 1)).await,
            Err(AppError::Conflict(_))
        ));

        let mut completed_start = start_request(khatma.id, 2);
        completed_start.status = Some(ReadingStatus::Completed);
        assert!(matches!(
            service.start(creator.id, completed_start).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_status_machine_and_parts_read() {
        let db = test_pool().await;
        let khatmas_svc = KhatmaService::new(db.clone(), SiteConfig::default());
        let service = ReadingService::new(db.clone());
        let creator = create_user(&db, "creator").await;

        let khatma = khatmas_svc
            .create(creator.id, CreateKhatmaRequest::titled("Machine"))
            .await
            .unwrap();
        let mut request = start_request(khatma.id, 3);
        request.status = Some(ReadingStatus::Pending);
        let reading = service.start(creator.id, request).await.unwrap();

        let to = |status| UpdateReadingStatusRequest { status, notes: None };

        assert!(matches!(
            service
                .update_status(creator.id, reading.id, to(ReadingStatus::Completed))
                .await,
            Err(AppError::ValidationError(_))
        ));

        service
            .update_status(creator.id, reading.id, to(ReadingStatus::InProgress))
            .await
            .unwrap();
        let done = service
            .update_status(creator.id, reading.id, to(ReadingStatus::Completed))
            .await
            .unwrap();
        assert!(done.completion_date.unwrap() >= done.start_date);

        let participant = participants::Entity::find()
            .filter(participants::Column::KhatmaId.eq(khatma.id))
            .filter(participants::Column::UserId.eq(creator.id))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(participant.parts_read, 1);

        let reopened = service
            .update_status(creator.id, reading.id, to(ReadingStatus::InProgress))
            .await
            .unwrap();
        assert!(reopened.completion_date.is_none());

        service
            .update_status(creator.id, reading.id, to(ReadingStatus::Skipped))
            .await
            .unwrap();
        assert!(matches!(
            service
                .update_status(creator.id, reading.id, to(ReadingStatus::InProgress))
                .await,
            Err(AppError::ValidationError(_))
        ));
        service
            .update_status(creator.id, reading.id, to(ReadingStatus::Pending))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_pool().await;
        let khatmas_svc = KhatmaService::new(db.clone(), SiteConfig::default());
        let service = ReadingService::new(db.clone());
        let creator = create_user(&db, "creator").await;

        let khatma = khatmas_svc
            .create(creator.id, CreateKhatmaRequest::titled("Filters"))
            .await
            .unwrap();
        service
            .start(creator.id, start_request(khatma.id, 1))
            .await
            .unwrap();
        let mut listening = start_request(khatma.id, 2);
        listening.recitation_method = Some(RecitationMethod::Listening);
        listening.reciter = Some("Mishary".to_string());
        service.start(creator.id, listening).await.unwrap();

        let all = service
            .list(creator.id, &ReadingQuery::default())
            .await
            .unwrap();
        assert_eq!(all.total, 2);

        let by_method = service
            .list(
                creator.id,
                &ReadingQuery {
                    recitation_method: Some(RecitationMethod::Listening),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_method.total, 1);

        let by_search = service
            .list(
                creator.id,
                &ReadingQuery {
                    search: Some("Husary".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_search.total, 1);
        assert_eq!(by_search.data[0].part_number, 1);
    }
}
