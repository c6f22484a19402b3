use crate::config::SiteConfig;
use crate::entities::{
    KhatmaType, KhatmaVisibility, NotificationType, ReadingStatus, ReminderFrequency,
    deceased_entity as deceased, group_membership_entity as memberships,
    khatma_entity as khatmas, khatma_part_entity as parts, participant_entity as participants,
    quran_reading_entity as readings, reading_group_entity as groups, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{NotificationService, NotificationTarget};
use crate::utils::{format_hashtags, validate_max_len, validate_not_blank};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    Set, TransactionTrait,
};
use uuid::Uuid;

pub use crate::entities::khatma_parts::PARTS_PER_KHATMA;

const DEFAULT_HASHTAGS: &str = "#Khatma #Quran";

#[derive(Clone)]
pub struct KhatmaService {
    pool: DatabaseConnection,
    site: SiteConfig,
}

impl KhatmaService {
    pub fn new(pool: DatabaseConnection, site: SiteConfig) -> Self {
        Self { pool, site }
    }

    /// Creates the khatma, its 30 parts and the creator's participation in
    /// one transaction.
    pub async fn create(
        &self,
        user_id: i32,
        request: CreateKhatmaRequest,
    ) -> AppResult<KhatmaResponse> {
        let title = request.title.trim().to_string();
        validate_not_blank("title", &title)?;
        validate_max_len("title", &title, 200)?;
        if request.max_participants.is_some_and(|n| n < 0) {
            return Err(AppError::ValidationError(
                "max_participants cannot be negative".to_string(),
            ));
        }
        if let Some(target) = request.target_completion_date
            && target < Utc::now().date_naive()
        {
            return Err(AppError::ValidationError(
                "Target completion date cannot be in the past".to_string(),
            ));
        }

        let khatma_type = request.khatma_type.clone().unwrap_or(KhatmaType::Regular);
        match (&khatma_type, request.deceased_id) {
            (KhatmaType::Memorial, None) => {
                return Err(AppError::ValidationError(
                    "A memorial khatma needs a deceased person".to_string(),
                ));
            }
            (_, Some(deceased_id)) => {
                deceased::Entity::find_by_id(deceased_id)
                    .filter(deceased::Column::AddedBy.eq(user_id))
                    .one(&self.pool)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Deceased not found".to_string()))?;
            }
            _ => {}
        }

        if let Some(group_id) = request.group_id {
            self.check_group_khatma_allowed(user_id, group_id).await?;
        }

        if self.title_taken(&title, None).await? {
            return Err(AppError::Conflict(
                "A khatma with this title already exists".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;
        let khatma = insert_khatma(
            &txn,
            user_id,
            CreateKhatmaRequest {
                title,
                khatma_type: Some(khatma_type),
                ..request
            },
            Utc::now(),
        )
        .await?;
        NotificationService::notify(
            &txn,
            user_id,
            NotificationType::KhatmaProgress,
            format!("Your khatma \"{}\" was created with {PARTS_PER_KHATMA} parts.", khatma.title),
            NotificationTarget::khatma(khatma.id),
        )
        .await?;
        txn.commit().await?;

        log::info!("Khatma created: id={} creator={}", khatma.id, user_id);
        Ok(khatma.into())
    }

    /// Private khatmas are only visible to their creator and participants.
    pub async fn get(&self, viewer: Option<i32>, khatma_id: i32) -> AppResult<KhatmaDetailResponse> {
        let khatma = find_khatma(&self.pool, khatma_id).await?;
        self.ensure_can_view(viewer, &khatma).await?;
        self.detail(khatma).await
    }

    pub async fn get_shared(&self, sharing_link: &str) -> AppResult<KhatmaDetailResponse> {
        let khatma = khatmas::Entity::find()
            .filter(khatmas::Column::SharingLink.eq(sharing_link))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Khatma not found".to_string()))?;
        self.detail(khatma).await
    }

    pub async fn list_public(
        &self,
        query: &KhatmaQuery,
    ) -> AppResult<PaginatedResponse<KhatmaResponse>> {
        let base = khatmas::Entity::find().filter(khatmas::Column::IsPublic.eq(true));
        self.paginate(apply_filters(base, query), query).await
    }

    /// Khatmas the user created or participates in.
    pub async fn list_mine(
        &self,
        user_id: i32,
        query: &KhatmaQuery,
    ) -> AppResult<PaginatedResponse<KhatmaResponse>> {
        let joined: Vec<i32> = participants::Entity::find()
            .filter(participants::Column::UserId.eq(user_id))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| p.khatma_id)
            .collect();

        let base = khatmas::Entity::find().filter(
            Condition::any()
                .add(khatmas::Column::CreatorId.eq(user_id))
                .add(khatmas::Column::Id.is_in(joined)),
        );
        self.paginate(apply_filters(base, query), query).await
    }

    pub async fn update(
        &self,
        user_id: i32,
        khatma_id: i32,
        request: UpdateKhatmaRequest,
    ) -> AppResult<KhatmaResponse> {
        let khatma = self.find_as_creator(user_id, khatma_id).await?;

        let mut am = khatma.into_active_model();
        if let Some(title) = request.title {
            let title = title.trim().to_string();
            validate_not_blank("title", &title)?;
            validate_max_len("title", &title, 200)?;
            if self.title_taken(&title, Some(khatma_id)).await? {
                return Err(AppError::Conflict(
                    "A khatma with this title already exists".to_string(),
                ));
            }
            am.title = Set(title);
        }
        if let Some(description) = request.description {
            am.description = Set(Some(description));
        }
        if let Some(is_public) = request.is_public {
            am.is_public = Set(is_public);
        }
        if let Some(visibility) = request.visibility {
            am.visibility = Set(visibility);
        }
        if let Some(target) = request.target_completion_date {
            if target < Utc::now().date_naive() {
                return Err(AppError::ValidationError(
                    "Target completion date cannot be in the past".to_string(),
                ));
            }
            am.target_completion_date = Set(Some(target));
        }
        if let Some(max) = request.max_participants {
            if max < 0 {
                return Err(AppError::ValidationError(
                    "max_participants cannot be negative".to_string(),
                ));
            }
            am.max_participants = Set(max);
        }
        if let Some(hashtags) = request.social_media_hashtags {
            am.social_media_hashtags = Set(Some(hashtags));
        }
        if let Some(allow) = request.allow_comments {
            am.allow_comments = Set(allow);
        }
        if let Some(send) = request.send_reminders {
            am.send_reminders = Set(send);
        }
        if let Some(freq) = request.reminder_frequency {
            am.reminder_frequency = Set(freq);
        }
        if let Some(prayer) = request.memorial_prayer {
            am.memorial_prayer = Set(Some(prayer));
        }

        let updated = am.update(&self.pool).await?;
        Ok(updated.into())
    }

    /// Parts, participants and readings go with the khatma.
    pub async fn delete(&self, user_id: i32, khatma_id: i32) -> AppResult<()> {
        let khatma = self.find_as_creator(user_id, khatma_id).await?;
        khatmas::Entity::delete_by_id(khatma.id)
            .exec(&self.pool)
            .await?;
        log::info!("Khatma deleted: id={} by user={}", khatma_id, user_id);
        Ok(())
    }

    /// Marks every part and the khatma itself as completed.
    pub async fn complete(&self, user_id: i32, khatma_id: i32) -> AppResult<KhatmaResponse> {
        let khatma = self.find_as_creator(user_id, khatma_id).await?;
        if khatma.is_completed {
            return Ok(khatma.into());
        }

        let now = Utc::now();
        let txn = self.pool.begin().await?;

        parts::Entity::update_many()
            .col_expr(parts::Column::IsCompleted, Expr::value(true))
            .col_expr(parts::Column::CompletedAt, Expr::value(now))
            .filter(parts::Column::KhatmaId.eq(khatma_id))
            .filter(parts::Column::IsCompleted.eq(false))
            .exec(&txn)
            .await?;

        let mut am = khatma.into_active_model();
        am.is_completed = Set(true);
        am.completed_at = Set(Some(now));
        let updated = am.update(&txn).await?;

        notify_participants_completed(&txn, &updated).await?;
        txn.commit().await?;

        log::info!("Khatma completed: id={}", khatma_id);
        Ok(updated.into())
    }

    /// Share URL and social message; creates the sharing link on first use.
    pub async fn share(&self, user_id: i32, khatma_id: i32) -> AppResult<ShareKhatmaResponse> {
        let khatma = find_khatma(&self.pool, khatma_id).await?;
        if khatma.creator_id != user_id && !is_participant(&self.pool, khatma_id, user_id).await? {
            return Err(AppError::PermissionDenied(
                "Only the creator or participants can share this khatma".to_string(),
            ));
        }

        let khatma = match khatma.sharing_link {
            Some(_) => khatma,
            None => {
                let mut am = khatma.into_active_model();
                am.sharing_link = Set(Some(Uuid::new_v4().to_string()));
                am.update(&self.pool).await?
            }
        };
        let sharing_link = khatma.sharing_link.clone().unwrap_or_default();

        let share_url = format!(
            "{}/khatma/shared/{}",
            self.site.base_url.trim_end_matches('/'),
            sharing_link
        );
        let custom = khatma
            .social_media_hashtags
            .as_deref()
            .map(format_hashtags)
            .unwrap_or_default();
        let hashtags = if custom.is_empty() {
            DEFAULT_HASHTAGS.to_string()
        } else {
            format!("{custom} {DEFAULT_HASHTAGS}")
        };
        let message = format!(
            "Join me in completing the khatma \"{}\" on {}: {} {}",
            khatma.title, self.site.name, share_url, hashtags
        );

        Ok(ShareKhatmaResponse {
            sharing_link,
            share_url,
            message,
            hashtags,
        })
    }

    pub async fn progress(
        &self,
        viewer: Option<i32>,
        khatma_id: i32,
    ) -> AppResult<KhatmaProgressResponse> {
        let khatma = find_khatma(&self.pool, khatma_id).await?;
        self.ensure_can_view(viewer, &khatma).await?;
        build_progress(&self.pool, &khatma).await
    }

    pub async fn join(&self, user_id: i32, khatma_id: i32) -> AppResult<ParticipantResponse> {
        let khatma = find_khatma(&self.pool, khatma_id).await?;
        if is_participant(&self.pool, khatma_id, user_id).await? {
            return Err(AppError::Conflict(
                "You are already participating in this khatma".to_string(),
            ));
        }
        if khatma.max_participants > 0 {
            let current = participants::Entity::find()
                .filter(participants::Column::KhatmaId.eq(khatma_id))
                .count(&self.pool)
                .await?;
            if current >= khatma.max_participants as u64 {
                return Err(AppError::ValidationError(
                    "This khatma has reached its participant limit".to_string(),
                ));
            }
        }

        let user = find_user(&self.pool, user_id).await?;
        let participant = participants::ActiveModel {
            khatma_id: Set(khatma_id),
            user_id: Set(user_id),
            parts_read: Set(0),
            joined_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        if khatma.creator_id != user_id {
            NotificationService::notify(
                &self.pool,
                khatma.creator_id,
                NotificationType::KhatmaProgress,
                format!("{} joined your khatma \"{}\".", user.username, khatma.title),
                NotificationTarget::khatma(khatma_id),
            )
            .await?;
        }

        Ok(ParticipantResponse {
            user_id,
            username: user.username,
            parts_read: participant.parts_read,
            joined_at: participant.joined_at,
            is_creator: khatma.creator_id == user_id,
        })
    }

    pub async fn leave(&self, user_id: i32, khatma_id: i32) -> AppResult<()> {
        let khatma = find_khatma(&self.pool, khatma_id).await?;
        if khatma.creator_id == user_id {
            return Err(AppError::ValidationError(
                "The creator cannot leave the khatma; delete it instead".to_string(),
            ));
        }
        if !is_participant(&self.pool, khatma_id, user_id).await? {
            return Err(AppError::NotFound(
                "You are not participating in this khatma".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;
        drop_participant(&txn, khatma_id, user_id).await?;
        txn.commit().await?;
        Ok(())
    }

    pub async fn participants(
        &self,
        user_id: i32,
        khatma_id: i32,
    ) -> AppResult<Vec<ParticipantResponse>> {
        let khatma = self.find_as_creator(user_id, khatma_id).await?;

        let rows = participants::Entity::find()
            .filter(participants::Column::KhatmaId.eq(khatma_id))
            .order_by_asc(participants::Column::JoinedAt)
            .order_by_asc(participants::Column::Id)
            .all(&self.pool)
            .await?;
        let user_ids: Vec<i32> = rows.iter().map(|p| p.user_id).collect();
        let names: std::collections::HashMap<i32, String> = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        Ok(rows
            .into_iter()
            .map(|p| ParticipantResponse {
                username: names.get(&p.user_id).cloned().unwrap_or_default(),
                is_creator: p.user_id == khatma.creator_id,
                user_id: p.user_id,
                parts_read: p.parts_read,
                joined_at: p.joined_at,
            })
            .collect())
    }

    pub async fn remove_participant(
        &self,
        user_id: i32,
        khatma_id: i32,
        target_user_id: i32,
    ) -> AppResult<()> {
        let khatma = self.find_as_creator(user_id, khatma_id).await?;
        if target_user_id == khatma.creator_id {
            return Err(AppError::ValidationError(
                "The creator cannot be removed from the khatma".to_string(),
            ));
        }
        if !is_participant(&self.pool, khatma_id, target_user_id).await? {
            return Err(AppError::NotFound("Participant not found".to_string()));
        }

        let txn = self.pool.begin().await?;
        drop_participant(&txn, khatma_id, target_user_id).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn detail(&self, khatma: khatmas::Model) -> AppResult<KhatmaDetailResponse> {
        let part_rows = parts::Entity::find()
            .filter(parts::Column::KhatmaId.eq(khatma.id))
            .order_by_asc(parts::Column::PartNumber)
            .all(&self.pool)
            .await?;
        let participants_count = participants::Entity::find()
            .filter(participants::Column::KhatmaId.eq(khatma.id))
            .count(&self.pool)
            .await?;
        let progress = build_progress(&self.pool, &khatma).await?;

        Ok(KhatmaDetailResponse {
            khatma: khatma.into(),
            parts: part_rows.into_iter().map(Into::into).collect(),
            participants_count,
            progress,
        })
    }

    async fn paginate(
        &self,
        query_builder: Select<khatmas::Entity>,
        query: &KhatmaQuery,
    ) -> AppResult<PaginatedResponse<KhatmaResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);
        let total = query_builder.clone().count(&self.pool).await?;
        let items = query_builder
            .order_by_desc(khatmas::Column::CreatedAt)
            .order_by_desc(khatmas::Column::Id)
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

    async fn ensure_can_view(&self, viewer: Option<i32>, khatma: &khatmas::Model) -> AppResult<()> {
        if khatma.is_public {
            return Ok(());
        }
        if let Some(uid) = viewer
            && (uid == khatma.creator_id || is_participant(&self.pool, khatma.id, uid).await?)
        {
            return Ok(());
        }
        Err(AppError::PermissionDenied(
            "This khatma is private".to_string(),
        ))
    }

    async fn find_as_creator(&self, user_id: i32, khatma_id: i32) -> AppResult<khatmas::Model> {
        let khatma = find_khatma(&self.pool, khatma_id).await?;
        if khatma.creator_id != user_id {
            return Err(AppError::PermissionDenied(
                "Only the khatma creator can do this".to_string(),
            ));
        }
        Ok(khatma)
    }

    async fn title_taken(&self, title: &str, except_id: Option<i32>) -> AppResult<bool> {
        let mut query = khatmas::Entity::find().filter(khatmas::Column::Title.eq(title));
        if let Some(id) = except_id {
            query = query.filter(khatmas::Column::Id.ne(id));
        }
        Ok(query.one(&self.pool).await?.is_some())
    }

    async fn check_group_khatma_allowed(&self, user_id: i32, group_id: i32) -> AppResult<()> {
        let group = groups::Entity::find_by_id(group_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;
        if !group.is_active || !group.enable_khatma_creation {
            return Err(AppError::PermissionDenied(
                "This group does not allow khatma creation".to_string(),
            ));
        }
        let member = memberships::Entity::find()
            .filter(memberships::Column::GroupId.eq(group_id))
            .filter(memberships::Column::UserId.eq(user_id))
            .filter(memberships::Column::IsActive.eq(true))
            .one(&self.pool)
            .await?;
        if member.is_none() {
            return Err(AppError::PermissionDenied(
                "Only active group members can create group khatmas".to_string(),
            ));
        }
        Ok(())
    }
}

fn apply_filters(mut select: Select<khatmas::Entity>, query: &KhatmaQuery) -> Select<khatmas::Entity> {
    if let Some(khatma_type) = &query.khatma_type {
        select = select.filter(khatmas::Column::KhatmaType.eq(khatma_type.clone()));
    }
    if let Some(done) = query.is_completed {
        select = select.filter(khatmas::Column::IsCompleted.eq(done));
    }
    if let Some(group_id) = query.group_id {
        select = select.filter(khatmas::Column::GroupId.eq(group_id));
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        select = select.filter(
            Condition::any()
                .add(khatmas::Column::Title.contains(search))
                .add(khatmas::Column::Description.contains(search)),
        );
    }
    select
}

/// Inserts a khatma with a fresh sharing link, its parts and the creator's
/// participation. Callers validate and own the transaction.
pub(crate) async fn insert_khatma<C: ConnectionTrait>(
    conn: &C,
    creator_id: i32,
    request: CreateKhatmaRequest,
    now: DateTime<Utc>,
) -> Result<khatmas::Model, DbErr> {
    let khatma = khatmas::ActiveModel {
        title: Set(request.title),
        description: Set(request.description),
        creator_id: Set(creator_id),
        deceased_id: Set(request.deceased_id),
        group_id: Set(request.group_id),
        is_group_khatma: Set(request.group_id.is_some()),
        is_public: Set(request.is_public.unwrap_or(false)),
        created_at: Set(now),
        khatma_type: Set(request.khatma_type.unwrap_or(KhatmaType::Regular)),
        target_completion_date: Set(request.target_completion_date),
        is_completed: Set(false),
        completed_at: Set(None),
        sharing_link: Set(Some(Uuid::new_v4().to_string())),
        visibility: Set(request.visibility.unwrap_or(KhatmaVisibility::Public)),
        allow_comments: Set(request.allow_comments.unwrap_or(true)),
        social_media_hashtags: Set(request.social_media_hashtags),
        max_participants: Set(request.max_participants.unwrap_or(0)),
        send_reminders: Set(request.send_reminders.unwrap_or(true)),
        reminder_frequency: Set(request.reminder_frequency.unwrap_or(ReminderFrequency::Weekly)),
        memorial_prayer: Set(request.memorial_prayer),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    let part_rows = (1..=PARTS_PER_KHATMA).map(|part_number| parts::ActiveModel {
        khatma_id: Set(khatma.id),
        part_number: Set(part_number),
        is_completed: Set(false),
        completed_at: Set(None),
        assigned_to: Set(None),
        ..Default::default()
    });
    parts::Entity::insert_many(part_rows).exec(conn).await?;

    participants::ActiveModel {
        khatma_id: Set(khatma.id),
        user_id: Set(creator_id),
        parts_read: Set(0),
        joined_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok(khatma)
}

pub(crate) async fn find_khatma<C: ConnectionTrait>(
    conn: &C,
    khatma_id: i32,
) -> AppResult<khatmas::Model> {
    khatmas::Entity::find_by_id(khatma_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Khatma not found".to_string()))
}

pub(crate) async fn find_user<C: ConnectionTrait>(conn: &C, user_id: i32) -> AppResult<users::Model> {
    users::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub(crate) async fn is_participant<C: ConnectionTrait>(
    conn: &C,
    khatma_id: i32,
    user_id: i32,
) -> Result<bool, DbErr> {
    let found = participants::Entity::find()
        .filter(participants::Column::KhatmaId.eq(khatma_id))
        .filter(participants::Column::UserId.eq(user_id))
        .one(conn)
        .await?;
    Ok(found.is_some())
}

/// Recomputes `parts_read` from the user's completed readings in the khatma.
pub(crate) async fn refresh_parts_read<C: ConnectionTrait>(
    conn: &C,
    khatma_id: i32,
    user_id: i32,
) -> Result<(), DbErr> {
    let completed = readings::Entity::find()
        .filter(readings::Column::KhatmaId.eq(khatma_id))
        .filter(readings::Column::ParticipantId.eq(user_id))
        .filter(readings::Column::Status.eq(ReadingStatus::Completed))
        .count(conn)
        .await?;

    participants::Entity::update_many()
        .col_expr(participants::Column::PartsRead, Expr::value(completed as i32))
        .filter(participants::Column::KhatmaId.eq(khatma_id))
        .filter(participants::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    Ok(())
}

pub(crate) async fn build_progress<C: ConnectionTrait>(
    conn: &C,
    khatma: &khatmas::Model,
) -> AppResult<KhatmaProgressResponse> {
    let total_parts = parts::Entity::find()
        .filter(parts::Column::KhatmaId.eq(khatma.id))
        .count(conn)
        .await?;
    let completed_parts = parts::Entity::find()
        .filter(parts::Column::KhatmaId.eq(khatma.id))
        .filter(parts::Column::IsCompleted.eq(true))
        .count(conn)
        .await?;
    let recent = parts::Entity::find()
        .filter(parts::Column::KhatmaId.eq(khatma.id))
        .filter(parts::Column::IsCompleted.eq(true))
        .order_by_desc(parts::Column::CompletedAt)
        .order_by_desc(parts::Column::PartNumber)
        .limit(5)
        .all(conn)
        .await?;

    let progress_percentage = if total_parts == 0 {
        0.0
    } else {
        (completed_parts as f64 * 10000.0 / total_parts as f64).round() / 100.0
    };

    Ok(KhatmaProgressResponse {
        khatma_id: khatma.id,
        total_parts,
        completed_parts,
        progress_percentage,
        is_completed: khatma.is_completed,
        recent_completions: recent.into_iter().map(Into::into).collect(),
    })
}

/// Removes a participation and hands the user's parts back to the pool.
async fn drop_participant<C: ConnectionTrait>(
    conn: &C,
    khatma_id: i32,
    user_id: i32,
) -> Result<(), DbErr> {
    parts::Entity::update_many()
        .col_expr(parts::Column::AssignedTo, Expr::value(Option::<i32>::None))
        .filter(parts::Column::KhatmaId.eq(khatma_id))
        .filter(parts::Column::AssignedTo.eq(user_id))
        .exec(conn)
        .await?;
    participants::Entity::delete_many()
        .filter(participants::Column::KhatmaId.eq(khatma_id))
        .filter(participants::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    Ok(())
}

pub(crate) async fn notify_participants_completed<C: ConnectionTrait>(
    conn: &C,
    khatma: &khatmas::Model,
) -> Result<(), DbErr> {
    let members = participants::Entity::find()
        .filter(participants::Column::KhatmaId.eq(khatma.id))
        .all(conn)
        .await?;
    for member in members {
        NotificationService::notify(
            conn,
            member.user_id,
            NotificationType::KhatmaCompleted,
            format!("Alhamdulillah, the khatma \"{}\" is complete.", khatma.title),
            NotificationTarget::khatma(khatma.id),
        )
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::services::test_support::create_user;

    fn service(db: &DatabaseConnection) -> KhatmaService {
        KhatmaService::new(
            db.clone(),
            SiteConfig {
                base_url: "https://khatma.example/".to_string(),
                name: "Khatma".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_create_builds_parts_and_participation() {
        let db = test_pool().await;
        let service = service(&db);
        let user = create_user(&db, "creator").await;

        let khatma = service
            .create(user.id, CreateKhatmaRequest::titled("First"))
            .await
            .unwrap();
        assert!(!khatma.is_completed);
        assert!(khatma.completed_at.is_none());
        assert!(khatma.sharing_link.is_some());

        let detail = service.get(Some(user.id), khatma.id).await.unwrap();
        assert_eq!(detail.parts.len(), 30);
        assert_eq!(detail.parts[0].part_number, 1);
        assert_eq!(detail.parts[29].part_number, 30);
        assert_eq!(detail.participants_count, 1);
        assert_eq!(detail.progress.completed_parts, 0);
    }

    #[tokio::test]
    async fn test_sharing_links_are_unique() {
        let db = test_pool().await;
        let service = service(&db);
        let user = create_user(&db, "creator").await;

        let a = service
            .create(user.id, CreateKhatmaRequest::titled("A"))
            .await
            .unwrap();
        let b = service
            .create(user.id, CreateKhatmaRequest::titled("B"))
            .await
            .unwrap();
        assert_ne!(a.sharing_link, b.sharing_link);

        // the unique index rejects a duplicate link outright
        let mut am = khatmas::Entity::find_by_id(b.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap()
            .into_active_model();
        am.sharing_link = Set(a.sharing_link.clone());
        let err: AppError = am.update(&db).await.unwrap_err().into();
        assert!(matches!(err, AppError::Conflict(_)));

        let shared = service
            .get_shared(a.sharing_link.as_deref().unwrap())
            .await
            .unwrap();
        assert_eq!(shared.khatma.id, a.id);
    }

    #[tokio::test]
    async fn test_duplicate_title_conflicts() {
        let db = test_pool().await;
        let service = service(&db);
        let user = create_user(&db, "creator").await;

        service
            .create(user.id, CreateKhatmaRequest::titled("Same"))
            .await
            .unwrap();
        assert!(matches!(
            service
                .create(user.id, CreateKhatmaRequest::titled("Same"))
                .await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_memorial_requires_owned_deceased() {
        let db = test_pool().await;
        let service = service(&db);
        let user = create_user(&db, "creator").await;

        let mut request = CreateKhatmaRequest::titled("Memorial");
        request.khatma_type = Some(KhatmaType::Memorial);
        assert!(matches!(
            service.create(user.id, request.clone()).await,
            Err(AppError::ValidationError(_))
        ));

        request.deceased_id = Some(999);
        assert!(matches!(
            service.create(user.id, request).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_private_khatma_visibility() {
        let db = test_pool().await;
        let service = service(&db);
        let creator = create_user(&db, "creator").await;
        let stranger = create_user(&db, "stranger").await;

        let khatma = service
            .create(creator.id, CreateKhatmaRequest::titled("Private"))
            .await
            .unwrap();

        assert!(matches!(
            service.get(None, khatma.id).await,
            Err(AppError::PermissionDenied(_))
        ));
        assert!(matches!(
            service.get(Some(stranger.id), khatma.id).await,
            Err(AppError::PermissionDenied(_))
        ));

        service.join(stranger.id, khatma.id).await.unwrap();
        assert!(service.get(Some(stranger.id), khatma.id).await.is_ok());

        let public = service
            .list_public(&KhatmaQuery::default())
            .await
            .unwrap();
        assert_eq!(public.total, 0);
        let mine = service
            .list_mine(stranger.id, &KhatmaQuery::default())
            .await
            .unwrap();
        assert_eq!(mine.total, 1);
    }

    #[tokio::test]
    async fn test_complete_all_sets_completion_timestamps() {
        let db = test_pool().await;
        let service = service(&db);
        let creator = create_user(&db, "creator").await;
        let other = create_user(&db, "other").await;

        let khatma = service
            .create(creator.id, CreateKhatmaRequest::titled("Done"))
            .await
            .unwrap();
        assert!(matches!(
            service.complete(other.id, khatma.id).await,
            Err(AppError::PermissionDenied(_))
        ));

        let completed = service.complete(creator.id, khatma.id).await.unwrap();
        assert!(completed.is_completed);
        assert!(completed.completed_at.is_some());

        let all_parts = parts::Entity::find()
            .filter(parts::Column::KhatmaId.eq(khatma.id))
            .all(&db)
            .await
            .unwrap();
        assert!(all_parts.iter().all(|p| p.is_completed && p.completed_at.is_some()));

        let progress = service.progress(Some(creator.id), khatma.id).await.unwrap();
        assert_eq!(progress.completed_parts, 30);
        assert_eq!(progress.progress_percentage, 100.0);
        assert_eq!(progress.recent_completions.len(), 5);
    }

    #[tokio::test]
    async fn test_delete_cascades_parts() {
        let db = test_pool().await;
        let service = service(&db);
        let creator = create_user(&db, "creator").await;

        let khatma = service
            .create(creator.id, CreateKhatmaRequest::titled("Gone"))
            .await
            .unwrap();
        service.delete(creator.id, khatma.id).await.unwrap();

        let remaining = parts::Entity::find()
            .filter(parts::Column::KhatmaId.eq(khatma.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
        let remaining = participants::Entity::find()
            .filter(participants::Column::KhatmaId.eq(khatma.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_join_leave_and_limits() {
        let db = test_pool().await;
        let service = service(&db);
        let creator = create_user(&db, "creator").await;
        let a = create_user(&db, "a_user").await;
        let b = create_user(&db, "b_user").await;

        let mut request = CreateKhatmaRequest::titled("Small");
        request.max_participants = Some(2);
        let khatma = service.create(creator.id, request).await.unwrap();

        service.join(a.id, khatma.id).await.unwrap();
        assert!(matches!(
            service.join(a.id, khatma.id).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            service.join(b.id, khatma.id).await,
            Err(AppError::ValidationError(_))
        ));

        assert!(matches!(
            service.leave(creator.id, khatma.id).await,
            Err(AppError::ValidationError(_))
        ));
        service.leave(a.id, khatma.id).await.unwrap();
        service.join(b.id, khatma.id).await.unwrap();

        let list = service.participants(creator.id, khatma.id).await.unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().any(|p| p.is_creator && p.username == "creator"));

        assert!(matches!(
            service
                .remove_participant(creator.id, khatma.id, creator.id)
                .await,
            Err(AppError::ValidationError(_))
        ));
        service
            .remove_participant(creator.id, khatma.id, b.id)
            .await
            .unwrap();
        assert_eq!(
            service.participants(creator.id, khatma.id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_share_builds_url_and_message() {
        let db = test_pool().await;
        let service = service(&db);
        let creator = create_user(&db, "creator").await;
        let stranger = create_user(&db, "stranger").await;

        let mut request = CreateKhatmaRequest::titled("Shared");
        request.social_media_hashtags = Some("ramadan, dua".to_string());
        let khatma = service.create(creator.id, request).await.unwrap();

        assert!(matches!(
            service.share(stranger.id, khatma.id).await,
            Err(AppError::PermissionDenied(_))
        ));

        let share = service.share(creator.id, khatma.id).await.unwrap();
        assert_eq!(Some(share.sharing_link.clone()), khatma.sharing_link);
        assert_eq!(
            share.share_url,
            format!("https://khatma.example/khatma/shared/{}", share.sharing_link)
        );
        assert!(share.hashtags.starts_with("#ramadan #dua"));
        assert!(share.message.contains("\"Shared\""));
    }

    #[tokio::test]
    async fn test_update_is_creator_only() {
        let db = test_pool().await;
        let service = service(&db);
        let creator = create_user(&db, "creator").await;
        let other = create_user(&db, "other").await;

        let khatma = service
            .create(creator.id, CreateKhatmaRequest::titled("Editable"))
            .await
            .unwrap();

        let request = UpdateKhatmaRequest {
            is_public: Some(true),
            ..Default::default()
        };
        assert!(matches!(
            service.update(other.id, khatma.id, request).await,
            Err(AppError::PermissionDenied(_))
        ));

        let updated = service
            .update(
                creator.id,
                khatma.id,
                UpdateKhatmaRequest {
                    is_public: Some(true),
                    description: Some("open to all".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.is_public);
        assert!(!updated.is_completed);
        assert_eq!(
            service
                .list_public(&KhatmaQuery::default())
                .await
                .unwrap()
                .total,
            1
        );
    }

    #[tokio::test]
    async fn test_update_rejects_past_target_date() {
        let db = test_pool().await;
        let service = service(&db);
        let creator = create_user(&db, "creator").await;

        let khatma = service
            .create(creator.id, CreateKhatmaRequest::titled("Dated"))
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        assert!(matches!(
            service
                .update(
                    creator.id,
                    khatma.id,
                    UpdateKhatmaRequest {
                        target_completion_date: Some(today - chrono::Duration::days(1)),
                        ..Default::default()
                    },
                )
                .await,
            Err(AppError::ValidationError(_))
        ));

        let target = today + chrono::Duration::days(10);
        let updated = service
            .update(
                creator.id,
                khatma.id,
                UpdateKhatmaRequest {
                    target_completion_date: Some(target),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.target_completion_date, Some(target));
    }
}
