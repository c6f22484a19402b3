use crate::entities::{
    JoinRequestStatus, MembershipRole, NotificationType, group_membership_entity as memberships,
    join_request_entity as join_requests, khatma_entity as khatmas,
    reading_group_entity as groups, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::khatma_service::find_user;
use crate::services::{NotificationService, NotificationTarget};
use crate::utils::{validate_max_len, validate_not_blank};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    Set, TransactionTrait,
};
use std::collections::HashMap;

#[derive(Clone)]
pub struct GroupService {
    pool: DatabaseConnection,
}

impl GroupService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// The creator becomes the group's first admin.
    pub async fn create(&self, user_id: i32, request: CreateGroupRequest) -> AppResult<GroupResponse> {
        let name = request.name.trim().to_string();
        validate_not_blank("name", &name)?;
        validate_max_len("name", &name, 200)?;
        if request.max_members.is_some_and(|n| n < 0) {
            return Err(AppError::ValidationError(
                "max_members cannot be negative".to_string(),
            ));
        }
        if self.name_taken(&name, None).await? {
            return Err(AppError::Conflict(
                "A group with this name already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let group = groups::ActiveModel {
            name: Set(name),
            description: Set(request.description),
            creator_id: Set(user_id),
            is_active: Set(true),
            is_public: Set(request.is_public.unwrap_or(true)),
            allow_join_requests: Set(request.allow_join_requests.unwrap_or(true)),
            max_members: Set(request.max_members.unwrap_or(0)),
            enable_khatma_creation: Set(request.enable_khatma_creation.unwrap_or(true)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        memberships::ActiveModel {
            group_id: Set(group.id),
            user_id: Set(user_id),
            role: Set(MembershipRole::Admin),
            joined_at: Set(now),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        log::info!("Reading group created: id={} creator={}", group.id, user_id);
        Ok(group.into())
    }

    pub async fn list_public(&self, query: &GroupQuery) -> AppResult<PaginatedResponse<GroupResponse>> {
        let base = groups::Entity::find()
            .filter(groups::Column::IsPublic.eq(true))
            .filter(groups::Column::IsActive.eq(true));
        self.paginate(base, query).await
    }

    /// Groups where the user holds an active membership.
    pub async fn list_mine(
        &self,
        user_id: i32,
        query: &GroupQuery,
    ) -> AppResult<PaginatedResponse<GroupResponse>> {
        let group_ids: Vec<i32> = memberships::Entity::find()
            .filter(memberships::Column::UserId.eq(user_id))
            .filter(memberships::Column::IsActive.eq(true))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|m| m.group_id)
            .collect();
        let base = groups::Entity::find().filter(groups::Column::Id.is_in(group_ids));
        self.paginate(base, query).await
    }

    pub async fn get(&self, user_id: i32, group_id: i32) -> AppResult<GroupDetailResponse> {
        let group = self.find_group(group_id).await?;
        let my_role = active_role(&self.pool, group_id, user_id).await?;
        if !group.is_public && my_role.is_none() && group.creator_id != user_id {
            return Err(AppError::PermissionDenied(
                "This group is private".to_string(),
            ));
        }

        let members_count = count_active_members(&self.pool, group_id).await?;
        let active_khatmas = khatmas::Entity::find()
            .filter(khatmas::Column::GroupId.eq(group_id))
            .filter(khatmas::Column::IsCompleted.eq(false))
            .count(&self.pool)
            .await?;
        let completed_khatmas = khatmas::Entity::find()
            .filter(khatmas::Column::GroupId.eq(group_id))
            .filter(khatmas::Column::IsCompleted.eq(true))
            .count(&self.pool)
            .await?;

        Ok(GroupDetailResponse {
            group: group.into(),
            members_count,
            active_khatmas,
            completed_khatmas,
            my_role,
        })
    }

    pub async fn update(
        &self,
        user_id: i32,
        group_id: i32,
        request: UpdateGroupRequest,
    ) -> AppResult<GroupResponse> {
        let group = self.find_group(group_id).await?;
        self.require_role(group_id, user_id, |role| *role == MembershipRole::Admin)
            .await?;

        let mut am = group.into_active_model();
        if let Some(name) = request.name {
            let name = name.trim().to_string();
            validate_not_blank("name", &name)?;
            validate_max_len("name", &name, 200)?;
            if self.name_taken(&name, Some(group_id)).await? {
                return Err(AppError::Conflict(
                    "A group with this name already exists".to_string(),
                ));
            }
            am.name = Set(name);
        }
        if let Some(description) = request.description {
            am.description = Set(Some(description));
        }
        if let Some(is_active) = request.is_active {
            am.is_active = Set(is_active);
        }
        if let Some(is_public) = request.is_public {
            am.is_public = Set(is_public);
        }
        if let Some(allow) = request.allow_join_requests {
            am.allow_join_requests = Set(allow);
        }
        if let Some(max) = request.max_members {
            if max < 0 {
                return Err(AppError::ValidationError(
                    "max_members cannot be negative".to_string(),
                ));
            }
            am.max_members = Set(max);
        }
        if let Some(enable) = request.enable_khatma_creation {
            am.enable_khatma_creation = Set(enable);
        }

        let updated = am.update(&self.pool).await?;
        Ok(updated.into())
    }

    /// Group khatmas survive without their group.
    pub async fn delete(&self, user_id: i32, group_id: i32) -> AppResult<()> {
        let group = self.find_group(group_id).await?;
        if group.creator_id != user_id {
            return Err(AppError::PermissionDenied(
                "Only the group creator can delete the group".to_string(),
            ));
        }
        groups::Entity::delete_by_id(group.id).exec(&self.pool).await?;
        log::info!("Reading group deleted: id={}", group_id);
        Ok(())
    }

    /// Public groups that accept requests admit immediately; private ones
    /// queue a join request for the moderators.
    pub async fn join(
        &self,
        user_id: i32,
        group_id: i32,
        request: JoinGroupRequest,
    ) -> AppResult<JoinGroupResponse> {
        let group = self.find_group(group_id).await?;
        if !group.is_active {
            return Err(AppError::ValidationError(
                "This group is not active".to_string(),
            ));
        }

        if let Some(membership) = find_membership(&self.pool, group_id, user_id).await? {
            let message = if membership.is_active {
                "You are already a member of this group"
            } else {
                "Your membership in this group is inactive"
            };
            return Err(AppError::Conflict(message.to_string()));
        }
        if !group.allow_join_requests {
            return Err(AppError::PermissionDenied(
                "This group does not accept join requests".to_string(),
            ));
        }
        ensure_capacity(&self.pool, &group).await?;

        let user = find_user(&self.pool, user_id).await?;

        if group.is_public {
            let txn = self.pool.begin().await?;
            add_member(&txn, group_id, user_id).await?;
            NotificationService::notify(
                &txn,
                group.creator_id,
                NotificationType::NewGroupMember,
                format!("{} joined the group \"{}\".", user.username, group.name),
                NotificationTarget::group(group_id),
            )
            .await?;
            txn.commit().await?;
            return Ok(JoinGroupResponse {
                outcome: JoinGroupOutcome::Joined,
                group_id,
            });
        }

        let existing = join_requests::Entity::find()
            .filter(join_requests::Column::GroupId.eq(group_id))
            .filter(join_requests::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?;

        let txn = self.pool.begin().await?;
        match existing {
            Some(previous) if previous.status == JoinRequestStatus::Pending => {
                return Err(AppError::Conflict(
                    "You already have a pending join request for this group".to_string(),
                ));
            }
            // one row per (group, user): a decided request is reopened
            Some(previous) => {
                let mut am = previous.into_active_model();
                am.status = Set(JoinRequestStatus::Pending);
                am.message = Set(request.message);
                am.created_at = Set(Utc::now());
                am.processed_at = Set(None);
                am.processed_by = Set(None);
                am.update(&txn).await?;
            }
            None => {
                join_requests::ActiveModel {
                    group_id: Set(group_id),
                    user_id: Set(user_id),
                    message: Set(request.message),
                    status: Set(JoinRequestStatus::Pending),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }
        }
        NotificationService::notify(
            &txn,
            group.creator_id,
            NotificationType::JoinRequest,
            format!("{} asked to join the group \"{}\".", user.username, group.name),
            NotificationTarget::group(group_id),
        )
        .await?;
        txn.commit().await?;

        Ok(JoinGroupResponse {
            outcome: JoinGroupOutcome::Pending,
            group_id,
        })
    }

    pub async fn leave(&self, user_id: i32, group_id: i32) -> AppResult<()> {
        let group = self.find_group(group_id).await?;
        if group.creator_id == user_id {
            return Err(AppError::ValidationError(
                "The creator cannot leave the group; delete it instead".to_string(),
            ));
        }
        let membership = find_membership(&self.pool, group_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("You are not a member of this group".to_string()))?;
        if !membership.is_active {
            return Err(AppError::Conflict(
                "Your membership in this group is inactive".to_string(),
            ));
        }
        let user = find_user(&self.pool, user_id).await?;

        let txn = self.pool.begin().await?;
        memberships::Entity::delete_by_id(membership.id)
            .exec(&txn)
            .await?;
        NotificationService::notify(
            &txn,
            group.creator_id,
            NotificationType::GroupMemberLeft,
            format!("{} left the group \"{}\".", user.username, group.name),
            NotificationTarget::group(group_id),
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }

    /// Admins see inactive memberships too.
    pub async fn members(&self, user_id: i32, group_id: i32) -> AppResult<Vec<MemberResponse>> {
        let group = self.find_group(group_id).await?;
        let my_role = active_role(&self.pool, group_id, user_id).await?;
        if !group.is_public && my_role.is_none() {
            return Err(AppError::PermissionDenied(
                "This group is private".to_string(),
            ));
        }

        let mut query = memberships::Entity::find().filter(memberships::Column::GroupId.eq(group_id));
        if my_role != Some(MembershipRole::Admin) {
            query = query.filter(memberships::Column::IsActive.eq(true));
        }
        let rows = query
            .order_by_asc(memberships::Column::JoinedAt)
            .order_by_asc(memberships::Column::Id)
            .all(&self.pool)
            .await?;

        let user_ids: Vec<i32> = rows.iter().map(|m| m.user_id).collect();
        let names: HashMap<i32, String> = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        Ok(rows
            .into_iter()
            .map(|m| MemberResponse {
                username: names.get(&m.user_id).cloned().unwrap_or_default(),
                user_id: m.user_id,
                role: m.role,
                is_active: m.is_active,
                joined_at: m.joined_at,
            })
            .collect())
    }

    pub async fn change_role(
        &self,
        user_id: i32,
        group_id: i32,
        target_user_id: i32,
        role: MembershipRole,
    ) -> AppResult<MemberResponse> {
        let group = self.find_group(group_id).await?;
        self.require_role(group_id, user_id, |r| *r == MembershipRole::Admin)
            .await?;
        if target_user_id == group.creator_id {
            return Err(AppError::ValidationError(
                "The creator's role cannot be changed".to_string(),
            ));
        }
        let membership = self.find_member(group_id, target_user_id).await?;
        let target = find_user(&self.pool, target_user_id).await?;

        let mut am = membership.into_active_model();
        am.role = Set(role.clone());
        let updated = am.update(&self.pool).await?;

        NotificationService::notify(
            &self.pool,
            target_user_id,
            NotificationType::RoleChanged,
            format!("Your role in \"{}\" is now {}.", group.name, role),
            NotificationTarget::group(group_id),
        )
        .await?;

        Ok(MemberResponse {
            user_id: target.id,
            username: target.username,
            role: updated.role,
            is_active: updated.is_active,
            joined_at: updated.joined_at,
        })
    }

    /// Moderators may remove plain members only.
    pub async fn remove_member(
        &self,
        user_id: i32,
        group_id: i32,
        target_user_id: i32,
    ) -> AppResult<()> {
        let group = self.find_group(group_id).await?;
        let my_role = self
            .require_role(group_id, user_id, MembershipRole::can_moderate)
            .await?;
        if target_user_id == group.creator_id {
            return Err(AppError::ValidationError(
                "The group creator cannot be removed".to_string(),
            ));
        }
        let membership = self.find_member(group_id, target_user_id).await?;
        if my_role != MembershipRole::Admin && membership.role != MembershipRole::Member {
            return Err(AppError::PermissionDenied(
                "Moderators can only remove members".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;
        memberships::Entity::delete_by_id(membership.id)
            .exec(&txn)
            .await?;
        NotificationService::notify(
            &txn,
            target_user_id,
            NotificationType::RemovedFromGroup,
            format!("You were removed from the group \"{}\".", group.name),
            NotificationTarget::group(group_id),
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }

    pub async fn set_member_active(
        &self,
        user_id: i32,
        group_id: i32,
        target_user_id: i32,
        is_active: bool,
    ) -> AppResult<MemberResponse> {
        let group = self.find_group(group_id).await?;
        self.require_role(group_id, user_id, |r| *r == MembershipRole::Admin)
            .await?;
        if target_user_id == group.creator_id {
            return Err(AppError::ValidationError(
                "The creator's membership cannot be deactivated".to_string(),
            ));
        }
        let membership = self.find_member(group_id, target_user_id).await?;
        if is_active && !membership.is_active {
            ensure_capacity(&self.pool, &group).await?;
        }
        let target = find_user(&self.pool, target_user_id).await?;

        let mut am = membership.into_active_model();
        am.is_active = Set(is_active);
        let updated = am.update(&self.pool).await?;

        Ok(MemberResponse {
            user_id: target.id,
            username: target.username,
            role: updated.role,
            is_active: updated.is_active,
            joined_at: updated.joined_at,
        })
    }

    pub async fn join_requests(
        &self,
        user_id: i32,
        group_id: i32,
        status: Option<JoinRequestStatus>,
    ) -> AppResult<Vec<JoinRequestResponse>> {
        self.find_group(group_id).await?;
        self.require_role(group_id, user_id, MembershipRole::can_moderate)
            .await?;

        let mut query =
            join_requests::Entity::find().filter(join_requests::Column::GroupId.eq(group_id));
        if let Some(status) = status {
            query = query.filter(join_requests::Column::Status.eq(status));
        }
        let rows = query
            .order_by_desc(join_requests::Column::CreatedAt)
            .order_by_desc(join_requests::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn process_join_request(
        &self,
        user_id: i32,
        group_id: i32,
        request_id: i32,
        approve: bool,
    ) -> AppResult<JoinRequestResponse> {
        let group = self.find_group(group_id).await?;
        self.require_role(group_id, user_id, MembershipRole::can_moderate)
            .await?;

        let join_request = join_requests::Entity::find_by_id(request_id)
            .filter(join_requests::Column::GroupId.eq(group_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Join request not found".to_string()))?;
        if join_request.status != JoinRequestStatus::Pending {
            return Err(AppError::ValidationError(
                "This join request was already processed".to_string(),
            ));
        }
        let requester_id = join_request.user_id;
        let existing = find_membership(&self.pool, group_id, requester_id).await?;
        if approve {
            match &existing {
                Some(membership) if !membership.is_active => {
                    return Err(AppError::Conflict(
                        "The requester's membership in this group is inactive".to_string(),
                    ));
                }
                Some(_) => {}
                None => ensure_capacity(&self.pool, &group).await?,
            }
        }

        let txn = self.pool.begin().await?;
        let mut am = join_request.into_active_model();
        am.status = Set(if approve {
            JoinRequestStatus::Approved
        } else {
            JoinRequestStatus::Rejected
        });
        am.processed_at = Set(Some(Utc::now()));
        am.processed_by = Set(Some(user_id));
        let updated = am.update(&txn).await?;

        let (kind, message) = if approve {
            if existing.is_none() {
                add_member(&txn, group_id, requester_id).await?;
            }
            (
                NotificationType::JoinRequestApproved,
                format!("Your request to join \"{}\" was approved.", group.name),
            )
        } else {
            (
                NotificationType::JoinRequestRejected,
                format!("Your request to join \"{}\" was declined.", group.name),
            )
        };
        NotificationService::notify(
            &txn,
            requester_id,
            kind,
            message,
            NotificationTarget::group(group_id),
        )
        .await?;
        txn.commit().await?;

        Ok(updated.into())
    }

    async fn paginate(
        &self,
        mut base: Select<groups::Entity>,
        query: &GroupQuery,
    ) -> AppResult<PaginatedResponse<GroupResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            base = base.filter(
                Condition::any()
                    .add(groups::Column::Name.contains(search))
                    .add(groups::Column::Description.contains(search)),
            );
        }
        let total = base.clone().count(&self.pool).await?;
        let items = base
            .order_by_desc(groups::Column::CreatedAt)
            .order_by_desc(groups::Column::Id)
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

    async fn find_group(&self, group_id: i32) -> AppResult<groups::Model> {
        groups::Entity::find_by_id(group_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Group not found".to_string()))
    }

    async fn find_member(&self, group_id: i32, user_id: i32) -> AppResult<memberships::Model> {
        find_membership(&self.pool, group_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))
    }

    async fn require_role(
        &self,
        group_id: i32,
        user_id: i32,
        allowed: impl Fn(&MembershipRole) -> bool,
    ) -> AppResult<MembershipRole> {
        match active_role(&self.pool, group_id, user_id).await? {
            Some(role) if allowed(&role) => Ok(role),
            _ => Err(AppError::PermissionDenied(
                "You do not have permission to manage this group".to_string(),
            )),
        }
    }

    async fn name_taken(&self, name: &str, except_id: Option<i32>) -> AppResult<bool> {
        let mut query = groups::Entity::find().filter(groups::Column::Name.eq(name));
        if let Some(id) = except_id {
            query = query.filter(groups::Column::Id.ne(id));
        }
        Ok(query.one(&self.pool).await?.is_some())
    }
}

async fn find_membership<C: ConnectionTrait>(
    conn: &C,
    group_id: i32,
    user_id: i32,
) -> Result<Option<memberships::Model>, DbErr> {
    memberships::Entity::find()
        .filter(memberships::Column::GroupId.eq(group_id))
        .filter(memberships::Column::UserId.eq(user_id))
        .one(conn)
        .await
}

async fn active_role<C: ConnectionTrait>(
    conn: &C,
    group_id: i32,
    user_id: i32,
) -> Result<Option<MembershipRole>, DbErr> {
    Ok(find_membership(conn, group_id, user_id)
        .await?
        .filter(|m| m.is_active)
        .map(|m| m.role))
}

async fn count_active_members<C: ConnectionTrait>(conn: &C, group_id: i32) -> Result<u64, DbErr> {
    memberships::Entity::find()
        .filter(memberships::Column::GroupId.eq(group_id))
        .filter(memberships::Column::IsActive.eq(true))
        .count(conn)
        .await
}

/// `max_members` of 0 means unlimited; only active memberships count.
async fn ensure_capacity<C: ConnectionTrait>(conn: &C, group: &groups::Model) -> AppResult<()> {
    if group.max_members > 0
        && count_active_members(conn, group.id).await? >= group.max_members as u64
    {
        return Err(AppError::ValidationError(
            "This group has reached its member limit".to_string(),
        ));
    }
    Ok(())
}

async fn add_member<C: ConnectionTrait>(
    conn: &C,
    group_id: i32,
    user_id: i32,
) -> Result<memberships::Model, DbErr> {
    memberships::ActiveModel {
        group_id: Set(group_id),
        user_id: Set(user_id),
        role: Set(MembershipRole::Member),
        joined_at: Set(Utc::now()),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::database::test_pool;
    use crate::services::KhatmaService;
    use crate::services::test_support::create_user;

    #[tokio::test]
    async fn test_create_makes_creator_admin() {
        let db = test_pool().await;
        let service = GroupService::new(db.clone());
        let creator = create_user(&db, "creator").await;

        let group = service
            .create(creator.id, CreateGroupRequest::named("Readers"))
            .await
            .unwrap();
        let detail = service.get(creator.id, group.id).await.unwrap();
        assert_eq!(detail.members_count, 1);
        assert_eq!(detail.my_role, Some(MembershipRole::Admin));

        assert!(matches!(
            service
                .create(creator.id, CreateGroupRequest::named("Readers"))
                .await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_public_join_and_membership_uniqueness() {
        let db = test_pool().await;
        let service = GroupService::new(db.clone());
        let creator = create_user(&db, "creator").await;
        let member = create_user(&db, "member").await;
        let late = create_user(&db, "late").await;

        let mut request = CreateGroupRequest::named("Open");
        request.max_members = Some(2);
        let group = service.create(creator.id, request).await.unwrap();

        let joined = service
            .join(member.id, group.id, JoinGroupRequest::default())
            .await
            .unwrap();
        assert_eq!(joined.outcome, JoinGroupOutcome::Joined);
        assert!(matches!(
            service
                .join(member.id, group.id, JoinGroupRequest::default())
                .await,
            Err(AppError::Conflict(_))
        ));

        // the unique index backs the service check
        let err: AppError = add_member(&db, group.id, member.id).await.unwrap_err().into();
        assert!(matches!(err, AppError::Conflict(_)));

        assert!(matches!(
            service
                .join(late.id, group.id, JoinGroupRequest::default())
                .await,
            Err(AppError::ValidationError(_))
        ));

        // deactivated members free a seat
        service
            .set_member_active(creator.id, group.id, member.id, false)
            .await
            .unwrap();
        service
            .join(late.id, group.id, JoinGroupRequest::default())
            .await
            .unwrap();
        assert!(matches!(
            service
                .join(member.id, group.id, JoinGroupRequest::default())
                .await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_private_join_request_flow() {
        let db = test_pool().await;
        let service = GroupService::new(db.clone());
        let creator = create_user(&db, "creator").await;
        let applicant = create_user(&db, "applicant").await;

        let mut request = CreateGroupRequest::named("Private");
        request.is_public = Some(false);
        let group = service.create(creator.id, request).await.unwrap();

        assert!(matches!(
            service.get(applicant.id, group.id).await,
            Err(AppError::PermissionDenied(_))
        ));

        let pending = service
            .join(
                applicant.id,
                group.id,
                JoinGroupRequest {
                    message: Some("please".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(pending.outcome, JoinGroupOutcome::Pending);
        assert!(matches!(
            service
                .join(applicant.id, group.id, JoinGroupRequest::default())
                .await,
            Err(AppError::Conflict(_))
        ));

        let requests = service
            .join_requests(creator.id, group.id, Some(JoinRequestStatus::Pending))
            .await
            .unwrap();
        assert_eq!(requests.len(), 1);

        assert!(matches!(
            service
                .process_join_request(applicant.id, group.id, requests[0].id, true)
                .await,
            Err(AppError::PermissionDenied(_))
        ));

        let processed = service
            .process_join_request(creator.id, group.id, requests[0].id, true)
            .await
            .unwrap();
        assert_eq!(processed.status, JoinRequestStatus::Approved);
        assert_eq!(processed.processed_by, Some(creator.id));

        let detail = service.get(applicant.id, group.id).await.unwrap();
        assert_eq!(detail.members_count, 2);
        assert_eq!(detail.my_role, Some(MembershipRole::Member));

        assert!(matches!(
            service
                .process_join_request(creator.id, group.id, requests[0].id, false)
                .await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_deactivated_member_stays_out() {
        let db = test_pool().await;
        let service = GroupService::new(db.clone());
        let creator = create_user(&db, "creator").await;
        let member = create_user(&db, "member").await;

        let group = service
            .create(creator.id, CreateGroupRequest::named("Strict"))
            .await
            .unwrap();
        service
            .join(member.id, group.id, JoinGroupRequest::default())
            .await
            .unwrap();
        service
            .set_member_active(creator.id, group.id, member.id, false)
            .await
            .unwrap();

        assert!(matches!(
            service.leave(member.id, group.id).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            service
                .join(member.id, group.id, JoinGroupRequest::default())
                .await,
            Err(AppError::Conflict(_))
        ));
        let detail = service.get(member.id, group.id).await.unwrap();
        assert_eq!(detail.my_role, None);
    }

    #[tokio::test]
    async fn test_reactivation_respects_member_limit() {
        let db = test_pool().await;
        let service = GroupService::new(db.clone());
        let creator = create_user(&db, "creator").await;
        let member = create_user(&db, "member").await;
        let late = create_user(&db, "late").await;

        let mut request = CreateGroupRequest::named("Small");
        request.max_members = Some(2);
        let group = service.create(creator.id, request).await.unwrap();
        service
            .join(member.id, group.id, JoinGroupRequest::default())
            .await
            .unwrap();
        service
            .set_member_active(creator.id, group.id, member.id, false)
            .await
            .unwrap();
        service
            .join(late.id, group.id, JoinGroupRequest::default())
            .await
            .unwrap();

        assert!(matches!(
            service
                .set_member_active(creator.id, group.id, member.id, true)
                .await,
            Err(AppError::ValidationError(_))
        ));
        assert_eq!(count_active_members(&db, group.id).await.unwrap(), 2);

        // a free seat allows it again
        service.leave(late.id, group.id).await.unwrap();
        let reactivated = service
            .set_member_active(creator.id, group.id, member.id, true)
            .await
            .unwrap();
        assert!(reactivated.is_active);
    }

    #[tokio::test]
    async fn test_approval_refused_for_inactive_membership() {
        let db = test_pool().await;
        let service = GroupService::new(db.clone());
        let creator = create_user(&db, "creator").await;
        let applicant = create_user(&db, "applicant").await;

        let mut request = CreateGroupRequest::named("Closed");
        request.is_public = Some(false);
        let group = service.create(creator.id, request).await.unwrap();
        service
            .join(applicant.id, group.id, JoinGroupRequest::default())
            .await
            .unwrap();

        // the group opens up, the applicant joins directly and is then deactivated
        service
            .update(
                creator.id,
                group.id,
                UpdateGroupRequest {
                    is_public: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        service
            .join(applicant.id, group.id, JoinGroupRequest::default())
            .await
            .unwrap();
        service
            .set_member_active(creator.id, group.id, applicant.id, false)
            .await
            .unwrap();

        let requests = service
            .join_requests(creator.id, group.id, Some(JoinRequestStatus::Pending))
            .await
            .unwrap();
        assert_eq!(requests.len(), 1);
        assert!(matches!(
            service
                .process_join_request(creator.id, group.id, requests[0].id, true)
                .await,
            Err(AppError::Conflict(_))
        ));
        let still_pending = service
            .join_requests(creator.id, group.id, Some(JoinRequestStatus::Pending))
            .await
            .unwrap();
        assert_eq!(still_pending.len(), 1);
    }

    #[tokio::test]
    async fn test_roles_and_removal() {
        let db = test_pool().await;
        let service = GroupService::new(db.clone());
        let creator = create_user(&db, "creator").await;
        let moderator = create_user(&db, "moderator").await;
        let member = create_user(&db, "member").await;

        let group = service
            .create(creator.id, CreateGroupRequest::named("Roles"))
            .await
            .unwrap();
        for user in [&moderator, &member] {
            service
                .join(user.id, group.id, JoinGroupRequest::default())
                .await
                .unwrap();
        }

        assert!(matches!(
            service
                .change_role(member.id, group.id, moderator.id, MembershipRole::Admin)
                .await,
            Err(AppError::PermissionDenied(_))
        ));
        assert!(matches!(
            service
                .change_role(creator.id, group.id, creator.id, MembershipRole::Member)
                .await,
            Err(AppError::ValidationError(_))
        ));
        let promoted = service
            .change_role(creator.id, group.id, moderator.id, MembershipRole::Moderator)
            .await
            .unwrap();
        assert_eq!(promoted.role, MembershipRole::Moderator);

        assert!(matches!(
            service
                .remove_member(moderator.id, group.id, creator.id)
                .await,
            Err(AppError::ValidationError(_))
        ));
        service
            .remove_member(moderator.id, group.id, member.id)
            .await
            .unwrap();
        assert_eq!(service.members(creator.id, group.id).await.unwrap().len(), 2);

        assert!(matches!(
            service.leave(creator.id, group.id).await,
            Err(AppError::ValidationError(_))
        ));
        service.leave(moderator.id, group.id).await.unwrap();
        assert_eq!(service.members(creator.id, group.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_group_khatma_requires_active_membership() {
        let db = test_pool().await;
        let service = GroupService::new(db.clone());
        let khatma_service = KhatmaService::new(db.clone(), SiteConfig::default());
        let creator = create_user(&db, "creator").await;
        let outsider = create_user(&db, "outsider").await;

        let group = service
            .create(creator.id, CreateGroupRequest::named("Khatma group"))
            .await
            .unwrap();

        let mut request = CreateKhatmaRequest::titled("Group khatma");
        request.group_id = Some(group.id);
        assert!(matches!(
            khatma_service.create(outsider.id, request.clone()).await,
            Err(AppError::PermissionDenied(_))
        ));
        let khatma = khatma_service.create(creator.id, request).await.unwrap();
        assert!(khatma.is_group_khatma);

        let detail = service.get(creator.id, group.id).await.unwrap();
        assert_eq!(detail.active_khatmas, 1);

        service
            .update(
                creator.id,
                group.id,
                UpdateGroupRequest {
                    enable_khatma_creation: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let mut request = CreateKhatmaRequest::titled("Another");
        request.group_id = Some(group.id);
        assert!(matches!(
            khatma_service.create(creator.id, request).await,
            Err(AppError::PermissionDenied(_))
        ));

        // deleting the group keeps its khatmas
        service.delete(creator.id, group.id).await.unwrap();
        let kept = khatma_service.get(Some(creator.id), khatma.id).await.unwrap();
        assert_eq!(kept.khatma.group_id, None);
    }
}
