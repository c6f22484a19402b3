use crate::entities::{
    AccountType, ReadingStatus, group_membership_entity as memberships, khatma_entity as khatmas,
    participant_entity as participants, profile_entity as profiles,
    quran_reading_entity as readings, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{validate_max_len, verify_password};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set,
};

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Account, profile and reading statistics for one user.
    pub async fn get_profile(&self, user_id: i32) -> AppResult<ProfileDetailResponse> {
        let user = self.find_user(user_id).await?;
        let profile = self.ensure_profile(user_id).await?;
        let statistics = self.get_statistics(user_id).await?;

        Ok(ProfileDetailResponse {
            user: user.into(),
            profile: profile.into(),
            statistics,
        })
    }

    pub async fn update_profile(
        &self,
        user_id: i32,
        request: UpdateProfileRequest,
    ) -> AppResult<ProfileDetailResponse> {
        if let Some(bio) = &request.bio {
            validate_max_len("bio", bio, 1000)?;
        }
        if let Some(location) = &request.location {
            validate_max_len("location", location, 100)?;
        }
        if let Some(lang) = &request.preferred_language {
            validate_max_len("preferred_language", lang, 10)?;
        }

        let user = self.find_user(user_id).await?;
        if let Some(email) = request.email {
            let email = email.trim().to_string();
            if !email.is_empty() && !email.contains('@') {
                return Err(AppError::ValidationError("Invalid email address".to_string()));
            }
            let mut am = user.into_active_model();
            am.email = Set(if email.is_empty() { None } else { Some(email) });
            am.update(&self.pool).await?;
        }

        let profile = self.ensure_profile(user_id).await?;
        let mut am = profile.into_active_model();
        if let Some(bio) = request.bio {
            am.bio = Set(Some(bio));
        }
        if let Some(location) = request.location {
            am.location = Set(Some(location));
        }
        if let Some(birth_date) = request.birth_date {
            am.birth_date = Set(Some(birth_date));
        }
        if let Some(account_type) = request.account_type {
            am.account_type = Set(account_type);
        }
        if let Some(lang) = request.preferred_language {
            am.preferred_language = Set(lang);
        }
        if am.is_changed() {
            am.update(&self.pool).await?;
        }

        self.get_profile(user_id).await
    }

    /// Deletes the account after re-checking the password. Dependent rows go
    /// through the foreign keys: owned records cascade, assigned parts are
    /// unassigned.
    pub async fn delete_account(&self, user_id: i32, password: &str) -> AppResult<()> {
        let user = self.find_user(user_id).await?;
        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::AuthError("Password is incorrect".to_string()));
        }

        users::Entity::delete_by_id(user.id).exec(&self.pool).await?;
        log::info!("User account deleted: id={}", user.id);
        Ok(())
    }

    async fn get_statistics(&self, user_id: i32) -> AppResult<UserStatistics> {
        let khatmas_created = khatmas::Entity::find()
            .filter(khatmas::Column::CreatorId.eq(user_id))
            .count(&self.pool)
            .await?;
        let khatmas_joined = participants::Entity::find()
            .filter(participants::Column::UserId.eq(user_id))
            .count(&self.pool)
            .await?;
        let parts_read = readings::Entity::find()
            .filter(readings::Column::ParticipantId.eq(user_id))
            .filter(readings::Column::Status.eq(ReadingStatus::Completed))
            .count(&self.pool)
            .await?;
        let groups_joined = memberships::Entity::find()
            .filter(memberships::Column::UserId.eq(user_id))
            .filter(memberships::Column::IsActive.eq(true))
            .count(&self.pool)
            .await?;

        Ok(UserStatistics {
            khatmas_created,
            khatmas_joined,
            parts_read,
            groups_joined,
        })
    }

    async fn find_user(&self, user_id: i32) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Accounts created before profiles existed get one lazily.
    async fn ensure_profile(&self, user_id: i32) -> AppResult<profiles::Model> {
        if let Some(profile) = profiles::Entity::find()
            .filter(profiles::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
        {
            return Ok(profile);
        }
        let profile = profiles::ActiveModel {
            user_id: Set(user_id),
            account_type: Set(AccountType::Individual),
            preferred_language: Set("ar".to_string()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::database::test_pool;
    use crate::entities::khatma_part_entity as parts;
    use crate::services::test_support::create_user;
    use crate::services::{KhatmaService, PartService};
    use crate::utils::hash_password;

    #[tokio::test]
    async fn test_update_profile_partial() {
        let db = test_pool().await;
        let service = UserService::new(db.clone());
        let user = create_user(&db, "amina").await;

        let updated = service
            .update_profile(
                user.id,
                UpdateProfileRequest {
                    bio: Some("Reader".to_string()),
                    account_type: Some(AccountType::Family),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.profile.bio.as_deref(), Some("Reader"));
        assert_eq!(updated.profile.account_type, AccountType::Family);
        assert_eq!(updated.profile.preferred_language, "ar");

        let too_long = service
            .update_profile(
                user.id,
                UpdateProfileRequest {
                    location: Some("x".repeat(101)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(too_long, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_delete_account_unassigns_parts_in_other_khatmas() {
        let db = test_pool().await;
        let service = UserService::new(db.clone());
        let khatma_service = KhatmaService::new(db.clone(), SiteConfig::default());
        let part_service = PartService::new(db.clone());

        let creator = create_user(&db, "creator").await;
        let reader = create_user(&db, "reader").await;
        let mut am = reader.clone().into_active_model();
        am.password_hash = Set(hash_password("Password123").unwrap());
        am.update(&db).await.unwrap();

        let khatma = khatma_service
            .create(creator.id, CreateKhatmaRequest::titled("Shared"))
            .await
            .unwrap();
        khatma_service.join(reader.id, khatma.id).await.unwrap();
        part_service
            .assign(creator.id, khatma.id, 3, Some(reader.id))
            .await
            .unwrap();

        assert!(matches!(
            service.delete_account(reader.id, "Wrong12345").await,
            Err(AppError::AuthError(_))
        ));
        service.delete_account(reader.id, "Password123").await.unwrap();

        let part = parts::Entity::find()
            .filter(parts::Column::KhatmaId.eq(khatma.id))
            .filter(parts::Column::PartNumber.eq(3))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(part.assigned_to, None);
        assert_eq!(
            parts::Entity::find()
                .filter(parts::Column::KhatmaId.eq(khatma.id))
                .count(&db)
                .await
                .unwrap(),
            30
        );
        assert!(
            profiles::Entity::find()
                .filter(profiles::Column::UserId.eq(reader.id))
                .one(&db)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_profile_statistics() {
        let db = test_pool().await;
        let service = UserService::new(db.clone());
        let khatma_service = KhatmaService::new(db.clone(), SiteConfig::default());
        let part_service = PartService::new(db.clone());
        let user = create_user(&db, "stats").await;

        let khatma = khatma_service
            .create(user.id, CreateKhatmaRequest::titled("Mine"))
            .await
            .unwrap();
        part_service.complete(user.id, khatma.id, 1).await.unwrap();

        let detail = service.get_profile(user.id).await.unwrap();
        assert_eq!(detail.statistics.khatmas_created, 1);
        assert_eq!(detail.statistics.khatmas_joined, 1);
        assert_eq!(detail.statistics.parts_read, 1);
        assert_eq!(detail.statistics.groups_joined, 0);
    }
}
