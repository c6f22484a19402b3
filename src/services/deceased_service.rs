use crate::entities::deceased_entity as deceased;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{validate_date_order, validate_max_len, validate_not_blank};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct DeceasedService {
    pool: DatabaseConnection,
}

impl DeceasedService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: i32,
        request: CreateDeceasedRequest,
    ) -> AppResult<DeceasedResponse> {
        let name = request.name.trim().to_string();
        validate_not_blank("name", &name)?;
        validate_max_len("name", &name, 200)?;
        validate_date_order(request.birth_date, request.death_date)?;
        if request.death_date > Utc::now().date_naive() {
            return Err(AppError::ValidationError(
                "Death date cannot be in the future".to_string(),
            ));
        }
        self.ensure_name_free(&name, None).await?;

        let model = deceased::ActiveModel {
            name: Set(name),
            death_date: Set(request.death_date),
            birth_date: Set(request.birth_date),
            biography: Set(request.biography.unwrap_or_default()),
            relationship: Set(request.relationship),
            cause_of_death: Set(request.cause_of_death),
            burial_place: Set(request.burial_place),
            memorial_day: Set(request.memorial_day),
            memorial_frequency: Set(request.memorial_frequency),
            added_by: Set(user_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        Ok(model.into())
    }

    pub async fn list(
        &self,
        user_id: i32,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<DeceasedResponse>> {
        let base_query = deceased::Entity::find().filter(deceased::Column::AddedBy.eq(user_id));
        let total = base_query.clone().count(&self.pool).await?;
        let items = base_query
            .order_by_desc(deceased::Column::DeathDate)
            .order_by_asc(deceased::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            params,
            total,
        ))
    }

    pub async fn get(&self, user_id: i32, id: i32) -> AppResult<DeceasedResponse> {
        Ok(self.find_owned(user_id, id).await?.into())
    }

    pub async fn update(
        &self,
        user_id: i32,
        id: i32,
        request: UpdateDeceasedRequest,
    ) -> AppResult<DeceasedResponse> {
        let current = self.find_owned(user_id, id).await?;

        let death_date = request.death_date.unwrap_or(current.death_date);
        let birth_date = request.birth_date.or(current.birth_date);
        validate_date_order(birth_date, death_date)?;

        let mut am = current.into_active_model();
        if let Some(name) = request.name {
            let name = name.trim().to_string();
            validate_not_blank("name", &name)?;
            validate_max_len("name", &name, 200)?;
            self.ensure_name_free(&name, Some(id)).await?;
            am.name = Set(name);
        }
        am.death_date = Set(death_date);
        am.birth_date = Set(birth_date);
        if let Some(biography) = request.biography {
            am.biography = Set(biography);
        }
        if let Some(relationship) = request.relationship {
            am.relationship = Set(Some(relationship));
        }
        if let Some(cause) = request.cause_of_death {
            am.cause_of_death = Set(Some(cause));
        }
        if let Some(place) = request.burial_place {
            am.burial_place = Set(Some(place));
        }
        if let Some(memorial_day) = request.memorial_day {
            am.memorial_day = Set(memorial_day);
        }
        if let Some(frequency) = request.memorial_frequency {
            am.memorial_frequency = Set(Some(frequency));
        }

        let updated = am.update(&self.pool).await?;
        Ok(updated.into())
    }

    /// Memorial khatmas that referenced this person keep existing without it.
    pub async fn delete(&self, user_id: i32, id: i32) -> AppResult<()> {
        let model = self.find_owned(user_id, id).await?;
        deceased::Entity::delete_by_id(model.id)
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    pub(crate) async fn find_owned(&self, user_id: i32, id: i32) -> AppResult<deceased::Model> {
        deceased::Entity::find_by_id(id)
            .filter(deceased::Column::AddedBy.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Deceased not found".to_string()))
    }

    async fn ensure_name_free(&self, name: &str, except_id: Option<i32>) -> AppResult<()> {
        let mut query = deceased::Entity::find().filter(deceased::Column::Name.eq(name));
        if let Some(id) = except_id {
            query = query.filter(deceased::Column::Id.ne(id));
        }
        if query.one(&self.pool).await?.is_some() {
            return Err(AppError::Conflict(
                "A deceased person with this name already exists".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::entities::MemorialFrequency;
    use crate::services::test_support::create_user;
    use chrono::NaiveDate;

    fn request(name: &str) -> CreateDeceasedRequest {
        CreateDeceasedRequest {
            name: name.to_string(),
            death_date: NaiveDate::from_ymd_opt(2020, 3, 15).unwrap(),
            birth_date: NaiveDate::from_ymd_opt(1950, 6, 1),
            biography: None,
            relationship: Some("grandfather".to_string()),
            cause_of_death: None,
            burial_place: None,
            memorial_day: true,
            memorial_frequency: Some(MemorialFrequency::Yearly),
        }
    }

    #[tokio::test]
    async fn test_crud_scoped_to_owner() {
        let db = test_pool().await;
        let service = DeceasedService::new(db.clone());
        let owner = create_user(&db, "owner").await;
        let stranger = create_user(&db, "stranger").await;

        let created = service.create(owner.id, request("Ibrahim")).await.unwrap();
        assert_eq!(created.age_at_death, Some(69));

        assert!(matches!(
            service.get(stranger.id, created.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(stranger.id, created.id).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(
            service
                .list(stranger.id, &PaginationParams::default())
                .await
                .unwrap()
                .total,
            0
        );

        let updated = service
            .update(
                owner.id,
                created.id,
                UpdateDeceasedRequest {
                    burial_place: Some("Medina".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.burial_place.as_deref(), Some("Medina"));

        service.delete(owner.id, created.id).await.unwrap();
        assert!(service.get(owner.id, created.id).await.is_err());
    }

    #[tokio::test]
    async fn test_validation_rules() {
        let db = test_pool().await;
        let service = DeceasedService::new(db.clone());
        let owner = create_user(&db, "owner").await;

        let mut bad_dates = request("Khadija");
        bad_dates.birth_date = NaiveDate::from_ymd_opt(2021, 1, 1);
        assert!(matches!(
            service.create(owner.id, bad_dates).await,
            Err(AppError::ValidationError(_))
        ));

        service.create(owner.id, request("Khadija")).await.unwrap();
        assert!(matches!(
            service.create(owner.id, request("Khadija")).await,
            Err(AppError::Conflict(_))
        ));
    }
}
