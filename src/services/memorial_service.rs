use crate::config::MemorialConfig;
use crate::entities::{
    KhatmaType, KhatmaVisibility, NotificationType, deceased_entity as deceased,
    khatma_entity as khatmas,
};
use crate::error::AppResult;
use crate::models::CreateKhatmaRequest;
use crate::services::khatma_service::insert_khatma;
use crate::services::{NotificationService, NotificationTarget};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};

// keeps "Memorial khatma for <name> (<date>)" inside the 200-char title column
const MAX_NAME_IN_TITLE: usize = 150;

#[derive(Clone)]
pub struct MemorialService {
    pool: DatabaseConnection,
    config: MemorialConfig,
}

impl MemorialService {
    pub fn new(pool: DatabaseConnection, config: MemorialConfig) -> Self {
        Self { pool, config }
    }

    /// Creates the memorial khatmas due on `today`; returns how many were created.
    /// A failing deceased is logged and skipped.
    pub async fn create_due_memorials(&self, today: NaiveDate) -> AppResult<usize> {
        let candidates = deceased::Entity::find()
            .filter(deceased::Column::MemorialDay.eq(true))
            .filter(deceased::Column::MemorialFrequency.is_not_null())
            .order_by_asc(deceased::Column::Id)
            .all(&self.pool)
            .await?;

        let mut created = 0;
        for person in candidates {
            let due = person
                .memorial_frequency
                .as_ref()
                .is_some_and(|frequency| frequency.is_due(person.death_date, today));
            if !due {
                continue;
            }
            match self.create_single(&person, today).await {
                Ok(true) => created += 1,
                Ok(false) => {}
                Err(e) => log::error!(
                    "Memorial khatma for deceased={} on {} failed: {}",
                    person.id,
                    today,
                    e
                ),
            }
        }
        if created > 0 {
            log::info!("Memorial khatmas created for {}: {}", today, created);
        }
        Ok(created)
    }

    async fn create_single(&self, person: &deceased::Model, today: NaiveDate) -> AppResult<bool> {
        let day_start = today.and_time(NaiveTime::default()).and_utc();
        let already_created = khatmas::Entity::find()
            .filter(khatmas::Column::DeceasedId.eq(person.id))
            .filter(khatmas::Column::KhatmaType.eq(KhatmaType::Memorial))
            .filter(khatmas::Column::CreatedAt.gte(day_start))
            .filter(khatmas::Column::CreatedAt.lt(day_start + Duration::days(1)))
            .one(&self.pool)
            .await?
            .is_some();
        if already_created {
            return Ok(false);
        }

        let mut title = memorial_title(&person.name, today);
        let title_in_use = khatmas::Entity::find()
            .filter(khatmas::Column::Title.eq(title.as_str()))
            .one(&self.pool)
            .await?
            .is_some();
        if title_in_use {
            title = format!("{} #{}", title, person.id);
        }

        let mut request = CreateKhatmaRequest::titled(title);
        request.description = Some(format!("Recurring memorial reading for {}.", person.name));
        request.khatma_type = Some(KhatmaType::Memorial);
        request.deceased_id = Some(person.id);
        request.is_public = Some(true);
        request.visibility = Some(KhatmaVisibility::Public);
        request.target_completion_date = Some(today + Duration::days(self.config.target_days));

        // stamped with the run date so reruns for the same day find it
        let created_at = today.and_time(Utc::now().time()).and_utc();
        let txn = self.pool.begin().await?;
        let khatma = insert_khatma(&txn, person.added_by, request, created_at).await?;
        NotificationService::notify(
            &txn,
            person.added_by,
            NotificationType::MemorialKhatma,
            format!("A memorial khatma for {} has been created.", person.name),
            NotificationTarget::khatma(khatma.id),
        )
        .await?;
        txn.commit().await?;

        log::info!(
            "Memorial khatma created: id={} deceased={}",
            khatma.id,
            person.id
        );
        Ok(true)
    }
}

fn memorial_title(name: &str, date: NaiveDate) -> String {
    let name: String = name.chars().take(MAX_NAME_IN_TITLE).collect();
    format!("Memorial khatma for {} ({})", name, date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::entities::{
        MemorialFrequency, khatma_part_entity as parts, notification_entity as notifications,
    };
    use crate::config::SiteConfig;
    use crate::services::KhatmaService;
    use crate::services::test_support::create_user;
    use sea_orm::{ActiveModelTrait, ConnectionTrait, PaginatorTrait, Set};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn add_deceased(
        db: &DatabaseConnection,
        added_by: i32,
        name: &str,
        death_date: NaiveDate,
        frequency: Option<MemorialFrequency>,
    ) -> deceased::Model {
        deceased::ActiveModel {
            name: Set(name.to_string()),
            death_date: Set(death_date),
            biography: Set(String::new()),
            memorial_day: Set(frequency.is_some()),
            memorial_frequency: Set(frequency),
            added_by: Set(added_by),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_creates_due_memorials_once_per_day() {
        let db = test_pool().await;
        let service = MemorialService::new(db.clone(), MemorialConfig::default());
        let user = create_user(&db, "family").await;

        let yearly = add_deceased(
            &db,
            user.id,
            "Yearly",
            date(2020, 3, 10),
            Some(MemorialFrequency::Yearly),
        )
        .await;
        add_deceased(
            &db,
            user.id,
            "Monthly",
            date(2020, 1, 11),
            Some(MemorialFrequency::Monthly),
        )
        .await;
        add_deceased(&db, user.id, "No memorial", date(2020, 3, 10), None).await;

        let today = date(2024, 3, 10);
        assert_eq!(service.create_due_memorials(today).await.unwrap(), 1);
        assert_eq!(service.create_due_memorials(today).await.unwrap(), 0);

        let khatma = khatmas::Entity::find()
            .filter(khatmas::Column::DeceasedId.eq(yearly.id))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(khatma.khatma_type, KhatmaType::Memorial);
        assert!(khatma.is_public);
        assert_eq!(khatma.creator_id, user.id);
        assert_eq!(khatma.target_completion_date, Some(date(2024, 3, 17)));
        assert!(khatma.title.contains("Yearly"));
        assert!(khatma.sharing_link.is_some());

        let part_count = parts::Entity::find()
            .filter(parts::Column::KhatmaId.eq(khatma.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(part_count, 30);

        let notified = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user.id))
            .filter(notifications::Column::NotificationType.eq(NotificationType::MemorialKhatma))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(notified, 1);

        // the monthly one falls on the 11th
        assert_eq!(
            service.create_due_memorials(date(2024, 3, 11)).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_taken_title_does_not_block_memorial() {
        let db = test_pool().await;
        let service = MemorialService::new(db.clone(), MemorialConfig::default());
        let khatma_service = KhatmaService::new(db.clone(), SiteConfig::default());
        let family = create_user(&db, "family").await;
        let stranger = create_user(&db, "stranger").await;

        let today = date(2024, 5, 1);
        let person = add_deceased(
            &db,
            family.id,
            "Daily",
            date(2020, 1, 1),
            Some(MemorialFrequency::Daily),
        )
        .await;
        khatma_service
            .create(
                stranger.id,
                CreateKhatmaRequest::titled(memorial_title("Daily", today)),
            )
            .await
            .unwrap();

        assert_eq!(service.create_due_memorials(today).await.unwrap(), 1);
        assert_eq!(service.create_due_memorials(today).await.unwrap(), 0);

        let memorial = khatmas::Entity::find()
            .filter(khatmas::Column::DeceasedId.eq(person.id))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(memorial.creator_id, family.id);
        assert_eq!(memorial.khatma_type, KhatmaType::Memorial);
        assert_ne!(memorial.title, memorial_title("Daily", today));
    }

    #[tokio::test]
    async fn test_names_sharing_a_long_prefix_both_get_memorials() {
        let db = test_pool().await;
        let service = MemorialService::new(db.clone(), MemorialConfig::default());
        let family = create_user(&db, "family").await;

        let prefix = "n".repeat(MAX_NAME_IN_TITLE);
        for suffix in ["a", "b"] {
            add_deceased(
                &db,
                family.id,
                &format!("{prefix}{suffix}"),
                date(2020, 1, 1),
                Some(MemorialFrequency::Daily),
            )
            .await;
        }

        assert_eq!(
            service.create_due_memorials(date(2024, 5, 1)).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_failing_deceased_does_not_stop_the_run() {
        let db = test_pool().await;
        let service = MemorialService::new(db.clone(), MemorialConfig::default());
        let family = create_user(&db, "family").await;

        // orphaned row: its owner does not exist, so the khatma insert fails
        db.execute_unprepared("PRAGMA foreign_keys = OFF").await.unwrap();
        add_deceased(
            &db,
            family.id + 1000,
            "Orphan",
            date(2020, 1, 1),
            Some(MemorialFrequency::Daily),
        )
        .await;
        db.execute_unprepared("PRAGMA foreign_keys = ON").await.unwrap();
        let later = add_deceased(
            &db,
            family.id,
            "Later",
            date(2020, 1, 1),
            Some(MemorialFrequency::Daily),
        )
        .await;

        assert_eq!(
            service.create_due_memorials(date(2024, 5, 1)).await.unwrap(),
            1
        );
        let memorials = khatmas::Entity::find()
            .filter(khatmas::Column::KhatmaType.eq(KhatmaType::Memorial))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(memorials.len(), 1);
        assert_eq!(memorials[0].deceased_id, Some(later.id));
    }

    #[test]
    fn test_memorial_title_truncates_long_names() {
        let name = "x".repeat(300);
        let title = memorial_title(&name, date(2024, 1, 2));
        assert!(title.chars().count() <= 200);
        assert!(title.ends_with("(2024-01-02)"));
    }
}
