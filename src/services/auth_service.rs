use crate::entities::{AccountType, NotificationType, profile_entity as profiles, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{NotificationService, NotificationTarget};
use crate::utils::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set, TransactionTrait,
};

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let username = request.username.trim().to_string();
        validate_username(&username)?;
        validate_password(&request.password)?;
        let email = request
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        if let Some(email) = &email
            && !email.contains('@')
        {
            return Err(AppError::ValidationError("Invalid email address".to_string()));
        }

        let existing = users::Entity::find()
            .filter(users::Column::Username.eq(username.as_str()))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }

        let password_hash = hash_password(&request.password)?;

        let txn = self.pool.begin().await?;

        let user = users::ActiveModel {
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            is_staff: Set(false),
            is_active: Set(true),
            date_joined: Set(Utc::now()),
            last_login: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        profiles::ActiveModel {
            user_id: Set(user.id),
            account_type: Set(AccountType::Individual),
            preferred_language: Set("ar".to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        NotificationService::notify(
            &txn,
            user.id,
            NotificationType::Welcome,
            format!("Welcome, {}! Start or join a khatma to begin reading.", user.username),
            NotificationTarget::default(),
        )
        .await?;

        txn.commit().await?;

        log::info!("User registered: id={} username={}", user.id, user.username);
        self.issue_tokens(user)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(request.username.trim()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid username or password".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError(
                "Invalid username or password".to_string(),
            ));
        }
        if !user.is_active {
            return Err(AppError::AuthError("Account is disabled".to_string()));
        }

        let mut am = user.into_active_model();
        am.last_login = Set(Some(Utc::now()));
        let user = am.update(&self.pool).await?;

        self.issue_tokens(user)
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<RefreshResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id = claims.user_id()?;

        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;
        if !user.is_active {
            return Err(AppError::AuthError("Account is disabled".to_string()));
        }

        let access_token = self
            .jwt_service
            .generate_access_token(user.id, &user.username)?;
        Ok(RefreshResponse {
            access_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    fn issue_tokens(&self, user: users::Model) -> AppResult<AuthResponse> {
        let access_token = self
            .jwt_service
            .generate_access_token(user.id, &user.username)?;
        let refresh_token = self
            .jwt_service
            .generate_refresh_token(user.id, &user.username)?;

        Ok(AuthResponse {
            user: user.into(),
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::entities::notification_entity as notifications;
    use sea_orm::PaginatorTrait;

    fn service(db: &DatabaseConnection) -> AuthService {
        AuthService::new(db.clone(), JwtService::new("test-secret", 60, 120))
    }

    fn register_request(username: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: Some(format!("{username}@example.com")),
            password: "Password123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_creates_profile_and_welcome() {
        let db = test_pool().await;
        let auth = service(&db);

        let response = auth.register(register_request("yusuf")).await.unwrap();
        assert_eq!(response.user.username, "yusuf");
        assert!(!response.access_token.is_empty());

        let profile = profiles::Entity::find()
            .filter(profiles::Column::UserId.eq(response.user.id))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.account_type, AccountType::Individual);

        let welcome = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(response.user.id))
            .filter(notifications::Column::NotificationType.eq(NotificationType::Welcome))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(welcome, 1);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_bad_input() {
        let db = test_pool().await;
        let auth = service(&db);

        auth.register(register_request("yusuf")).await.unwrap();
        assert!(matches!(
            auth.register(register_request("yusuf")).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            auth.register(register_request("x")).await,
            Err(AppError::ValidationError(_))
        ));

        let mut weak = register_request("maryam");
        weak.password = "password".to_string();
        assert!(matches!(
            auth.register(weak).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_login_and_refresh() {
        let db = test_pool().await;
        let auth = service(&db);
        auth.register(register_request("yusuf")).await.unwrap();

        let bad = auth
            .login(LoginRequest {
                username: "yusuf".to_string(),
                password: "Wrong12345".to_string(),
            })
            .await;
        assert!(matches!(bad, Err(AppError::AuthError(_))));

        let ok = auth
            .login(LoginRequest {
                username: "yusuf".to_string(),
                password: "Password123".to_string(),
            })
            .await
            .unwrap();

        let refreshed = auth.refresh_token(&ok.refresh_token).await.unwrap();
        assert!(!refreshed.access_token.is_empty());

        // an access token is not a refresh token
        assert!(auth.refresh_token(&ok.access_token).await.is_err());
    }
}
