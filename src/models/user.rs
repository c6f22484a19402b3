use crate::entities::{AccountType, profile_entity, user_entity};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "abdullah")]
    pub username: String,
    #[schema(example = "abdullah@example.com")]
    pub email: Option<String>,
    #[schema(example = "Password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "abdullah")]
    pub username: String,
    #[schema(example = "Password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<user_entity::Model> for UserResponse {
    fn from(user: user_entity::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_staff: user.is_staff,
            date_joined: user.date_joined,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub bio: Option<String>,
    pub location: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub account_type: AccountType,
    pub preferred_language: String,
}

impl From<profile_entity::Model> for ProfileResponse {
    fn from(profile: profile_entity::Model) -> Self {
        Self {
            bio: profile.bio,
            location: profile.location,
            birth_date: profile.birth_date,
            account_type: profile.account_type,
            preferred_language: profile.preferred_language,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserStatistics {
    pub khatmas_created: u64,
    pub khatmas_joined: u64,
    /// Completed readings.
    pub parts_read: u64,
    pub groups_joined: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileDetailResponse {
    pub user: UserResponse,
    pub profile: ProfileResponse,
    pub statistics: UserStatistics,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    #[schema(example = "1990-01-01")]
    pub birth_date: Option<NaiveDate>,
    pub account_type: Option<AccountType>,
    #[schema(example = "ar")]
    pub preferred_language: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteAccountRequest {
    pub password: String,
}
