pub mod auth;
pub mod deceased;
pub mod group;
pub mod health;
pub mod khatma;
pub mod notification;
pub mod part;
pub mod reading;
pub mod user;

pub use auth::auth_config;
pub use deceased::deceased_config;
pub use group::group_config;
pub use health::health_config;
pub use khatma::khatma_config;
pub use notification::notification_config;
pub use reading::reading_config;
pub use user::user_config;
