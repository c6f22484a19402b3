pub mod auth_service;
pub mod deceased_service;
pub mod group_service;
pub mod khatma_service;
pub mod memorial_service;
pub mod notification_service;
pub mod part_service;
pub mod reading_service;
pub mod user_service;

pub use auth_service::*;
pub use deceased_service::*;
pub use group_service::*;
pub use khatma_service::*;
pub use memorial_service::*;
pub use notification_service::*;
pub use part_service::*;
pub use reading_service::*;
pub use user_service::*;
