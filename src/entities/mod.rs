pub mod deceased;
pub mod group_memberships;
pub mod join_requests;
pub mod khatma_parts;
pub mod khatmas;
pub mod notifications;
pub mod participants;
pub mod profiles;
pub mod quran_readings;
pub mod reading_groups;
pub mod users;

pub use deceased as deceased_entity;
pub use group_memberships as group_membership_entity;
pub use join_requests as join_request_entity;
pub use khatma_parts as khatma_part_entity;
pub use khatmas as khatma_entity;
pub use notifications as notification_entity;
pub use participants as participant_entity;
pub use profiles as profile_entity;
pub use quran_readings as quran_reading_entity;
pub use reading_groups as reading_group_entity;
pub use users as user_entity;

pub use deceased::MemorialFrequency;
pub use group_memberships::MembershipRole;
pub use join_requests::JoinRequestStatus;
pub use khatmas::{KhatmaType, KhatmaVisibility, ReminderFrequency};
pub use notifications::NotificationType;
pub use profiles::AccountType;
pub use quran_readings::{ReadingStatus, RecitationMethod};
