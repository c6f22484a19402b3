pub mod common;
pub mod deceased;
pub mod group;
pub mod khatma;
pub mod notification;
pub mod pagination;
pub mod reading;
pub mod user;

pub use common::*;
pub use deceased::*;
pub use group::*;
pub use khatma::*;
pub use notification::*;
pub use pagination::*;
pub use reading::*;
pub use user::*;
