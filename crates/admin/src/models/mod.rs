//! Admin domain models.

pub mod admin_user;
pub mod session;

pub use admin_user::AdminUser;
pub use session::{CurrentAdmin, keys as session_keys};
