//! Session-held models for the storefront.

pub mod session;

pub use session::{SessionStores, keys as session_keys};
