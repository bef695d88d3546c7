//! Business services for the back office.
//!
//! - [`password`] - Argon2id hashing for admin accounts (shared with `tw-cli`)
//! - [`uploads`] - Validated product image storage

pub mod password;
pub mod uploads;
