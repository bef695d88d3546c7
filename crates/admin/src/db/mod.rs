//! Database operations for the back office.
//!
//! # Schemas
//!
//! - `shop` - Catalog, bookings, orders and custom requests (shared with the
//!   storefront)
//! - `admin` - Staff accounts (`admin_users`) and admin sessions (`session`)
//!
//! # Migrations
//!
//! Migrations are stored in the workspace `migrations/` directory and run via:
//! ```bash
//! cargo run -p tonewood-cli -- migrate
//! ```

pub mod admin_users;
pub mod bookings;
pub mod custom_orders;
pub mod orders;
pub mod products;
pub mod services;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin_users::{AdminUserRepository, NewAdminUser};
pub use bookings::BookingRepository;
pub use custom_orders::CustomOrderRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use services::ServiceRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate SKU).
    #[error("{0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict(message)`, anything else to `Database`.
    pub(crate) fn unique_as_conflict(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }
}

/// Why a status change was not applied.
#[derive(Debug, Error)]
pub enum StatusChangeError {
    #[error("not found")]
    NotFound,

    /// The record's lifecycle doesn't allow the move.
    #[error("cannot change status from {from} to {to}")]
    Refused { from: &'static str, to: &'static str },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for StatusChangeError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Create a `PostgreSQL` connection pool.
///
/// The back office is low traffic, so the pool is smaller than the
/// storefront's.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
