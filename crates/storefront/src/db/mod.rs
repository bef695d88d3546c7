//! Database operations for the storefront.
//!
//! # Schema: `shop`
//!
//! - `products` - Catalog (read-only here apart from stock decrements)
//! - `services` - Service desk offerings (read-only here)
//! - `bookings` - Appointment requests
//! - `orders` - Placed orders with line snapshots (JSONB)
//! - `custom_orders` - Custom guitar commission requests
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in the workspace `migrations/` directory and run via:
//! ```bash
//! cargo run -p tonewood-cli -- migrate
//! ```

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

pub use bookings::BookingRepository;
pub use custom_orders::CustomOrderRepository;
pub use orders::{OrderRepository, PlaceOrderError};
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

    /// Constraint violation (e.g., a booked slot).
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

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
