//! Booking review.

use sqlx::PgPool;
use tonewood_core::booking::Booking;
use tonewood_core::{BookingId, BookingStatus};
use tracing::instrument;

use super::{RepositoryError, StatusChangeError};

const BOOKING_COLUMNS: &str = "id, service_id, customer_name, email, phone, appointment_date, \
     appointment_time, instrument, notes, status, created_at, updated_at";

/// Repository for appointment bookings.
pub struct BookingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BookingRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Bookings in appointment order, optionally only those in `status`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, status: Option<BookingStatus>) -> Result<Vec<Booking>, RepositoryError> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            r"
            SELECT {BOOKING_COLUMNS} FROM shop.bookings
            WHERE $1::shop.booking_status IS NULL OR status = $1
            ORDER BY appointment_date, appointment_time, id
            "
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;
        Ok(bookings)
    }

    /// Move a booking to `next` if its lifecycle allows it.
    ///
    /// Setting the current status again is a no-op that returns the booking.
    ///
    /// # Errors
    ///
    /// Returns `StatusChangeError::NotFound`, `StatusChangeError::Refused`
    /// for a disallowed move, or `StatusChangeError::Repository`.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: BookingId,
        next: BookingStatus,
    ) -> Result<Booking, StatusChangeError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM shop.bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StatusChangeError::NotFound)?;

        if current.status == next {
            return Ok(current);
        }
        if !current.status.can_transition_to(next) {
            return Err(StatusChangeError::Refused {
                from: current.status.as_str(),
                to: next.as_str(),
            });
        }

        let updated = sqlx::query_as::<_, Booking>(&format!(
            r"
            UPDATE shop.bookings SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {BOOKING_COLUMNS}
            "
        ))
        .bind(id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(from = %current.status, to = %next, "Booking status changed");
        Ok(updated)
    }
}
