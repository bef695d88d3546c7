//! Booking persistence.

use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use tonewood_core::ServiceId;
use tonewood_core::booking::{Booking, ValidBooking};

use super::RepositoryError;

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

    /// Insert a pending booking.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slot is already held by a
    /// booking that isn't cancelled.
    pub async fn create(&self, booking: &ValidBooking) -> Result<Booking, RepositoryError> {
        sqlx::query_as::<_, Booking>(&format!(
            r"
            INSERT INTO shop.bookings
                (service_id, customer_name, email, phone, appointment_date,
                 appointment_time, instrument, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {BOOKING_COLUMNS}
            "
        ))
        .bind(booking.service_id)
        .bind(&booking.customer_name)
        .bind(&booking.email)
        .bind(&booking.phone)
        .bind(booking.date)
        .bind(booking.time)
        .bind(booking.instrument.as_deref())
        .bind(booking.notes.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_as_conflict(e, "That time slot is already booked"))
    }

    /// Start times already held for a service on a date.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn taken_slots(
        &self,
        service_id: ServiceId,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, RepositoryError> {
        let times = sqlx::query_scalar::<_, NaiveTime>(
            r"
            SELECT appointment_time FROM shop.bookings
            WHERE service_id = $1 AND appointment_date = $2 AND status <> 'cancelled'
            ORDER BY appointment_time
            ",
        )
        .bind(service_id)
        .bind(date)
        .fetch_all(self.pool)
        .await?;
        Ok(times)
    }
}
