//! Custom guitar commission persistence.

use sqlx::PgPool;
use tonewood_core::catalog::Handedness;
use tonewood_core::custom_order::{CustomGuitarRequest, ValidCustomGuitar};

use super::RepositoryError;

/// Repository for custom guitar requests.
pub struct CustomOrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomOrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new request with status `new`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        request: &ValidCustomGuitar,
    ) -> Result<CustomGuitarRequest, RepositoryError> {
        let created = sqlx::query_as::<_, CustomGuitarRequest>(
            r"
            INSERT INTO shop.custom_orders
                (customer_name, email, phone, body_shape, top_wood, back_wood, finish,
                 pickups, left_handed, budget, timeline, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, customer_name, email, phone, body_shape, top_wood, back_wood,
                      finish, pickups, left_handed, budget, timeline, notes, status, created_at
            ",
        )
        .bind(&request.customer_name)
        .bind(&request.email)
        .bind(request.phone.as_ref())
        .bind(request.body_shape)
        .bind(&request.top_wood)
        .bind(&request.back_wood)
        .bind(&request.finish)
        .bind(request.pickups.as_deref())
        .bind(request.handedness == Handedness::Left)
        .bind(request.budget)
        .bind(request.timeline.as_deref())
        .bind(request.notes.as_deref())
        .fetch_one(self.pool)
        .await?;
        Ok(created)
    }
}
