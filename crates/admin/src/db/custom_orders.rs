//! Custom guitar request review.

use sqlx::PgPool;
use tonewood_core::custom_order::CustomGuitarRequest;
use tonewood_core::{CustomOrderId, CustomOrderStatus};
use tracing::instrument;

use super::{RepositoryError, StatusChangeError};

const CUSTOM_ORDER_COLUMNS: &str = "id, customer_name, email, phone, body_shape, top_wood, \
     back_wood, finish, pickups, left_handed, budget, timeline, notes, status, created_at";

/// Repository for custom guitar requests.
pub struct CustomOrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomOrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Requests newest first, optionally only those in `status`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<CustomOrderStatus>,
    ) -> Result<Vec<CustomGuitarRequest>, RepositoryError> {
        let requests = sqlx::query_as::<_, CustomGuitarRequest>(&format!(
            r"
            SELECT {CUSTOM_ORDER_COLUMNS} FROM shop.custom_orders
            WHERE $1::shop.custom_order_status IS NULL OR status = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;
        Ok(requests)
    }

    /// Move a request to `next` if its lifecycle allows it.
    ///
    /// # Errors
    ///
    /// Returns `StatusChangeError::NotFound`, `StatusChangeError::Refused`
    /// for a disallowed move, or `StatusChangeError::Repository`.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: CustomOrderId,
        next: CustomOrderStatus,
    ) -> Result<CustomGuitarRequest, StatusChangeError> {
        let mut tx = self.pool.begin().await?;

        let current: CustomOrderStatus =
            sqlx::query_scalar("SELECT status FROM shop.custom_orders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StatusChangeError::NotFound)?;

        if current != next && !current.can_transition_to(next) {
            return Err(StatusChangeError::Refused {
                from: current.as_str(),
                to: next.as_str(),
            });
        }

        let updated = sqlx::query_as::<_, CustomGuitarRequest>(&format!(
            "UPDATE shop.custom_orders SET status = $2 WHERE id = $1 RETURNING {CUSTOM_ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }
}
