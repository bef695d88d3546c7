//! Order review and fulfilment.
//!
//! Cancelling an order puts its units back into stock in the same
//! transaction as the status change. Lines whose product has since been
//! deleted are skipped.

use sqlx::PgPool;
use tonewood_core::checkout::Order;
use tonewood_core::{OrderId, OrderStatus};
use tracing::instrument;

use super::{RepositoryError, StatusChangeError};

const ORDER_COLUMNS: &str = "id, order_number, customer_name, email, phone, shipping_address, \
     payment_method, items, subtotal, shipping, tax, total, status, notes, created_at, updated_at";

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders newest first, optionally only those in `status`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM shop.orders
            WHERE $1::shop.order_status IS NULL OR status = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Move an order to `next` if its lifecycle allows it, restocking on
    /// cancellation.
    ///
    /// # Errors
    ///
    /// Returns `StatusChangeError::NotFound`, `StatusChangeError::Refused`
    /// for a disallowed move, or `StatusChangeError::Repository`.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, StatusChangeError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1 FOR UPDATE"
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

        if next.releases_stock() {
            for line in &current.items {
                sqlx::query(
                    "UPDATE shop.products SET stock = stock + $2, updated_at = NOW() WHERE id = $1",
                )
                .bind(line.product_id)
                .bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
                .execute(&mut *tx)
                .await?;
            }
        }

        let updated = sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE shop.orders SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(
            order_number = %updated.order_number,
            from = %current.status,
            to = %next,
            "Order status changed"
        );
        Ok(updated)
    }
}
