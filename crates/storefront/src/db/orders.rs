//! Order placement.
//!
//! An order is written in a single transaction: the ordered products are
//! locked with `SELECT ... FOR UPDATE`, priced and stock-checked from those
//! rows, decremented, and the order row is inserted with a JSONB snapshot of
//! its lines.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgPool;
use sqlx::types::Json;
use thiserror::Error;
use tonewood_core::ValidationErrors;
use tonewood_core::checkout::{self, Order, PricingRules, StockedProduct, ValidCheckout};
use tracing::instrument;

use super::RepositoryError;

const ORDER_COLUMNS: &str = "id, order_number, customer_name, email, phone, shipping_address, \
     payment_method, items, subtotal, shipping, tax, total, status, notes, created_at, updated_at";

/// Why an order could not be placed.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    /// A line referenced an unavailable product or exceeded stock.
    #[error("{0}")]
    Rejected(ValidationErrors),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PlaceOrderError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Price, stock-check and insert an order.
    ///
    /// Nothing is written unless every line can be fulfilled.
    ///
    /// # Errors
    ///
    /// Returns `PlaceOrderError::Rejected` with per-line field errors, or
    /// `PlaceOrderError::Repository` if the database fails.
    #[instrument(skip(self, checkout, rules), fields(lines = checkout.lines.len()))]
    pub async fn place(
        &self,
        checkout: &ValidCheckout,
        rules: &PricingRules,
    ) -> Result<Order, PlaceOrderError> {
        let mut tx = self.pool.begin().await?;

        let ids: Vec<i32> = checkout.lines.iter().map(|(id, _)| id.as_i32()).collect();
        // Lock in id order so concurrent checkouts can't deadlock
        let rows = sqlx::query_as::<_, StockedProduct>(
            r"
            SELECT id, name, sku, price, stock, is_active
            FROM shop.products
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

        let catalog: HashMap<_, _> = rows.into_iter().map(|p| (p.id, p)).collect();
        let lines =
            checkout::build_lines(&checkout.lines, &catalog).map_err(PlaceOrderError::Rejected)?;
        let totals = rules
            .checked_totals(&lines, checkout.payment_method)
            .map_err(PlaceOrderError::Rejected)?;

        for line in &lines {
            sqlx::query(
                "UPDATE shop.products SET stock = stock - $2, updated_at = now() WHERE id = $1",
            )
            .bind(line.product_id)
            .bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }

        let order_number = checkout::order_number(Utc::now(), rand::random::<u32>());

        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO shop.orders
                (order_number, customer_name, email, phone, shipping_address,
                 payment_method, items, subtotal, shipping, tax, total, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(&order_number)
        .bind(&checkout.customer_name)
        .bind(&checkout.email)
        .bind(checkout.phone.as_ref())
        .bind(Json(&checkout.shipping_address))
        .bind(checkout.payment_method)
        .bind(Json(&lines))
        .bind(totals.subtotal)
        .bind(totals.shipping)
        .bind(totals.tax)
        .bind(totals.total)
        .bind(checkout.notes.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique_as_conflict(e, "Order number collision, please retry"))?;

        tx.commit().await?;

        tracing::info!(
            order_number = %order.order_number,
            total = %order.total,
            "Order placed"
        );
        Ok(order)
    }
}
