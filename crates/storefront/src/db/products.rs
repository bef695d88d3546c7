//! Product reads for the storefront.

use sqlx::PgPool;
use tonewood_core::ProductId;
use tonewood_core::catalog::Product;

use super::RepositoryError;

/// Column list shared by product queries.
pub(crate) const PRODUCT_COLUMNS: &str = "id, name, slug, description, brand, category, sku, \
     price, compare_at_price, stock, is_active, is_featured, rating, review_count, \
     images, ingredients, tags, specifications, created_at, updated_at";

/// Repository for product reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All active products, oldest first.
    ///
    /// This is what the catalog cache holds; listing queries run in memory
    /// over the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.products WHERE is_active ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// A single active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.products WHERE id = $1 AND is_active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }
}
