//! Product CRUD.

use sqlx::PgPool;
use sqlx::types::Json;
use tonewood_core::ProductId;
use tonewood_core::catalog::{Product, ProductDraft};

use super::RepositoryError;

const PRODUCT_COLUMNS: &str = "id, name, slug, description, brand, category, sku, \
     price, compare_at_price, stock, is_active, is_featured, rating, review_count, \
     images, ingredients, tags, specifications, created_at, updated_at";

const DUPLICATE_MESSAGE: &str = "A product with that SKU or slug already exists";

/// Repository for product administration.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every product, active or not, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.products ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Insert a validated product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU or slug is taken.
    pub async fn create(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO shop.products
                (name, slug, description, brand, category, sku, price, compare_at_price,
                 stock, is_active, is_featured, rating, review_count, images, ingredients,
                 tags, specifications)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&draft.name)
        .bind(&draft.slug)
        .bind(&draft.description)
        .bind(&draft.brand)
        .bind(draft.category)
        .bind(&draft.sku)
        .bind(draft.price)
        .bind(draft.compare_at_price)
        .bind(draft.stock)
        .bind(draft.is_active)
        .bind(draft.is_featured)
        .bind(draft.rating)
        .bind(draft.review_count)
        .bind(&draft.images)
        .bind(&draft.ingredients)
        .bind(&draft.tags)
        .bind(Json(&draft.specifications))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_as_conflict(e, DUPLICATE_MESSAGE))
    }

    /// Replace every editable field of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist, or
    /// `RepositoryError::Conflict` if the new SKU or slug is taken.
    pub async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE shop.products SET
                name = $2, slug = $3, description = $4, brand = $5, category = $6,
                sku = $7, price = $8, compare_at_price = $9, stock = $10,
                is_active = $11, is_featured = $12, rating = $13, review_count = $14,
                images = $15, ingredients = $16, tags = $17, specifications = $18,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.slug)
        .bind(&draft.description)
        .bind(&draft.brand)
        .bind(draft.category)
        .bind(&draft.sku)
        .bind(draft.price)
        .bind(draft.compare_at_price)
        .bind(draft.stock)
        .bind(draft.is_active)
        .bind(draft.is_featured)
        .bind(draft.rating)
        .bind(draft.review_count)
        .bind(&draft.images)
        .bind(&draft.ingredients)
        .bind(&draft.tags)
        .bind(Json(&draft.specifications))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_as_conflict(e, DUPLICATE_MESSAGE))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Placed orders keep their line snapshots.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
