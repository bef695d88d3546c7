//! Service reads for the storefront.

use sqlx::PgPool;
use tonewood_core::ServiceId;
use tonewood_core::catalog::Service;

use super::RepositoryError;

pub(crate) const SERVICE_COLUMNS: &str = "id, name, slug, description, category, price, \
     duration_minutes, is_active, is_featured, image, features, created_at, updated_at";

/// Repository for service reads.
pub struct ServiceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ServiceRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every service, featured first then by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Service>, RepositoryError> {
        let services = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM shop.services ORDER BY is_featured DESC, name"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(services)
    }

    /// A single service, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ServiceId) -> Result<Option<Service>, RepositoryError> {
        let service = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM shop.services WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(service)
    }
}
