//! Service CRUD.

use sqlx::PgPool;
use tonewood_core::ServiceId;
use tonewood_core::catalog::{Service, ServiceDraft};

use super::RepositoryError;

const SERVICE_COLUMNS: &str = "id, name, slug, description, category, price, \
     duration_minutes, is_active, is_featured, image, features, created_at, updated_at";

const DUPLICATE_MESSAGE: &str = "A service with that slug already exists";

/// Repository for service administration.
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
    pub async fn list_all(&self) -> Result<Vec<Service>, RepositoryError> {
        let services = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM shop.services ORDER BY is_featured DESC, name"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(services)
    }

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

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, draft: &ServiceDraft) -> Result<Service, RepositoryError> {
        sqlx::query_as::<_, Service>(&format!(
            r"
            INSERT INTO shop.services
                (name, slug, description, category, price, duration_minutes,
                 is_active, is_featured, image, features)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {SERVICE_COLUMNS}
            "
        ))
        .bind(&draft.name)
        .bind(&draft.slug)
        .bind(&draft.description)
        .bind(draft.category)
        .bind(draft.price)
        .bind(draft.duration_minutes)
        .bind(draft.is_active)
        .bind(draft.is_featured)
        .bind(draft.image.as_deref())
        .bind(&draft.features)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_as_conflict(e, DUPLICATE_MESSAGE))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the service doesn't exist, or
    /// `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(
        &self,
        id: ServiceId,
        draft: &ServiceDraft,
    ) -> Result<Service, RepositoryError> {
        sqlx::query_as::<_, Service>(&format!(
            r"
            UPDATE shop.services SET
                name = $2, slug = $3, description = $4, category = $5, price = $6,
                duration_minutes = $7, is_active = $8, is_featured = $9, image = $10,
                features = $11, updated_at = NOW()
            WHERE id = $1
            RETURNING {SERVICE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.slug)
        .bind(&draft.description)
        .bind(draft.category)
        .bind(draft.price)
        .bind(draft.duration_minutes)
        .bind(draft.is_active)
        .bind(draft.is_featured)
        .bind(draft.image.as_deref())
        .bind(&draft.features)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_as_conflict(e, DUPLICATE_MESSAGE))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a service that has never been booked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the service doesn't exist, or
    /// `RepositoryError::Conflict` if bookings still reference it.
    pub async fn delete(&self, id: ServiceId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.services WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    RepositoryError::Conflict(
                        "This service has bookings; deactivate it instead".to_owned(),
                    )
                }
                other => RepositoryError::Database(other),
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
