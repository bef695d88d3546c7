//! Cached catalog snapshot.
//!
//! Listing queries filter, sort and paginate in memory over the active
//! catalog, which is loaded from `PostgreSQL` and cached with `moka` for
//! `CATALOG_CACHE_TTL_SECS`. Admin edits become visible when the entry
//! expires.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tonewood_core::catalog::{Product, Service};
use tonewood_core::{ProductId, ServiceId};
use tracing::{debug, instrument};

use crate::db::{ProductRepository, RepositoryError, ServiceRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CacheKey {
    ActiveProducts,
    Services,
}

#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Services(Arc<Vec<Service>>),
}

/// TTL cache over the active products and all services.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().max_capacity(8).time_to_live(ttl).build(),
        }
    }

    /// Active products, from cache or the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the cache is cold and the query fails.
    #[instrument(skip_all)]
    pub async fn products(&self, pool: &PgPool) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(CacheValue::Products(products)) =
            self.cache.get(&CacheKey::ActiveProducts).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products = Arc::new(ProductRepository::new(pool).list_active().await?);
        debug!(count = products.len(), "Loaded active products");
        self.cache
            .insert(
                CacheKey::ActiveProducts,
                CacheValue::Products(Arc::clone(&products)),
            )
            .await;
        Ok(products)
    }

    /// All services (active and inactive), from cache or the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the cache is cold and the query fails.
    #[instrument(skip_all)]
    pub async fn services(&self, pool: &PgPool) -> Result<Arc<Vec<Service>>, RepositoryError> {
        if let Some(CacheValue::Services(services)) = self.cache.get(&CacheKey::Services).await {
            debug!("Cache hit for services");
            return Ok(services);
        }

        let services = Arc::new(ServiceRepository::new(pool).list().await?);
        self.cache
            .insert(CacheKey::Services, CacheValue::Services(Arc::clone(&services)))
            .await;
        Ok(services)
    }

    /// A single active product.
    ///
    /// Falls back to the database when the id isn't in the cached snapshot,
    /// so products published since the last load are still reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    pub async fn active_product(
        &self,
        pool: &PgPool,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let products = self.products(pool).await?;
        if let Some(product) = products.iter().find(|p| p.id == id) {
            return Ok(Some(product.clone()));
        }
        ProductRepository::new(pool).get_active(id).await
    }

    /// A single active service.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    pub async fn active_service(
        &self,
        pool: &PgPool,
        id: ServiceId,
    ) -> Result<Option<Service>, RepositoryError> {
        let services = self.services(pool).await?;
        if let Some(service) = services.iter().find(|s| s.id == id) {
            return Ok(Some(service.clone()).filter(|s| s.is_active));
        }
        let service = ServiceRepository::new(pool).get(id).await?;
        Ok(service.filter(|s| s.is_active))
    }

    /// Drop cached products, e.g. after an order changed stock levels.
    pub async fn invalidate_products(&self) {
        self.cache.invalidate(&CacheKey::ActiveProducts).await;
    }

    /// Seed the cache directly.
    #[cfg(test)]
    pub(crate) async fn prime(&self, products: Vec<Product>, services: Vec<Service>) {
        self.cache
            .insert(
                CacheKey::ActiveProducts,
                CacheValue::Products(Arc::new(products)),
            )
            .await;
        self.cache
            .insert(CacheKey::Services, CacheValue::Services(Arc::new(services)))
            .await;
    }
}
