//! Seed the catalog from a YAML file.
//!
//! The file holds the same payloads the admin API accepts:
//!
//! ```yaml
//! products:
//!   - name: Telecaster '52 Reissue
//!     brand: Fender
//!     category: guitars
//!     sku: FEN-TELE-52
//!     price: 1899.00
//! services:
//!   - name: Full Setup
//!     category: setup
//!     price: 89
//!     durationMinutes: 60
//! ```
//!
//! Every entry is validated before connecting. Entries whose SKU or slug
//! already exists are skipped, so seeding twice is harmless.

use std::path::Path;

use serde::Deserialize;
use sqlx::PgPool;
use tonewood_admin::db::{self, ProductRepository, RepositoryError, ServiceRepository};
use tonewood_core::catalog::{ProductDraft, ProductInput, ServiceDraft, ServiceInput};
use tracing::{error, info};

/// Contents of a catalog seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    pub products: Vec<ProductInput>,
    pub services: Vec<ServiceInput>,
}

/// A seed file that passed validation.
#[derive(Debug)]
pub struct ValidCatalog {
    pub products: Vec<ProductDraft>,
    pub services: Vec<ServiceDraft>,
}

/// Validate every entry, collecting one message per invalid entry.
///
/// # Errors
///
/// Returns the messages if any entry is invalid.
pub fn validate_catalog(file: &CatalogFile) -> Result<ValidCatalog, Vec<String>> {
    let mut problems = Vec::new();

    let products = file
        .products
        .iter()
        .enumerate()
        .filter_map(|(i, input)| {
            input
                .validate()
                .map_err(|e| {
                    problems.push(format!("products[{i}] {}: {}", input.name, e.summary()));
                })
                .ok()
        })
        .collect();

    let services = file
        .services
        .iter()
        .enumerate()
        .filter_map(|(i, input)| {
            input
                .validate()
                .map_err(|e| {
                    problems.push(format!("services[{i}] {}: {}", input.name, e.summary()));
                })
                .ok()
        })
        .collect();

    if problems.is_empty() {
        Ok(ValidCatalog { products, services })
    } else {
        Err(problems)
    }
}

/// Read and parse a catalog file without touching the database.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable or not valid YAML.
pub async fn read_catalog(path: &Path) -> Result<CatalogFile, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Counts from one seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub inserted: usize,
    pub skipped: usize,
}

/// Remove products, and services nobody has booked.
async fn clear_catalog(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    let products = sqlx::query("DELETE FROM shop.products")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let services = sqlx::query(
        r"
        DELETE FROM shop.services s
        WHERE NOT EXISTS (SELECT 1 FROM shop.bookings b WHERE b.service_id = s.id)
        ",
    )
    .execute(&mut *tx)
    .await?
    .rows_affected();
    tx.commit().await?;

    info!(products, services, "Cleared existing catalog");
    Ok(())
}

fn tally(
    result: &mut SeedResult,
    outcome: Result<(), RepositoryError>,
    label: &str,
) -> Result<(), RepositoryError> {
    match outcome {
        Ok(()) => result.inserted += 1,
        Err(RepositoryError::Conflict(_)) => {
            info!("  skipped {label} (already exists)");
            result.skipped += 1;
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

async fn insert_catalog(
    pool: &PgPool,
    catalog: &ValidCatalog,
) -> Result<SeedResult, RepositoryError> {
    let mut result = SeedResult::default();

    let products = ProductRepository::new(pool);
    for draft in &catalog.products {
        let outcome = products.create(draft).await.map(|_| ());
        tally(&mut result, outcome, &draft.sku)?;
    }

    let services = ServiceRepository::new(pool);
    for draft in &catalog.services {
        let outcome = services.create(draft).await.map(|_| ());
        tally(&mut result, outcome, &draft.slug)?;
    }

    Ok(result)
}

/// Seed products and services from a YAML file.
///
/// # Arguments
///
/// * `file_path` - Path to the YAML catalog
/// * `clear_existing` - If true, delete the current catalog first
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, the database URL is
/// not set, or a database operation fails.
pub async fn catalog(
    file_path: &str,
    clear_existing: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(path = %file_path, "Loading catalog from file");
    let file = read_catalog(Path::new(file_path)).await?;
    info!(
        products = file.products.len(),
        services = file.services.len(),
        "Parsed catalog"
    );

    let catalog = validate_catalog(&file).map_err(|problems| {
        error!("Catalog validation failed:");
        for problem in &problems {
            error!("  - {problem}");
        }
        format!("{} invalid entries found", problems.len())
    })?;

    let database_url =
        super::database_url("ADMIN_DATABASE_URL").ok_or("DATABASE_URL not set")?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    if clear_existing {
        clear_catalog(&pool).await?;
    }

    let result = insert_catalog(&pool, &catalog).await?;

    info!("Seeding complete!");
    info!("  Inserted: {}", result.inserted);
    info!("  Skipped (already exist): {}", result.skipped);
    Ok(())
}

/// Show row counts for the catalog and incoming requests.
///
/// # Errors
///
/// Returns an error if database connection fails.
pub async fn stats() -> Result<(), Box<dyn std::error::Error>> {
    let database_url =
        super::database_url("ADMIN_DATABASE_URL").ok_or("DATABASE_URL not set")?;
    let pool = db::create_pool(&database_url).await?;

    let (products, active_products): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active) FROM shop.products",
    )
    .fetch_one(&pool)
    .await?;
    let (services, active_services): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active) FROM shop.services",
    )
    .fetch_one(&pool)
    .await?;

    info!("Tonewood Statistics");
    info!("===================");
    info!("Products: {products} ({active_products} active)");
    info!("Services: {services} ({active_services} active)");

    for table in ["bookings", "orders", "custom_orders"] {
        let counts: Vec<(String, i64)> = sqlx::query_as(&format!(
            "SELECT status::text, COUNT(*) FROM shop.{table} GROUP BY status ORDER BY status"
        ))
        .fetch_all(&pool)
        .await?;

        info!("{table}:");
        if counts.is_empty() {
            info!("  (none)");
        }
        for (status, count) in counts {
            info!("  {status}: {count}");
        }
    }

    Ok(())
}
