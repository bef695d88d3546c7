//! Product administration handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tonewood_core::ProductId;
use tonewood_core::catalog::{Product, ProductInput};
use tonewood_core::listing::{self, ListingParams, Pagination};
use tracing::instrument;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ProductList {
    products: Vec<Product>,
    pagination: Pagination,
}

/// `GET /api/products`
///
/// Same listing parameters as the storefront, but inactive products are
/// included unless `isActive` says otherwise.
#[instrument(skip(state, _admin))]
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListingParams>,
) -> Result<Json<ProductList>> {
    let query = params.into_query(None)?;
    let products = ProductRepository::new(state.pool()).list_all().await?;
    let page = listing::list(products.iter(), &query).map(Clone::clone);

    Ok(Json(ProductList {
        products: page.items,
        pagination: page.pagination,
    }))
}

/// `GET /api/products/{id}`
#[instrument(skip(state, _admin))]
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// `POST /api/products`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id, sku = %input.sku))]
pub async fn create(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let draft = input.validate()?;
    let product = ProductRepository::new(state.pool()).create(&draft).await?;
    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/{id}`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<Product>> {
    let draft = input.validate()?;
    let product = ProductRepository::new(state.pool()).update(id, &draft).await?;
    tracing::info!("Product updated");
    Ok(Json(product))
}

/// `DELETE /api/products/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn destroy(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;
    tracing::info!("Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
