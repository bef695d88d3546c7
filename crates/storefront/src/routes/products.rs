//! Product catalog handlers.
//!
//! Listing runs in memory over the cached active catalog; see
//! [`crate::catalog::CatalogCache`].

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tonewood_core::ProductId;
use tonewood_core::catalog::{Product, ProductCategory};
use tonewood_core::listing::{self, ListingParams, ListingQuery, Pagination};
use tracing::instrument;

use super::{ApiPath, ApiQuery};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// How many related products a detail page shows.
const RELATED_LIMIT: usize = 4;

#[derive(Serialize)]
struct ProductList<'a> {
    products: Vec<&'a Product>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<Pagination>,
}

#[derive(Serialize)]
struct CategoryCount {
    slug: &'static str,
    name: &'static str,
    count: usize,
}

/// `GET /api/products`
///
/// `sortBy` is one of `price`, `name`, `rating` or `createdAt`, and
/// `sortOrder` (`asc`/`desc`) flips any of them.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListingParams>,
) -> Result<Response> {
    let query = params.into_query(Some(true))?;
    let products = state.catalog().products(state.pool()).await?;
    let page = listing::list(products.iter(), &query);

    Ok(Json(ProductList {
        products: page.items,
        pagination: Some(page.pagination),
    })
    .into_response())
}

/// `GET /api/products/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    state
        .catalog()
        .active_product(state.pool(), id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// `GET /api/products/{id}/related`
///
/// Other active products in the same category, featured first.
#[instrument(skip(state))]
pub async fn related(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Response> {
    let product = state
        .catalog()
        .active_product(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let products = state.catalog().products(state.pool()).await?;
    let query = ListingQuery {
        category: Some(product.category.slug().to_owned()),
        active: Some(true),
        ..ListingQuery::default()
    };
    let related: Vec<&Product> = listing::filter_and_sort(products.iter(), &query)
        .into_iter()
        .filter(|p| p.id != id)
        .take(RELATED_LIMIT)
        .collect();

    Ok(Json(ProductList {
        products: related,
        pagination: None,
    })
    .into_response())
}

/// `GET /api/categories`
///
/// Every category, including empty ones, with its active product count.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Response> {
    let products = state.catalog().products(state.pool()).await?;
    let categories: Vec<CategoryCount> = ProductCategory::ALL
        .iter()
        .map(|&category| CategoryCount {
            slug: category.slug(),
            name: category.display_name(),
            count: products
                .iter()
                .filter(|p| p.is_active && p.category == category)
                .count(),
        })
        .collect();

    Ok(Json(serde_json::json!({ "categories": categories })).into_response())
}
