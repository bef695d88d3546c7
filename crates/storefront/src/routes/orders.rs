//! Order placement handlers.
//!
//! Both endpoints end in [`OrderRepository::place`], which re-reads prices
//! and stock under lock. `POST /api/orders` takes explicit lines;
//! `POST /api/checkout` takes them from the session cart and empties the
//! cart once the order is written.

use axum::{Json, extract::State, http::StatusCode};
use tonewood_core::checkout::{CheckoutRequest, Order};
use tower_sessions::Session;
use tracing::instrument;

use super::ApiJson;
use crate::db::OrderRepository;
use crate::error::{Result, add_breadcrumb};
use crate::models::SessionStores;
use crate::state::AppState;

async fn place(state: &AppState, request: &CheckoutRequest) -> Result<Order> {
    let checkout = request.validate()?;
    let order = OrderRepository::new(state.pool())
        .place(&checkout, &state.config().pricing)
        .await?;

    // Stock changed; the cached catalog must not keep selling it
    state.catalog().invalidate_products().await;
    add_breadcrumb(
        "order",
        "Order placed",
        Some(&[("order_number", &order.order_number)]),
    );
    Ok(order)
}

/// `POST /api/orders`
#[instrument(skip(state, request))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = place(&state, &request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// `POST /api/checkout`
///
/// Any `items` in the body are ignored in favour of the session cart.
#[instrument(skip(state, session, request))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let stores = SessionStores::new(&session);
    let mut cart = stores.cart().await?;

    let order = place(&state, &request.with_cart(&cart)).await?;

    cart.clear();
    stores.save_cart(&cart).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
