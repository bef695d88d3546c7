//! Order review and fulfilment handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use tonewood_core::checkout::Order;
use tonewood_core::{OrderId, OrderStatus};
use tracing::instrument;

use super::{ApiJson, ApiPath, ApiQuery, StatusFilter, StatusUpdate};
use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

#[derive(Serialize)]
pub struct OrderList {
    orders: Vec<Order>,
}

/// `GET /api/orders?status=`
///
/// Newest first.
#[instrument(skip(state, _admin))]
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<StatusFilter<OrderStatus>>,
) -> Result<Json<OrderList>> {
    let orders = OrderRepository::new(state.pool()).list(filter.status).await?;
    Ok(Json(OrderList { orders }))
}

/// `GET /api/orders/{id}`
#[instrument(skip(state, _admin))]
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

/// `PATCH /api/orders/{id}`
///
/// Moving an order to `cancelled` returns its units to stock.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<StatusUpdate<OrderStatus>>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .update_status(id, body.status)
        .await?;
    Ok(Json(order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::Client;

    #[tokio::test]
    async fn test_orders_require_login() {
        let mut client = Client::new();
        let (status, _) = client.get("/api/orders").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = client.get("/api/orders/1").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_status_body_is_required() {
        let mut client = Client::logged_in("admin").await;
        let (status, _) = client
            .send("PATCH", "/api/orders/1", Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
