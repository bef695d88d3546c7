//! Custom guitar request handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use tonewood_core::custom_order::CustomGuitarRequest;
use tonewood_core::{CustomOrderId, CustomOrderStatus};
use tracing::instrument;

use super::{ApiJson, ApiPath, ApiQuery, StatusFilter, StatusUpdate};
use crate::db::CustomOrderRepository;
use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomOrderList {
    custom_orders: Vec<CustomGuitarRequest>,
}

/// `GET /api/custom-orders?status=`
#[instrument(skip(state, _admin))]
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<StatusFilter<CustomOrderStatus>>,
) -> Result<Json<CustomOrderList>> {
    let custom_orders = CustomOrderRepository::new(state.pool())
        .list(filter.status)
        .await?;
    Ok(Json(CustomOrderList { custom_orders }))
}

/// `PATCH /api/custom-orders/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CustomOrderId>,
    ApiJson(body): ApiJson<StatusUpdate<CustomOrderStatus>>,
) -> Result<Json<CustomGuitarRequest>> {
    let request = CustomOrderRepository::new(state.pool())
        .update_status(id, body.status)
        .await?;
    Ok(Json(request))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::Client;

    #[tokio::test]
    async fn test_viewer_cannot_quote() {
        let mut client = Client::logged_in("viewer").await;
        let (status, body) = client
            .send("PATCH", "/api/custom-orders/4", Some(json!({ "status": "quoted" })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("read-only"));
    }

    #[tokio::test]
    async fn test_booking_status_is_not_a_custom_order_status() {
        let mut client = Client::logged_in("viewer").await;
        let (status, _) = client.get("/api/custom-orders?status=confirmed").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
