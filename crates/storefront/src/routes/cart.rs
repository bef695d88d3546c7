//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Every mutation loads it, applies
//! the change with [`tonewood_core::cart::Cart`] and writes it back, then
//! responds with a fresh snapshot.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tonewood_core::ProductId;
use tonewood_core::ValidationErrors;
use tonewood_core::cart::{CartChange, CartItem, CartSnapshot, MAX_LINE_QUANTITY};
use tonewood_core::wishlist;
use tower_sessions::Session;
use tracing::instrument;

use super::wishlist::SavedView;
use super::{ApiJson, ApiPath};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::SessionStores;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: i64,
}

/// Cart plus saved-for-later, returned when a line moves between them.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartAndSaved {
    pub cart: CartSnapshot,
    pub saved_for_later: SavedView,
}

fn log_change(change: CartChange) {
    if change != CartChange::Unchanged {
        tracing::debug!(?change, "Cart updated");
    }
}

/// `GET /api/cart`
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartSnapshot>> {
    let cart = SessionStores::new(&session).cart().await?;
    Ok(Json(cart.snapshot()))
}

/// `POST /api/cart/items`
///
/// Adds `quantity` (default 1) of an active, in-stock product, merging with
/// an existing line.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<AddItem>,
) -> Result<Json<CartSnapshot>> {
    let requested = body.quantity.unwrap_or(1);
    let quantity = u32::try_from(requested)
        .ok()
        .filter(|q| (1..=MAX_LINE_QUANTITY).contains(q))
        .ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.add(
                "quantity",
                format!("must be between 1 and {MAX_LINE_QUANTITY}"),
            );
            AppError::Validation(errors)
        })?;

    let product = state
        .catalog()
        .active_product(state.pool(), body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", body.product_id)))?;

    if !product.in_stock() {
        let mut errors = ValidationErrors::new();
        errors.add("productId", "is out of stock");
        return Err(AppError::Validation(errors));
    }

    let stores = SessionStores::new(&session);
    let mut cart = stores.cart().await?;
    log_change(cart.add(CartItem::from_product(&product, quantity)));
    stores.save_cart(&cart).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", &product.id.to_string())]),
    );
    Ok(Json(cart.snapshot()))
}

/// `PATCH /api/cart/items/{id}`
///
/// Sets the quantity; zero or less removes the line. Unknown ids are a
/// no-op.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<UpdateQuantity>,
) -> Result<Json<CartSnapshot>> {
    let stores = SessionStores::new(&session);
    let mut cart = stores.cart().await?;
    log_change(cart.update_quantity(id, body.quantity));
    stores.save_cart(&cart).await?;
    Ok(Json(cart.snapshot()))
}

/// `DELETE /api/cart/items/{id}`
#[instrument(skip(session))]
pub async fn remove(session: Session, ApiPath(id): ApiPath<ProductId>) -> Result<Json<CartSnapshot>> {
    let stores = SessionStores::new(&session);
    let mut cart = stores.cart().await?;
    log_change(cart.remove(id));
    stores.save_cart(&cart).await?;
    Ok(Json(cart.snapshot()))
}

/// `DELETE /api/cart`
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartSnapshot>> {
    let stores = SessionStores::new(&session);
    let mut cart = stores.cart().await?;
    log_change(cart.clear());
    stores.save_cart(&cart).await?;
    Ok(Json(cart.snapshot()))
}

/// `POST /api/cart/items/{id}/save-for-later`
#[instrument(skip(session))]
pub async fn save_for_later(
    session: Session,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<CartAndSaved>> {
    let stores = SessionStores::new(&session);
    let mut cart = stores.cart().await?;
    let mut saved = stores.saved_for_later().await?;

    if !wishlist::save_for_later(&mut cart, &mut saved, id) {
        return Err(AppError::NotFound(format!("cart line for product {id}")));
    }

    stores.save_cart(&cart).await?;
    stores.save_saved_for_later(&saved).await?;
    Ok(Json(CartAndSaved {
        cart: cart.snapshot(),
        saved_for_later: SavedView::from(&saved),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::Client;

    #[tokio::test]
    async fn test_empty_cart() {
        let mut client = Client::new().await;
        let (status, body) = client.get("/api/cart").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"], json!([]));
        assert_eq!(body["totalItems"], 0);
        assert_eq!(body["totalPrice"], "0");
    }

    #[tokio::test]
    async fn test_add_merge_and_totals() {
        let mut client = Client::new().await;
        client
            .send("POST", "/api/cart/items", Some(json!({ "productId": 1, "quantity": 2 })))
            .await;
        client
            .send("POST", "/api/cart/items", Some(json!({ "productId": 3 })))
            .await;
        let (status, body) = client
            .send("POST", "/api/cart/items", Some(json!({ "productId": 3 })))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["uniqueItems"], 2);
        assert_eq!(body["totalItems"], 4);
        assert_eq!(body["totalPrice"], "3400");
        assert_eq!(body["items"][1]["quantity"], 2);
        assert_eq!(body["items"][0]["image"], "/uploads/1.webp");

        // Persisted in the session
        let (_, body) = client.get("/api/cart").await;
        assert_eq!(body["totalItems"], 4);
    }

    #[tokio::test]
    async fn test_add_rejections() {
        let mut client = Client::new().await;
        let (status, body) = client
            .send("POST", "/api/cart/items", Some(json!({ "productId": 5 })))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"]["productId"][0], "is out of stock");

        let (status, _) = client
            .send("POST", "/api/cart/items", Some(json!({ "productId": 1, "quantity": 0 })))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = client
            .send("POST", "/api/cart/items", Some(json!({ "quantity": 1 })))
            .await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_update_zero_removes_line() {
        let mut client = Client::new().await;
        client
            .send("POST", "/api/cart/items", Some(json!({ "productId": 1 })))
            .await;
        client
            .send("POST", "/api/cart/items", Some(json!({ "productId": 2 })))
            .await;

        let (_, body) = client
            .send("PATCH", "/api/cart/items/2", Some(json!({ "quantity": 3 })))
            .await;
        assert_eq!(body["totalItems"], 4);

        let (_, body) = client
            .send("PATCH", "/api/cart/items/1", Some(json!({ "quantity": 0 })))
            .await;
        assert_eq!(body["uniqueItems"], 1);
        assert_eq!(body["totalPrice"], "7500");
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let mut client = Client::new().await;
        client
            .send("POST", "/api/cart/items", Some(json!({ "productId": 1 })))
            .await;
        client
            .send("POST", "/api/cart/items", Some(json!({ "productId": 4 })))
            .await;

        let (_, body) = client.send("DELETE", "/api/cart/items/1", None).await;
        assert_eq!(body["uniqueItems"], 1);

        // Removing again is a no-op
        let (status, _) = client.send("DELETE", "/api/cart/items/1", None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = client.send("DELETE", "/api/cart", None).await;
        assert_eq!(body["items"], json!([]));
    }

    #[tokio::test]
    async fn test_save_for_later_moves_line() {
        let mut client = Client::new().await;
        client
            .send("POST", "/api/cart/items", Some(json!({ "productId": 2, "quantity": 2 })))
            .await;

        let (status, body) = client
            .send("POST", "/api/cart/items/2/save-for-later", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cart"]["items"], json!([]));
        assert_eq!(body["savedForLater"]["count"], 1);
        assert_eq!(body["savedForLater"]["items"][0]["id"], 2);

        let (status, _) = client
            .send("POST", "/api/cart/items/2/save-for-later", None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
