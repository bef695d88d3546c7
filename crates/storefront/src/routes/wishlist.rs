//! Wishlist and saved-for-later handlers.
//!
//! Both collections share [`SavedCollection`] and render as a [`SavedView`].
//! Moving a wishlist item to the cart keeps the wishlist entry; moving a
//! saved-for-later item removes it.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tonewood_core::cart::CartSnapshot;
use tonewood_core::wishlist::{self, SavedCollection, SavedItem};
use tonewood_core::{Price, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use super::{ApiJson, ApiPath};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::SessionStores;
use crate::state::AppState;

/// A saved collection with its aggregates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedView {
    pub items: Vec<SavedItem>,
    pub count: usize,
    pub total_price: Price,
}

impl<K> From<&SavedCollection<K>> for SavedView {
    fn from(collection: &SavedCollection<K>) -> Self {
        Self {
            items: collection.items().to_vec(),
            count: collection.len(),
            total_price: collection.total_price(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub product_id: ProductId,
}

#[derive(Debug, Serialize)]
pub struct Toggled {
    pub wishlisted: bool,
    pub wishlist: SavedView,
}

#[derive(Debug, Serialize)]
pub struct CartAndWishlist {
    pub cart: CartSnapshot,
    pub wishlist: SavedView,
}

/// `GET /api/wishlist`
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<SavedView>> {
    let wishlist = SessionStores::new(&session).wishlist().await?;
    Ok(Json(SavedView::from(&wishlist)))
}

/// `POST /api/wishlist/items`
///
/// Idempotent: adding a product that is already saved changes nothing.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<ProductRef>,
) -> Result<Json<SavedView>> {
    let product = state
        .catalog()
        .active_product(state.pool(), body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", body.product_id)))?;

    let stores = SessionStores::new(&session);
    let mut wishlist = stores.wishlist().await?;
    if wishlist.add(SavedItem::from_product(&product)) {
        stores.save_wishlist(&wishlist).await?;
        add_breadcrumb(
            "wishlist",
            "Added to wishlist",
            Some(&[("product_id", &product.id.to_string())]),
        );
    }
    Ok(Json(SavedView::from(&wishlist)))
}

/// `POST /api/wishlist/toggle`
#[instrument(skip(state, session))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<ProductRef>,
) -> Result<Json<Toggled>> {
    let stores = SessionStores::new(&session);
    let mut wishlist = stores.wishlist().await?;

    // Removing doesn't need the product to still be for sale
    let wishlisted = if let Some(existing) = wishlist.get(body.product_id).cloned() {
        wishlist.toggle(existing)
    } else {
        let product = state
            .catalog()
            .active_product(state.pool(), body.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {}", body.product_id)))?;
        wishlist.toggle(SavedItem::from_product(&product))
    };

    stores.save_wishlist(&wishlist).await?;
    Ok(Json(Toggled {
        wishlisted,
        wishlist: SavedView::from(&wishlist),
    }))
}

/// `DELETE /api/wishlist/items/{id}`
#[instrument(skip(session))]
pub async fn remove(session: Session, ApiPath(id): ApiPath<ProductId>) -> Result<Json<SavedView>> {
    let stores = SessionStores::new(&session);
    let mut wishlist = stores.wishlist().await?;
    if wishlist.remove(id).is_some() {
        stores.save_wishlist(&wishlist).await?;
    }
    Ok(Json(SavedView::from(&wishlist)))
}

/// `DELETE /api/wishlist`
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<SavedView>> {
    let stores = SessionStores::new(&session);
    let mut wishlist = stores.wishlist().await?;
    let removed = wishlist.clear();
    stores.save_wishlist(&wishlist).await?;
    tracing::debug!(removed, "Wishlist cleared");
    Ok(Json(SavedView::from(&wishlist)))
}

/// `POST /api/wishlist/items/{id}/move-to-cart`
#[instrument(skip(session))]
pub async fn move_to_cart(
    session: Session,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<CartAndWishlist>> {
    let stores = SessionStores::new(&session);
    let wishlist = stores.wishlist().await?;
    if !wishlist.contains(id) {
        return Err(AppError::NotFound(format!("wishlist item {id}")));
    }

    let mut cart = stores.cart().await?;
    wishlist::wishlist_to_cart(&wishlist, &mut cart, id);
    stores.save_cart(&cart).await?;

    Ok(Json(CartAndWishlist {
        cart: cart.snapshot(),
        wishlist: SavedView::from(&wishlist),
    }))
}

/// `GET /api/saved-for-later`
#[instrument(skip(session))]
pub async fn show_saved(session: Session) -> Result<Json<SavedView>> {
    let saved = SessionStores::new(&session).saved_for_later().await?;
    Ok(Json(SavedView::from(&saved)))
}

/// `DELETE /api/saved-for-later/{id}`
#[instrument(skip(session))]
pub async fn remove_saved(
    session: Session,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<SavedView>> {
    let stores = SessionStores::new(&session);
    let mut saved = stores.saved_for_later().await?;
    if saved.remove(id).is_some() {
        stores.save_saved_for_later(&saved).await?;
    }
    Ok(Json(SavedView::from(&saved)))
}

/// `POST /api/saved-for-later/{id}/move-to-cart`
#[instrument(skip(session))]
pub async fn move_saved_to_cart(
    session: Session,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<super::cart::CartAndSaved>> {
    let stores = SessionStores::new(&session);
    let mut saved = stores.saved_for_later().await?;
    if !saved.contains(id) {
        return Err(AppError::NotFound(format!("saved item {id}")));
    }

    let mut cart = stores.cart().await?;
    wishlist::move_to_cart(&mut saved, &mut cart, id);
    stores.save_cart(&cart).await?;
    stores.save_saved_for_later(&saved).await?;

    Ok(Json(super::cart::CartAndSaved {
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
    async fn test_add_is_idempotent() {
        let mut client = Client::new().await;
        for _ in 0..2 {
            client
                .send("POST", "/api/wishlist/items", Some(json!({ "productId": 2 })))
                .await;
        }
        let (status, body) = client.get("/api/wishlist").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["totalPrice"], "2500");
        assert!(body["items"][0]["savedAt"].is_string());
    }

    #[tokio::test]
    async fn test_toggle_adds_then_removes() {
        let mut client = Client::new().await;
        let (_, body) = client
            .send("POST", "/api/wishlist/toggle", Some(json!({ "productId": 3 })))
            .await;
        assert_eq!(body["wishlisted"], true);
        assert_eq!(body["wishlist"]["count"], 1);

        let (_, body) = client
            .send("POST", "/api/wishlist/toggle", Some(json!({ "productId": 3 })))
            .await;
        assert_eq!(body["wishlisted"], false);
        assert_eq!(body["wishlist"]["count"], 0);
    }

    #[tokio::test]
    async fn test_move_to_cart_keeps_wishlist_entry() {
        let mut client = Client::new().await;
        client
            .send("POST", "/api/wishlist/items", Some(json!({ "productId": 4 })))
            .await;
        let (status, body) = client
            .send("POST", "/api/wishlist/items/4/move-to-cart", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cart"]["items"][0]["quantity"], 1);
        assert_eq!(body["wishlist"]["count"], 1);

        let (status, _) = client
            .send("POST", "/api/wishlist/items/1/move-to-cart", None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let mut client = Client::new().await;
        for id in [1, 2, 3] {
            client
                .send("POST", "/api/wishlist/items", Some(json!({ "productId": id })))
                .await;
        }
        let (_, body) = client.send("DELETE", "/api/wishlist/items/2", None).await;
        assert_eq!(body["count"], 2);

        let (_, body) = client.send("DELETE", "/api/wishlist", None).await;
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn test_saved_for_later_round_trip() {
        let mut client = Client::new().await;
        client
            .send("POST", "/api/cart/items", Some(json!({ "productId": 1, "quantity": 3 })))
            .await;
        client
            .send("POST", "/api/cart/items", Some(json!({ "productId": 2 })))
            .await;
        client
            .send("POST", "/api/cart/items/1/save-for-later", None)
            .await;
        client
            .send("POST", "/api/cart/items/2/save-for-later", None)
            .await;

        let (_, body) = client.get("/api/saved-for-later").await;
        assert_eq!(body["count"], 2);

        // Comes back as a single unit
        let (status, body) = client
            .send("POST", "/api/saved-for-later/1/move-to-cart", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cart"]["totalItems"], 1);
        assert_eq!(body["savedForLater"]["count"], 1);

        let (_, body) = client.send("DELETE", "/api/saved-for-later/2", None).await;
        assert_eq!(body["count"], 0);
    }
}
