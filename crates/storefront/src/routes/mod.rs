//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET    /api/products                         - Filtered, sorted, paginated listing
//! GET    /api/products/{id}                    - Product detail
//! GET    /api/products/{id}/related            - Up to 4 products from the same category
//! GET    /api/categories                       - Categories with product counts
//! GET    /api/services                         - Service listing
//! GET    /api/services/{id}                    - Service detail
//! GET    /api/services/{id}/availability       - Bookable slots for a date
//!
//! # Session stores
//! GET    /api/cart                             - Cart snapshot
//! DELETE /api/cart                             - Clear cart
//! POST   /api/cart/items                       - Add a product
//! PATCH  /api/cart/items/{id}                  - Set quantity (<= 0 removes)
//! DELETE /api/cart/items/{id}                  - Remove a line
//! POST   /api/cart/items/{id}/save-for-later   - Move a line to saved-for-later
//! GET    /api/wishlist                         - Wishlist
//! DELETE /api/wishlist                         - Clear wishlist
//! POST   /api/wishlist/items                   - Add a product
//! POST   /api/wishlist/toggle                  - Add or remove a product
//! DELETE /api/wishlist/items/{id}              - Remove a product
//! POST   /api/wishlist/items/{id}/move-to-cart - Copy a product into the cart
//! GET    /api/saved-for-later                  - Saved-for-later items
//! DELETE /api/saved-for-later/{id}             - Drop a saved item
//! POST   /api/saved-for-later/{id}/move-to-cart - Move a saved item into the cart
//!
//! # Submissions
//! POST   /api/bookings                         - Book a service appointment
//! POST   /api/orders                           - Place an order from explicit lines
//! POST   /api/checkout                         - Place an order from the session cart
//! POST   /api/custom-guitar                    - Request a custom build
//! ```

pub mod bookings;
pub mod cart;
pub mod custom_guitar;
pub mod orders;
pub mod products;
pub mod services;
pub mod wishlist;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor whose rejection renders as an `AppError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejection renders as an `AppError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Query extractor whose rejection renders as an `AppError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Catalog reads: products, categories, services.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/products/{id}/related", get(products::related))
        .route("/categories", get(products::categories))
        .route("/services", get(services::index))
        .route("/services/{id}", get(services::show))
        .route("/services/{id}/availability", get(services::availability))
}

/// Session-owned cart, wishlist and saved-for-later.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show).delete(cart::clear))
        .route("/cart/items", post(cart::add))
        .route(
            "/cart/items/{id}",
            axum::routing::patch(cart::update).delete(cart::remove),
        )
        .route("/cart/items/{id}/save-for-later", post(cart::save_for_later))
        .route("/wishlist", get(wishlist::show).delete(wishlist::clear))
        .route("/wishlist/items", post(wishlist::add))
        .route("/wishlist/toggle", post(wishlist::toggle))
        .route("/wishlist/items/{id}", axum::routing::delete(wishlist::remove))
        .route(
            "/wishlist/items/{id}/move-to-cart",
            post(wishlist::move_to_cart),
        )
        .route("/saved-for-later", get(wishlist::show_saved))
        .route(
            "/saved-for-later/{id}",
            axum::routing::delete(wishlist::remove_saved),
        )
        .route(
            "/saved-for-later/{id}/move-to-cart",
            post(wishlist::move_saved_to_cart),
        )
}

/// Form submissions that write to the database.
pub fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(bookings::create))
        .route("/orders", post(orders::create))
        .route("/checkout", post(orders::checkout))
        .route("/custom-guitar", post(custom_guitar::create))
}

/// Every API route, without rate limiting, nested under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new().nest(
        "/api",
        catalog_routes()
            .merge(session_routes())
            .merge(submission_routes()),
    )
}
