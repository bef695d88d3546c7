//! HTTP route handlers for the admin API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /auth/login                - Email + password login
//! POST   /auth/logout               - End the session
//! GET    /auth/me                   - Current admin
//!
//! # Catalog (reads: any admin, writes: admin or super_admin)
//! GET    /api/products              - All products incl. inactive, with listing params
//! POST   /api/products              - Create
//! GET    /api/products/{id}         - Detail
//! PUT    /api/products/{id}         - Replace
//! DELETE /api/products/{id}         - Delete
//! GET    /api/services              - All services incl. inactive
//! POST   /api/services              - Create
//! GET    /api/services/{id}         - Detail
//! PUT    /api/services/{id}         - Replace
//! DELETE /api/services/{id}         - Delete (only if never booked)
//! POST   /api/upload                - Multipart product images
//!
//! # Incoming requests
//! GET    /api/bookings?status       - Bookings in appointment order
//! PATCH  /api/bookings/{id}         - Change status
//! GET    /api/orders?status         - Orders, newest first
//! GET    /api/orders/{id}           - Order detail
//! PATCH  /api/orders/{id}           - Change status (cancel restocks)
//! GET    /api/custom-orders?status  - Custom guitar requests
//! PATCH  /api/custom-orders/{id}    - Change status
//! ```

pub mod auth;
pub mod bookings;
pub mod custom_orders;
pub mod orders;
pub mod products;
pub mod services;
pub mod uploads;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRequest, FromRequestParts},
    routing::{get, post},
};
use serde::Deserialize;

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

/// `?status=` filter on review lists.
#[derive(Debug, Deserialize)]
pub struct StatusFilter<S> {
    pub status: Option<S>,
}

/// `{ "status": ... }` body for status changes.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate<S> {
    pub status: S,
}

/// Login, logout and identity.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
}

/// Authenticated API, nested under `/api`.
///
/// `upload_limit` caps the request body of the upload route; every other
/// route keeps axum's default limit.
pub fn api_routes(upload_limit: usize) -> Router<AppState> {
    let api = Router::new()
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/services", get(services::index).post(services::create))
        .route(
            "/services/{id}",
            get(services::show)
                .put(services::update)
                .delete(services::destroy),
        )
        .route(
            "/upload",
            post(uploads::create).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/bookings", get(bookings::index))
        .route("/bookings/{id}", axum::routing::patch(bookings::update))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show).patch(orders::update))
        .route("/custom-orders", get(custom_orders::index))
        .route(
            "/custom-orders/{id}",
            axum::routing::patch(custom_orders::update),
        );

    Router::new().nest("/api", api)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use std::path::Path;

    use axum::{
        Router,
        body::Body,
        extract::Path as UrlPath,
        http::{Request, StatusCode, header},
        routing::post,
    };
    use serde_json::Value;
    use tonewood_core::{AdminRole, AdminUserId, Email};
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, Session, SessionManagerLayer};

    use crate::middleware::session::SESSION_COOKIE_NAME;
    use crate::middleware::set_current_admin;
    use crate::models::CurrentAdmin;
    use crate::state::test_support::lazy_state;

    /// Puts an admin with the given role into the session, standing in for
    /// a database-backed login.
    async fn fake_login(session: Session, UrlPath(role): UrlPath<String>) -> StatusCode {
        let admin = CurrentAdmin {
            id: AdminUserId::new(7),
            email: Email::parse("luthier@tonewood.shop").unwrap(),
            name: "Test Luthier".to_owned(),
            role: role.parse::<AdminRole>().unwrap(),
        };
        set_current_admin(&session, &admin).await.unwrap();
        StatusCode::NO_CONTENT
    }

    pub(crate) fn app(upload_dir: &Path) -> Router {
        let state = lazy_state(upload_dir);
        super::auth_routes()
            .merge(super::api_routes(state.images().request_limit()))
            .route("/test/login/{role}", post(fake_login))
            .layer(SessionManagerLayer::new(MemoryStore::default()).with_name(SESSION_COOKIE_NAME))
            .with_state(state)
    }

    /// A test client that carries the session cookie between requests.
    pub(crate) struct Client {
        app: Router,
        cookie: Option<String>,
        uploads: tempfile::TempDir,
    }

    impl Client {
        pub(crate) fn new() -> Self {
            let uploads = tempfile::tempdir().unwrap();
            Self {
                app: app(uploads.path()),
                cookie: None,
                uploads,
            }
        }

        /// A client already logged in with `role`.
        pub(crate) async fn logged_in(role: &str) -> Self {
            let mut client = Self::new();
            let (status, _) = client.send("POST", &format!("/test/login/{role}"), None).await;
            assert_eq!(status, StatusCode::NO_CONTENT);
            client
        }

        pub(crate) fn upload_dir(&self) -> &Path {
            self.uploads.path()
        }

        pub(crate) async fn request(&mut self, request: Request<Body>) -> (StatusCode, Value) {
            let (mut parts, body) = request.into_parts();
            if let Some(cookie) = &self.cookie {
                parts
                    .headers
                    .insert(header::COOKIE, cookie.parse().unwrap());
            }

            let response = self
                .app
                .clone()
                .oneshot(Request::from_parts(parts, body))
                .await
                .unwrap();
            if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
                let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
                self.cookie = Some(pair.to_owned());
            }

            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, json)
        }

        pub(crate) async fn send(
            &mut self,
            method: &str,
            uri: &str,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let builder = Request::builder().method(method).uri(uri);
            let request = match body {
                Some(json) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            self.request(request).await
        }

        pub(crate) async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
            self.send("GET", uri, None).await
        }
    }
}
