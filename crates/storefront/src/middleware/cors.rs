//! CORS for the single-page storefront client.
//!
//! The client is served from a different origin than the API, so the
//! allowed origins come from `STOREFRONT_ALLOWED_ORIGINS`. Credentials are
//! allowed so the session cookie travels with cart requests.

use std::time::Duration;

use axum::http::{
    HeaderValue, Method,
    header::{ACCEPT, CONTENT_TYPE},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use super::request_id::REQUEST_ID_HEADER;

/// Build the CORS layer for the configured origins.
///
/// Origins that are not valid header values are skipped with a warning.
/// With no usable origins, cross-origin requests are refused.
#[must_use]
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, ACCEPT])
        .expose_headers([axum::http::HeaderName::from_static(REQUEST_ID_HEADER)])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route("/api/cart", get(|| async { "ok" }))
            .layer(cors_layer(&["http://localhost:5173".to_string()]))
    }

    #[tokio::test]
    async fn test_allowed_origin_is_echoed() {
        let response = app()
            .oneshot(
                Request::get("/api/cart")
                    .header("origin", "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            response.headers().get("access-control-allow-credentials").unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_unknown_origin_gets_no_allow_header() {
        let response = app()
            .oneshot(
                Request::get("/api/cart")
                    .header("origin", "https://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }
}
