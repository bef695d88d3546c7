//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Two tiers:
//! - `submit_rate_limiter`: bookings, orders, checkout and custom guitar
//!   requests (~12/min per IP)
//! - `browse_rate_limiter`: catalog, cart and wishlist (~120/min per IP)
//!
//! Rejections render through [`AppError`] so clients get the usual JSON body.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderValue, Request, header};
use axum::response::{IntoResponse, Response};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::error::AppError;

/// Proxy headers checked for the client IP, most trusted first.
const CLIENT_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "fly-client-ip", "x-real-ip"];

/// Key extractor that reads the client IP from proxy headers.
///
/// Checks `CF-Connecting-IP`, `Fly-Client-IP` and `X-Real-IP`, then the
/// first entry of `X-Forwarded-For`, then the peer address when the server
/// was started with connect info.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip(req.headers())
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|info| info.0.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

fn client_ip(headers: &axum::http::HeaderMap) -> Option<IpAddr> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    CLIENT_IP_HEADERS
        .iter()
        .find_map(|name| header(name).and_then(|s| s.trim().parse().ok()))
        .or_else(|| {
            header("x-forwarded-for")
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse().ok())
        })
}

/// Render a governor rejection as an [`AppError`] response.
///
/// Throttled requests get a 429 with `Retry-After` and any quota headers the
/// limiter attached.
fn rejection(err: GovernorError) -> Response {
    match err {
        GovernorError::TooManyRequests { wait_time, headers } => {
            tracing::debug!(wait_time, "request throttled");
            let mut response = AppError::RateLimited.into_response();
            let response_headers = response.headers_mut();
            if let Some(extra) = headers {
                response_headers.extend(extra);
            }
            response_headers.insert(header::RETRY_AFTER, HeaderValue::from(wait_time));
            response
        }
        GovernorError::UnableToExtractKey => {
            AppError::Internal("could not determine client address".to_owned()).into_response()
        }
        GovernorError::Other { msg, .. } => {
            AppError::Internal(msg.unwrap_or_else(|| "rate limiter failure".to_owned()))
                .into_response()
        }
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Limiter for write endpoints: one token every 5 seconds, burst of 6.
///
/// # Panics
///
/// Never panics: both parameters are positive constants.
#[must_use]
pub fn submit_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(5)
        .burst_size(6)
        .finish()
        .expect("rate limiter config with per_second(5) and burst_size(6) is valid");
    GovernorLayer::new(Arc::new(config)).error_handler(rejection)
}

/// Limiter for read and session endpoints: replenish every 500ms, burst of 60.
///
/// # Panics
///
/// Never panics: both parameters are positive constants.
#[must_use]
pub fn browse_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_millisecond(500)
        .burst_size(60)
        .finish()
        .expect("rate limiter config with per_millisecond(500) and burst_size(60) is valid");
    GovernorLayer::new(Arc::new(config)).error_handler(rejection)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use tower::ServiceExt;

    use super::*;

    async fn submit(app: &Router, ip: &'static str) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri("/api/orders")
            .header("x-real-ip", ip)
            .body(Body::empty())
            .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_throttled_requests_get_json_429() {
        let app = Router::new()
            .route("/api/orders", post(|| async { StatusCode::CREATED }))
            .layer(submit_rate_limiter());

        for _ in 0..6 {
            assert_eq!(submit(&app, "192.0.2.7").await.status(), StatusCode::CREATED);
        }

        let response = submit(&app, "192.0.2.7").await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Rate limited");

        // Buckets are per client.
        assert_eq!(submit(&app, "192.0.2.8").await.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_missing_client_address_is_a_server_error() {
        let response = rejection(GovernorError::UnableToExtractKey);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_prefers_cloudflare_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        headers.insert("cf-connecting-ip", HeaderValue::from_static("203.0.113.9"));
        assert_eq!(client_ip(&headers), "203.0.113.9".parse().ok());
    }

    #[test]
    fn test_falls_back_to_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 198.51.100.4 , 10.0.0.2"));
        assert_eq!(client_ip(&headers), "198.51.100.4".parse().ok());
    }

    #[test]
    fn test_no_headers_no_key() {
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
