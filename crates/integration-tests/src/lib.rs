//! Integration tests for Tonewood.
//!
//! # Running Tests
//!
//! ```bash
//! # Database, migrations and the starter catalog
//! tw-cli migrate
//! tw-cli seed catalog seed/catalog.yaml
//! tw-cli admin create -e qa@tonewood.shop -n QA -r admin --password 'integration-tests'
//!
//! # Both servers
//! cargo run -p tonewood-storefront &
//! cargo run -p tonewood-admin &
//!
//! TW_TEST_ADMIN_EMAIL=qa@tonewood.shop TW_TEST_ADMIN_PASSWORD=integration-tests \
//!     cargo test -p tonewood-integration-tests -- --ignored
//! ```
//!
//! Tests that need running servers are `#[ignore]`d so a plain
//! `cargo test` stays offline.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_URL` - default `http://localhost:3000`
//! - `ADMIN_URL` - default `http://localhost:3001`
//! - `TW_TEST_ADMIN_EMAIL` / `TW_TEST_ADMIN_PASSWORD` - an admin-role account

use reqwest::{Client, Response, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

/// Base URL for the storefront API.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL for the admin API.
#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// A client that keeps its session cookie, like a browser tab.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A storefront shopper with its own session.
pub struct Shopper {
    pub client: Client,
    pub base_url: String,
}

impl Shopper {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: session_client(),
            base_url: storefront_url(),
        }
    }

    /// Send a request to `{base}/api{path}` and decode the JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the server is unreachable.
    pub async fn call(&self, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        call(&self.client, &self.base_url, method, &format!("/api{path}"), body).await
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.call("GET", path, None).await
    }

    /// First in-stock product from the active catalog.
    ///
    /// # Panics
    ///
    /// Panics if the catalog has nothing in stock (seed it first).
    pub async fn in_stock_product(&self) -> Value {
        let (status, body) = self.get("/products?inStock=true&limit=1").await;
        assert_eq!(status, StatusCode::OK);
        body["products"][0].clone()
    }
}

impl Default for Shopper {
    fn default() -> Self {
        Self::new()
    }
}

/// A logged-in admin session.
pub struct Admin {
    pub client: Client,
    pub base_url: String,
}

impl Admin {
    /// Log in with `TW_TEST_ADMIN_EMAIL` and `TW_TEST_ADMIN_PASSWORD`.
    ///
    /// # Panics
    ///
    /// Panics if the variables are unset or the login fails.
    pub async fn login() -> Self {
        let email = std::env::var("TW_TEST_ADMIN_EMAIL").expect("TW_TEST_ADMIN_EMAIL not set");
        let password =
            std::env::var("TW_TEST_ADMIN_PASSWORD").expect("TW_TEST_ADMIN_PASSWORD not set");

        let admin = Self {
            client: session_client(),
            base_url: admin_url(),
        };
        let (status, body) = admin
            .call(
                "POST",
                "/auth/login",
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
        admin
    }

    pub async fn call(&self, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        call(&self.client, &self.base_url, method, path, body).await
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.call("GET", path, None).await
    }
}

async fn call(
    client: &Client,
    base_url: &str,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let method = reqwest::Method::from_bytes(method.as_bytes()).expect("valid HTTP method");
    let mut request = client.request(method, format!("{base_url}{path}"));
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.send().await.expect("Failed to send request");
    decode(response).await
}

async fn decode(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

/// Read a price serialized as a decimal string.
///
/// # Panics
///
/// Panics if `value` is not a decimal string.
#[must_use]
pub fn price(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("not a price: {value}"))
}

/// A short random suffix for SKUs, emails and names created by a test.
#[must_use]
pub fn unique_suffix() -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_ascii_uppercase()
}
