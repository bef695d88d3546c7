//! Integration tests for the storefront catalog.
//!
//! These tests require:
//! - A migrated database seeded with `seed/catalog.yaml`
//! - The storefront server running (cargo run -p tonewood-storefront)

use reqwest::StatusCode;
use serde_json::Value;
use tonewood_integration_tests::{Shopper, price, storefront_url};

fn ids(body: &Value, key: &str) -> Vec<i64> {
    body[key]
        .as_array()
        .expect("list in response")
        .iter()
        .filter_map(|p| p["id"].as_i64())
        .collect()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health_endpoints() {
    let client = reqwest::Client::new();
    let base_url = storefront_url();

    let resp = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_pages_concatenate_to_full_listing() {
    let shopper = Shopper::new();

    let (status, all) = shopper.get("/products?sort=name&limit=100").await;
    assert_eq!(status, StatusCode::OK);
    let expected = ids(&all, "products");
    let total = all["pagination"]["total"].as_u64().expect("total");
    assert_eq!(expected.len() as u64, total);

    let mut paged = Vec::new();
    let mut page = 1;
    loop {
        let (status, body) = shopper
            .get(&format!("/products?sort=name&limit=3&page={page}"))
            .await;
        assert_eq!(status, StatusCode::OK);
        paged.extend(ids(&body, "products"));
        if page >= body["pagination"]["pages"].as_u64().unwrap_or(0) {
            break;
        }
        page += 1;
    }

    assert_eq!(paged, expected);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_category_filter_and_price_sort() {
    let shopper = Shopper::new();

    let (status, body) = shopper
        .get("/products?category=effects&sort=price-asc")
        .await;
    assert_eq!(status, StatusCode::OK);

    let products = body["products"].as_array().expect("products");
    assert!(!products.is_empty());
    assert!(products.iter().all(|p| p["category"] == "effects"));

    let prices: Vec<_> = products.iter().map(|p| price(&p["price"])).collect();
    assert!(prices.windows(2).all(|w| w[0] <= w[1]));

    // "All" means no category filter
    let (_, all) = shopper.get("/products?category=All&limit=100").await;
    let (_, unfiltered) = shopper.get("/products?limit=100").await;
    assert_eq!(ids(&all, "products"), ids(&unfiltered, "products"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_inactive_products_are_hidden() {
    let shopper = Shopper::new();
    let (status, body) = shopper.get("/products?search=Guitar%20Polish").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["products"].as_array().expect("products").is_empty());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_invalid_listing_params() {
    let shopper = Shopper::new();
    let (status, body) = shopper.get("/products?minPrice=500&maxPrice=100").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["minPrice"].is_array());
}

// ============================================================================
// Detail
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_product_detail_and_related() {
    let shopper = Shopper::new();
    let product = shopper.in_stock_product().await;
    let id = product["id"].as_i64().expect("id");

    let (status, detail) = shopper.get(&format!("/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["sku"], product["sku"]);

    let (status, related) = shopper.get(&format!("/products/{id}/related")).await;
    assert_eq!(status, StatusCode::OK);
    let related = related["products"].as_array().expect("products");
    assert!(related.len() <= 4);
    assert!(related.iter().all(|p| p["id"] != id && p["category"] == product["category"]));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_product_is_404() {
    let shopper = Shopper::new();
    let (status, body) = shopper.get("/products/999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_categories_count_active_products() {
    let shopper = Shopper::new();
    let (status, body) = shopper.get("/categories").await;
    assert_eq!(status, StatusCode::OK);

    let categories = body["categories"].as_array().expect("categories");
    let care = categories
        .iter()
        .find(|c| c["slug"] == "care")
        .expect("care category");

    let (_, listing) = shopper.get("/products?category=care&limit=100").await;
    assert_eq!(care["count"], listing["pagination"]["total"]);
}
