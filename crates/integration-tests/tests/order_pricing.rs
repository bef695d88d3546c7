//! Offline checks of the order pipeline the storefront runs on checkout:
//! request validation, pricing against current stock, then totals.
//!
//! These need no servers and run with a plain `cargo test`.

use std::collections::HashMap;

use serde_json::json;
use tonewood_core::checkout::{
    CheckoutRequest, PaymentMethod, PricingRules, StockedProduct, build_lines,
};
use tonewood_core::{Price, ProductId};

const PEDAL: ProductId = ProductId::new(7);
const STRINGS: ProductId = ProductId::new(10);
const POLISH: ProductId = ProductId::new(12);

fn stocked(id: ProductId, name: &str, cents: u64, stock: i32, is_active: bool) -> StockedProduct {
    StockedProduct {
        id,
        name: name.to_string(),
        sku: format!("SKU-{id}"),
        price: Price::from_cents(cents),
        stock,
        is_active,
    }
}

fn shop() -> HashMap<ProductId, StockedProduct> {
    [
        stocked(PEDAL, "Tube Screamer TS9", 12_900, 12, true),
        stocked(STRINGS, "Nickel Wound Strings 10-46", 799, 3, true),
        stocked(POLISH, "Guitar Polish", 1499, 18, false),
    ]
    .into_iter()
    .map(|p| (p.id, p))
    .collect()
}

fn request(items: serde_json::Value, payment: &str) -> CheckoutRequest {
    serde_json::from_value(json!({
        "customerName": "Sam Rivera",
        "email": "sam@example.com",
        "shippingAddress": {
            "line1": "12 Fret St",
            "city": "Nashville",
            "region": "TN",
            "postalCode": "37203",
            "country": "us",
        },
        "paymentMethod": payment,
        "items": items,
    }))
    .expect("checkout request")
}

#[test]
fn test_small_card_order_pays_shipping_and_tax() {
    let checkout = request(
        json!([
            { "productId": 7, "quantity": 1 },
            { "productId": 10, "quantity": 1 },
            { "productId": 10, "quantity": 1 },
        ]),
        "card",
    )
    .validate()
    .expect("valid request");

    // Repeated products collapse into one line
    assert_eq!(checkout.lines, vec![(PEDAL, 1), (STRINGS, 2)]);
    assert_eq!(checkout.shipping_address.country, "US");

    let lines = build_lines(&checkout.lines, &shop()).expect("in stock");
    let totals = PricingRules::default().totals(&lines, checkout.payment_method);

    assert_eq!(totals.subtotal, Price::from_cents(14_498));
    assert_eq!(totals.shipping, Price::from_units(15));
    // 8% of 144.98 rounds to 11.60
    assert_eq!(totals.tax, Price::from_cents(1160));
    assert_eq!(totals.total, Price::from_cents(17_158));
}

#[test]
fn test_pickup_and_large_orders_ship_free() {
    let rules = PricingRules::default();
    let pickup = build_lines(&[(STRINGS, 1)], &shop()).expect("in stock");
    assert!(rules.totals(&pickup, PaymentMethod::CashOnPickup).shipping.is_zero());

    let large = build_lines(&[(PEDAL, 2)], &shop()).expect("in stock");
    let totals = rules.totals(&large, PaymentMethod::BankTransfer);
    assert!(totals.shipping.is_zero());
    assert_eq!(totals.subtotal, Price::from_units(258));
}

#[test]
fn test_stock_and_availability_are_checked_per_line() {
    let errors = build_lines(&[(STRINGS, 4), (POLISH, 1), (ProductId::new(999), 1)], &shop())
        .expect_err("nothing here can be sold");

    assert_eq!(
        errors.field("items[0].quantity"),
        ["only 3 of Nickel Wound Strings 10-46 in stock"]
    );
    assert!(errors.has("items[1]"), "inactive products are not for sale");
    assert!(errors.has("items[2]"));
}

#[test]
fn test_invalid_request_reports_every_field() {
    let mut bad = request(json!([{ "productId": 7, "quantity": 0 }]), "card");
    bad.email = "not-an-email".to_string();
    bad.shipping_address.country = "USA".to_string();
    bad.payment_method = None;

    let errors = bad.validate().expect_err("invalid");
    for field in [
        "email",
        "shippingAddress.country",
        "paymentMethod",
        "items[0].quantity",
    ] {
        assert!(errors.has(field), "missing error on {field}");
    }
}
