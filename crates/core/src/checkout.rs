//! Checkout: request validation, line pricing and order totals.
//!
//! Clients send product ids and quantities only. Names and prices are
//! re-read from the catalog when the order lines are built, and stock is
//! checked against the same rows.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, MAX_LINE_QUANTITY};
use crate::types::{Email, OrderId, OrderStatus, Phone, Price, ProductId};
use crate::validation::ValidationErrors;

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    /// Collected in store; never charged shipping.
    CashOnPickup,
}

/// Postal address for delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    fn validate_into(&self, errors: &mut ValidationErrors) -> Self {
        errors.require_text("shippingAddress.line1", &self.line1, 200);
        errors.limit_text("shippingAddress.line2", self.line2.as_deref(), 200);
        errors.require_text("shippingAddress.city", &self.city, 100);
        errors.require_text("shippingAddress.region", &self.region, 100);
        errors.require_text("shippingAddress.postalCode", &self.postal_code, 20);

        let country = self.country.trim().to_ascii_uppercase();
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            errors.add("shippingAddress.country", "must be a two-letter country code");
        }

        Self {
            line1: self.line1.trim().to_owned(),
            line2: self
                .line2
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_owned),
            city: self.city.trim().to_owned(),
            region: self.region.trim().to_owned(),
            postal_code: self.postal_code.trim().to_owned(),
            country,
        }
    }
}

/// A requested line: which product and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Order submission from the storefront.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub items: Vec<LineRequest>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A checkout request that passed validation. Lines are merged by product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCheckout {
    pub customer_name: String,
    pub email: Email,
    pub phone: Option<Phone>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub lines: Vec<(ProductId, u32)>,
    pub notes: Option<String>,
}

impl CheckoutRequest {
    pub const MAX_NOTES: usize = 2000;
    pub const MAX_LINES: usize = 50;

    /// Replace the requested lines with the contents of a session cart.
    #[must_use]
    pub fn with_cart(mut self, cart: &Cart) -> Self {
        self.items = cart
            .items()
            .iter()
            .map(|line| LineRequest {
                product_id: line.id,
                quantity: i64::from(line.quantity),
            })
            .collect();
        self
    }

    /// Validate contact, address, payment and lines.
    ///
    /// # Errors
    ///
    /// Returns every field-level failure found.
    pub fn validate(&self) -> Result<ValidCheckout, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        errors.require_text("customerName", &self.customer_name, 200);

        let email = Email::parse(&self.email)
            .map_err(|e| errors.add("email", e.to_string()))
            .ok();

        let phone = match self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            None => None,
            Some(raw) => Phone::parse(raw)
                .map_err(|e| errors.add("phone", e.to_string()))
                .ok(),
        };

        let shipping_address = self.shipping_address.validate_into(&mut errors);

        if self.payment_method.is_none() {
            errors.add("paymentMethod", "is required");
        }

        errors.limit_text("notes", self.notes.as_deref(), Self::MAX_NOTES);

        let mut lines: Vec<(ProductId, u32)> = Vec::new();
        if self.items.is_empty() {
            errors.add("items", "must contain at least one item");
        } else if self.items.len() > Self::MAX_LINES {
            errors.add("items", format!("at most {} lines per order", Self::MAX_LINES));
        }
        for (index, line) in self.items.iter().enumerate() {
            let quantity = u32::try_from(line.quantity)
                .ok()
                .filter(|q| (1..=MAX_LINE_QUANTITY).contains(q));
            let Some(quantity) = quantity else {
                errors.add(
                    format!("items[{index}].quantity"),
                    format!("must be between 1 and {MAX_LINE_QUANTITY}"),
                );
                continue;
            };
            match lines.iter_mut().find(|(id, _)| *id == line.product_id) {
                Some((_, existing)) => *existing = (*existing + quantity).min(MAX_LINE_QUANTITY),
                None => lines.push((line.product_id, quantity)),
            }
        }

        let (Some(email), Some(payment_method), true) =
            (email, self.payment_method, errors.is_empty())
        else {
            return Err(errors);
        };

        Ok(ValidCheckout {
            customer_name: self.customer_name.trim().to_owned(),
            email,
            phone,
            shipping_address,
            payment_method,
            lines,
            notes: self
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_owned),
        })
    }
}

/// Current catalog state for a product on the order, read under lock.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct StockedProduct {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub price: Price,
    pub stock: i32,
    pub is_active: bool,
}

/// A priced order line, stored with the order as a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub line_total: Price,
}

/// Price the requested lines against the catalog and check stock.
///
/// # Errors
///
/// Returns a field error per line whose product is missing, inactive or
/// short of stock.
pub fn build_lines(
    lines: &[(ProductId, u32)],
    catalog: &HashMap<ProductId, StockedProduct>,
) -> Result<Vec<OrderLine>, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut priced = Vec::with_capacity(lines.len());

    for (index, &(id, quantity)) in lines.iter().enumerate() {
        let field = format!("items[{index}]");
        let Some(product) = catalog.get(&id).filter(|p| p.is_active) else {
            errors.add(field, format!("product {id} is not available"));
            continue;
        };
        if i64::from(product.stock) < i64::from(quantity) {
            errors.add(
                format!("{field}.quantity"),
                format!("only {} of {} in stock", product.stock.max(0), product.name),
            );
            continue;
        }
        priced.push(OrderLine {
            product_id: id,
            name: product.name.clone(),
            sku: product.sku.clone(),
            unit_price: product.price,
            quantity,
            line_total: product.price.times(quantity),
        });
    }

    errors.into_result(priced)
}

/// Shipping and tax configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingRules {
    pub flat_shipping: Price,
    /// Subtotals at or above this ship free.
    pub free_shipping_threshold: Price,
    /// Fraction of the subtotal, e.g. `0.08`.
    pub tax_rate: Decimal,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            flat_shipping: Price::from_units(15),
            free_shipping_threshold: Price::from_units(200),
            tax_rate: Decimal::new(8, 2),
        }
    }
}

/// Order money breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Price,
    pub shipping: Price,
    pub tax: Price,
    pub total: Price,
}

impl PricingRules {
    /// Shipping fee for a subtotal and payment method.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Price, method: PaymentMethod) -> Price {
        if method == PaymentMethod::CashOnPickup || subtotal >= self.free_shipping_threshold {
            Price::ZERO
        } else {
            self.flat_shipping
        }
    }

    /// Compute totals for priced lines.
    #[must_use]
    pub fn totals(&self, lines: &[OrderLine], method: PaymentMethod) -> OrderTotals {
        let subtotal: Price = lines.iter().map(|line| line.line_total).sum();
        let shipping = self.shipping_for(subtotal, method);
        let tax = subtotal.scaled_by(self.tax_rate);
        OrderTotals {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }

    /// Like [`PricingRules::totals`], but rejects orders whose total cannot
    /// be stored. Line totals and tax never exceed the total.
    ///
    /// # Errors
    ///
    /// Returns an `items` error when the total is above [`Price::MAX`].
    pub fn checked_totals(
        &self,
        lines: &[OrderLine],
        method: PaymentMethod,
    ) -> Result<OrderTotals, ValidationErrors> {
        let totals = self.totals(lines, method);
        let mut errors = ValidationErrors::new();
        if !totals.total.fits_column() {
            errors.add("items", format!("order total must be at most {}", Price::MAX));
        }
        errors.into_result(totals)
    }
}

/// Human-facing order number such as `TW-250301-7K2Q9A`.
///
/// `entropy` supplies the random suffix; callers pass a random `u32`.
#[must_use]
pub fn order_number(now: DateTime<Utc>, entropy: u32) -> String {
    const ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
    let mut suffix = String::with_capacity(6);
    let mut value = entropy;
    for _ in 0..6 {
        let index = (value % 32) as usize;
        suffix.push(char::from(*ALPHABET.get(index).unwrap_or(&b'0')));
        value /= 32;
    }
    format!("TW-{}-{suffix}", now.format("%y%m%d"))
}

/// A placed order as stored in `shop.orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub customer_name: String,
    pub email: Email,
    pub phone: Option<Phone>,
    #[cfg_attr(feature = "postgres", sqlx(json))]
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[cfg_attr(feature = "postgres", sqlx(json))]
    pub items: Vec<OrderLine>,
    pub subtotal: Price,
    pub shipping: Price,
    pub tax: Price,
    pub total: Price,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            customer_name: "Sam Rivers".to_owned(),
            email: "Sam@Example.com".to_owned(),
            phone: Some("+1 555 010 2030".to_owned()),
            shipping_address: ShippingAddress {
                line1: "12 Fret St".to_owned(),
                line2: Some(" ".to_owned()),
                city: "Nashville".to_owned(),
                region: "TN".to_owned(),
                postal_code: "37203".to_owned(),
                country: "us".to_owned(),
            },
            payment_method: Some(PaymentMethod::Card),
            items: vec![
                LineRequest {
                    product_id: ProductId::new(1),
                    quantity: 1,
                },
                LineRequest {
                    product_id: ProductId::new(1),
                    quantity: 2,
                },
            ],
            notes: None,
        }
    }

    fn stocked(id: i32, cents: u64, stock: i32) -> StockedProduct {
        StockedProduct {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            sku: format!("SKU-{id}"),
            price: Price::from_cents(cents),
            stock,
            is_active: true,
        }
    }

    #[test]
    fn test_validate_merges_lines_and_normalizes() {
        let valid = request().validate().unwrap();
        assert_eq!(valid.lines, [(ProductId::new(1), 3)]);
        assert_eq!(valid.email.as_str(), "sam@example.com");
        assert_eq!(valid.shipping_address.country, "US");
        assert_eq!(valid.shipping_address.line2, None);
    }

    #[test]
    fn test_validate_reports_fields() {
        let bad = CheckoutRequest {
            email: "nope".to_owned(),
            payment_method: None,
            items: vec![LineRequest {
                product_id: ProductId::new(2),
                quantity: 0,
            }],
            shipping_address: ShippingAddress::default(),
            ..request()
        };
        let errors = bad.validate().unwrap_err();
        for field in [
            "email",
            "paymentMethod",
            "items[0].quantity",
            "shippingAddress.city",
            "shippingAddress.country",
        ] {
            assert!(errors.has(field), "expected error on {field}");
        }

        let empty = CheckoutRequest {
            items: Vec::new(),
            ..request()
        };
        assert!(empty.validate().unwrap_err().has("items"));
    }

    #[test]
    fn test_build_lines_checks_stock_and_activity() {
        let mut catalog = HashMap::new();
        catalog.insert(ProductId::new(1), stocked(1, 1000, 2));
        catalog.insert(ProductId::new(2), StockedProduct {
            is_active: false,
            ..stocked(2, 500, 10)
        });

        let errors = build_lines(
            &[(ProductId::new(1), 3), (ProductId::new(2), 1), (ProductId::new(3), 1)],
            &catalog,
        )
        .unwrap_err();
        assert!(errors.has("items[0].quantity"));
        assert!(errors.has("items[1]"));
        assert!(errors.has("items[2]"));

        let lines = build_lines(&[(ProductId::new(1), 2)], &catalog).unwrap();
        assert_eq!(lines.first().unwrap().line_total, Price::from_units(20));
    }

    #[test]
    fn test_totals_with_shipping_and_tax() {
        let rules = PricingRules::default();
        let mut catalog = HashMap::new();
        catalog.insert(ProductId::new(1), stocked(1, 4999, 10));
        let lines = build_lines(&[(ProductId::new(1), 2)], &catalog).unwrap();

        let totals = rules.totals(&lines, PaymentMethod::Card);
        assert_eq!(totals.subtotal, Price::from_cents(9998));
        assert_eq!(totals.shipping, Price::from_units(15));
        // 99.98 * 0.08 = 7.9984
        assert_eq!(totals.tax, Price::from_cents(800));
        assert_eq!(totals.total, Price::from_cents(9998 + 1500 + 800));

        let pickup = rules.totals(&lines, PaymentMethod::CashOnPickup);
        assert_eq!(pickup.shipping, Price::ZERO);
    }

    #[test]
    fn test_checked_totals_rejects_unstorable_orders() {
        let rules = PricingRules::default();
        let mut catalog = HashMap::new();
        catalog.insert(ProductId::new(1), StockedProduct {
            price: Price::MAX,
            ..stocked(1, 0, 1000)
        });
        let lines = build_lines(&[(ProductId::new(1), 99)], &catalog).unwrap();

        let errors = rules.checked_totals(&lines, PaymentMethod::Card).unwrap_err();
        assert_eq!(errors.field("items"), ["order total must be at most 99999999.99"]);

        catalog.insert(ProductId::new(2), stocked(2, 4999, 10));
        let small = build_lines(&[(ProductId::new(2), 2)], &catalog).unwrap();
        assert_eq!(
            rules.checked_totals(&small, PaymentMethod::Card).unwrap(),
            rules.totals(&small, PaymentMethod::Card)
        );
    }

    #[test]
    fn test_free_shipping_threshold_is_inclusive() {
        let rules = PricingRules::default();
        assert_eq!(
            rules.shipping_for(Price::from_units(200), PaymentMethod::Card),
            Price::ZERO
        );
        assert_eq!(
            rules.shipping_for(Price::from_cents(19_999), PaymentMethod::BankTransfer),
            Price::from_units(15)
        );
    }

    #[test]
    fn test_order_number_format() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let number = order_number(now, 0);
        assert_eq!(number, "TW-250301-000000");
        let other = order_number(now, 123_456_789);
        assert_eq!(other.len(), number.len());
        assert_ne!(other, number);
    }
}
