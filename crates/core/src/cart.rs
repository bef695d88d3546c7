//! Shopping cart state.
//!
//! A [`Cart`] is an ordered collection of line items, unique by product id.
//! Every mutation is synchronous, never fails, and reports what it did as a
//! [`CartChange`] so callers can log or respond without diffing.
//!
//! Quantity policy: a line always holds between 1 and [`MAX_LINE_QUANTITY`]
//! units. Setting a quantity of zero or less removes the line, and so does
//! decrementing a line that holds a single unit.

use serde::{Deserialize, Serialize};

use crate::catalog::{Product, ProductCategory};
use crate::types::{Price, ProductId};

/// Upper bound on the quantity of a single line.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// A cart line: a product reference, cached display fields and a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub brand: String,
    pub category: ProductCategory,
    pub price: Price,
    pub quantity: u32,
}

impl CartItem {
    /// Build a line for `product` with the given quantity.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            image: product.primary_image().map(str::to_owned),
            brand: product.brand.clone(),
            category: product.category,
            price: product.price,
            quantity: clamp_quantity(quantity),
        }
    }

    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// What a cart mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum CartChange {
    Added { id: ProductId, quantity: u32 },
    QuantityChanged { id: ProductId, from: u32, to: u32 },
    Removed { id: ProductId },
    Cleared { lines: usize },
    Unchanged,
}

fn clamp_quantity(quantity: u32) -> u32 {
    quantity.clamp(1, MAX_LINE_QUANTITY)
}

/// The session's shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line, or grow the existing line for the same product.
    ///
    /// When the product is already present its cached display fields and
    /// price are refreshed from `item`.
    pub fn add(&mut self, item: CartItem) -> CartChange {
        let added = clamp_quantity(item.quantity);

        if let Some(line) = self.items.iter_mut().find(|line| line.id == item.id) {
            let from = line.quantity;
            let to = clamp_quantity(from.saturating_add(added));
            *line = CartItem {
                quantity: to,
                ..item
            };
            return if from == to {
                CartChange::Unchanged
            } else {
                CartChange::QuantityChanged {
                    id: line.id,
                    from,
                    to,
                }
            };
        }

        let id = item.id;
        self.items.push(CartItem {
            quantity: added,
            ..item
        });
        CartChange::Added {
            id,
            quantity: added,
        }
    }

    /// Remove the line for `id`, if any.
    pub fn remove(&mut self, id: ProductId) -> CartChange {
        let before = self.items.len();
        self.items.retain(|line| line.id != id);
        if self.items.len() == before {
            CartChange::Unchanged
        } else {
            CartChange::Removed { id }
        }
    }

    /// Set the quantity of the line for `id`.
    ///
    /// Zero or negative removes the line; larger values are clamped to
    /// [`MAX_LINE_QUANTITY`]. Unknown ids are ignored.
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) -> CartChange {
        if quantity <= 0 {
            return self.remove(id);
        }

        let Some(line) = self.items.iter_mut().find(|line| line.id == id) else {
            return CartChange::Unchanged;
        };

        let from = line.quantity;
        let to = u32::try_from(quantity).map_or(MAX_LINE_QUANTITY, clamp_quantity);
        line.quantity = to;

        if from == to {
            CartChange::Unchanged
        } else {
            CartChange::QuantityChanged { id, from, to }
        }
    }

    /// Add one unit to the line for `id`.
    pub fn increment(&mut self, id: ProductId) -> CartChange {
        match self.get(id) {
            Some(line) => self.update_quantity(id, i64::from(line.quantity) + 1),
            None => CartChange::Unchanged,
        }
    }

    /// Take one unit from the line for `id`; the last unit removes the line.
    pub fn decrement(&mut self, id: ProductId) -> CartChange {
        match self.get(id) {
            Some(line) => self.update_quantity(id, i64::from(line.quantity) - 1),
            None => CartChange::Unchanged,
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) -> CartChange {
        let lines = self.items.len();
        self.items.clear();
        if lines == 0 {
            CartChange::Unchanged
        } else {
            CartChange::Cleared { lines }
        }
    }

    /// Remove and return the line for `id`.
    pub fn take(&mut self, id: ProductId) -> Option<CartItem> {
        let index = self.items.iter().position(|line| line.id == id)?;
        Some(self.items.remove(index))
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|line| line.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn unique_items(&self) -> usize {
        self.items.len()
    }

    /// Σ(price × quantity).
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Immutable view with derived aggregates.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            total_items: self.total_items(),
            unique_items: self.unique_items(),
            total_price: self.total_price(),
        }
    }
}

/// A point-in-time view of a cart, as returned by the cart endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub total_items: u32,
    pub unique_items: usize,
    pub total_price: Price,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i32, cents: u64, quantity: u32) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            image: None,
            brand: "Tonewood".to_owned(),
            category: ProductCategory::Accessories,
            price: Price::from_cents(cents),
            quantity,
        }
    }

    fn expected_total(cart: &Cart) -> Price {
        cart.items()
            .iter()
            .map(|line| line.price.times(line.quantity))
            .sum()
    }

    #[test]
    fn test_aggregates_example() {
        let mut cart = Cart::new();
        cart.add(item(1, 100_000, 2));
        cart.add(item(2, 50_000, 1));
        assert_eq!(cart.total_price(), Price::from_units(2500));
        assert_eq!(cart.unique_items(), 2);
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn test_add_same_id_merges() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add(item(7, 999, 1)),
            CartChange::Added {
                id: ProductId::new(7),
                quantity: 1
            }
        );
        cart.add(item(7, 999, 1));
        assert_eq!(cart.unique_items(), 1);
        assert_eq!(cart.get(ProductId::new(7)).unwrap().quantity, 2);
    }

    #[test]
    fn test_add_clamps_quantity() {
        let mut cart = Cart::new();
        cart.add(item(1, 100, 0));
        assert_eq!(cart.total_items(), 1);
        cart.add(item(1, 100, 500));
        assert_eq!(cart.total_items(), MAX_LINE_QUANTITY);
        assert_eq!(cart.add(item(1, 100, 1)), CartChange::Unchanged);
    }

    #[test]
    fn test_update_quantity_zero_removes_every_item() {
        let mut cart = Cart::new();
        for id in 1..=5 {
            cart.add(item(id, 1000, u32::try_from(id).unwrap()));
        }
        for id in 1..=5 {
            let change = cart.update_quantity(ProductId::new(id), 0);
            assert_eq!(change, CartChange::Removed { id: ProductId::new(id) });
        }
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_negative_and_unknown() {
        let mut cart = Cart::new();
        cart.add(item(1, 1000, 3));
        assert_eq!(cart.update_quantity(ProductId::new(9), 4), CartChange::Unchanged);
        assert_eq!(cart.update_quantity(ProductId::new(1), -2), CartChange::Removed {
            id: ProductId::new(1)
        });
        assert_eq!(cart.remove(ProductId::new(1)), CartChange::Unchanged);
    }

    #[test]
    fn test_update_quantity_clamps_high() {
        let mut cart = Cart::new();
        cart.add(item(1, 1000, 1));
        cart.update_quantity(ProductId::new(1), i64::from(u32::MAX) + 10);
        assert_eq!(cart.total_items(), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_decrement_last_unit_removes() {
        let mut cart = Cart::new();
        cart.add(item(1, 1000, 2));
        cart.decrement(ProductId::new(1));
        assert_eq!(cart.total_items(), 1);
        cart.decrement(ProductId::new(1));
        assert!(cart.is_empty());
        assert_eq!(cart.increment(ProductId::new(1)), CartChange::Unchanged);
    }

    #[test]
    fn test_total_matches_lines_after_mixed_operations() {
        let mut cart = Cart::new();
        let ops: [(i32, i64); 12] = [
            (1, 2),
            (2, 1),
            (3, 4),
            (1, 0),
            (2, 7),
            (4, 1),
            (3, -1),
            (5, 3),
            (2, 1),
            (4, 120),
            (6, 1),
            (5, 0),
        ];
        for (step, (id, qty)) in ops.into_iter().enumerate() {
            if step % 3 == 0 {
                cart.add(item(id, 1999 + u64::try_from(id).unwrap(), 1));
            }
            cart.update_quantity(ProductId::new(id), qty);
            if step % 4 == 0 {
                cart.remove(ProductId::new(id + 1));
            }
            assert_eq!(cart.total_price(), expected_total(&cart));
            assert!(cart.items().iter().all(|line| line.quantity >= 1));
        }
    }

    #[test]
    fn test_snapshot_and_clear() {
        let mut cart = Cart::new();
        cart.add(item(1, 250, 4));
        let snapshot = cart.snapshot();
        assert_eq!(snapshot.total_price, Price::from_units(10));
        assert_eq!(cart.clear(), CartChange::Cleared { lines: 1 });
        assert_eq!(cart.clear(), CartChange::Unchanged);
        assert_eq!(snapshot.items.len(), 1);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["totalItems"], 4);
        assert_eq!(json["items"][0]["quantity"], 4);
    }
}
