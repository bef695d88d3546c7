//! Wishlist and saved-for-later collections.
//!
//! Both are the same collection type, distinguished by a marker so a
//! wishlist can't be handed to code expecting saved-for-later items. Entries
//! are unique by product id and adding is idempotent.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartChange, CartItem};
use crate::catalog::{Product, ProductCategory};
use crate::types::{Price, ProductId};

/// A saved product with cached display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
    pub id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub brand: String,
    pub category: ProductCategory,
    pub price: Price,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl SavedItem {
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            image: product.primary_image().map(str::to_owned),
            brand: product.brand.clone(),
            category: product.category,
            price: product.price,
            saved_at: None,
        }
    }

    /// A single-unit cart line for this item.
    #[must_use]
    pub fn to_cart_item(&self) -> CartItem {
        CartItem {
            id: self.id,
            name: self.name.clone(),
            image: self.image.clone(),
            brand: self.brand.clone(),
            category: self.category,
            price: self.price,
            quantity: 1,
        }
    }
}

impl From<CartItem> for SavedItem {
    fn from(line: CartItem) -> Self {
        Self {
            id: line.id,
            name: line.name,
            image: line.image,
            brand: line.brand,
            category: line.category,
            price: line.price,
            saved_at: None,
        }
    }
}

/// Marker for the wishlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WishlistKind;

/// Marker for items moved out of the cart to buy later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SavedForLaterKind;

/// An ordered set of saved products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct SavedCollection<K> {
    items: Vec<SavedItem>,
    #[serde(skip)]
    kind: PhantomData<K>,
}

pub type Wishlist = SavedCollection<WishlistKind>;
pub type SavedForLater = SavedCollection<SavedForLaterKind>;

impl<K> Default for SavedCollection<K> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            kind: PhantomData,
        }
    }
}

impl<K> SavedCollection<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `item` unless an entry with the same id exists. Returns whether
    /// the collection changed.
    pub fn add(&mut self, item: SavedItem) -> bool {
        self.add_at(item, Utc::now())
    }

    /// Like [`add`](Self::add), stamping `saved_at` with `now` when absent.
    pub fn add_at(&mut self, mut item: SavedItem, now: DateTime<Utc>) -> bool {
        if self.contains(item.id) {
            return false;
        }
        item.saved_at.get_or_insert(now);
        self.items.push(item);
        true
    }

    /// Remove and return the entry for `id`.
    pub fn remove(&mut self, id: ProductId) -> Option<SavedItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&SavedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn items(&self) -> &[SavedItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of saved prices.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(|item| item.price).sum()
    }

    /// Remove every entry, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        count
    }
}

impl Wishlist {
    /// Add `item` if absent, remove it if present. Returns whether the
    /// product is on the wishlist afterwards.
    pub fn toggle(&mut self, item: SavedItem) -> bool {
        if self.remove(item.id).is_some() {
            false
        } else {
            self.add(item)
        }
    }
}

/// Move a cart line into saved-for-later. Returns `false` if the cart has no
/// line for `id`.
pub fn save_for_later(cart: &mut Cart, saved: &mut SavedForLater, id: ProductId) -> bool {
    let Some(line) = cart.take(id) else {
        return false;
    };
    // Already saved: the cart line is still dropped
    saved.add(SavedItem::from(line));
    true
}

/// Move a saved-for-later item back into the cart with quantity 1.
pub fn move_to_cart(saved: &mut SavedForLater, cart: &mut Cart, id: ProductId) -> CartChange {
    saved
        .remove(id)
        .map_or(CartChange::Unchanged, |item| cart.add(item.to_cart_item()))
}

/// Add a wishlist item to the cart with quantity 1. The wishlist entry is
/// kept.
pub fn wishlist_to_cart(wishlist: &Wishlist, cart: &mut Cart, id: ProductId) -> CartChange {
    wishlist
        .get(id)
        .map_or(CartChange::Unchanged, |item| cart.add(item.to_cart_item()))
}
