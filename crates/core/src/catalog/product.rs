//! Product records and the admin input used to create or edit them.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ProductCategory, Specifications, slugify};
use crate::types::{Price, ProductId};
use crate::validation::{ValidationErrors, normalize_list};

static SKU_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9][A-Z0-9\-]{2,31}$").unwrap_or_else(|_| unreachable!("static pattern"))
});

/// A catalog product as stored in `shop.products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub brand: String,
    pub category: ProductCategory,
    pub sku: String,
    pub price: Price,
    pub compare_at_price: Option<Price>,
    pub stock: i32,
    pub is_active: bool,
    pub is_featured: bool,
    /// Average review rating, 0.0 to 5.0.
    pub rating: f32,
    pub review_count: i32,
    pub images: Vec<String>,
    /// Ingredient list for care products; empty otherwise.
    pub ingredients: Vec<String>,
    pub tags: Vec<String>,
    #[cfg_attr(feature = "postgres", sqlx(json))]
    pub specifications: Specifications,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether at least one unit can be sold.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// First image, used as the cart/wishlist thumbnail.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

fn default_true() -> bool {
    true
}

/// Create/update payload from the back office.
///
/// Monetary fields arrive as raw decimals so that a negative value becomes a
/// field error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub brand: String,
    pub category: Option<ProductCategory>,
    pub sku: String,
    pub price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub review_count: i32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub specifications: Specifications,
}

/// A validated, normalized product ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub brand: String,
    pub category: ProductCategory,
    pub sku: String,
    pub price: Price,
    pub compare_at_price: Option<Price>,
    pub stock: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub rating: f32,
    pub review_count: i32,
    pub images: Vec<String>,
    pub ingredients: Vec<String>,
    pub tags: Vec<String>,
    pub specifications: Specifications,
}

impl ProductInput {
    pub const MAX_NAME: usize = 200;
    pub const MAX_BRAND: usize = 100;
    pub const MAX_DESCRIPTION: usize = 10_000;
    pub const MAX_IMAGES: usize = 12;

    /// Validate and normalize the payload.
    ///
    /// # Errors
    ///
    /// Returns every field-level failure found.
    pub fn validate(&self) -> Result<ProductDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        errors.require_text("name", &self.name, Self::MAX_NAME);
        errors.require_text("brand", &self.brand, Self::MAX_BRAND);
        errors.limit_text("description", Some(&self.description), Self::MAX_DESCRIPTION);

        let slug = self
            .slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(|| slugify(&self.name), slugify);
        if slug.is_empty() && !self.name.trim().is_empty() {
            errors.add("slug", "must contain at least one letter or digit");
        }

        let sku = self.sku.trim().to_ascii_uppercase();
        if sku.is_empty() {
            errors.add("sku", "is required");
        } else if !SKU_PATTERN.is_match(&sku) {
            errors.add(
                "sku",
                "must be 3-32 characters of letters, digits and dashes",
            );
        }

        let price = Price::new(self.price)
            .map_err(|e| errors.add("price", e.to_string()))
            .ok();

        let compare_at_price = match self.compare_at_price.map(Price::new) {
            None => None,
            Some(Ok(was)) => Some(was),
            Some(Err(e)) => {
                errors.add("compareAtPrice", e.to_string());
                None
            }
        };
        if matches!((price, compare_at_price), (Some(price), Some(was)) if was < price) {
            errors.add("compareAtPrice", "must be at least the price");
        }

        errors.add_if(self.stock < 0, "stock", "cannot be negative");
        errors.add_if(
            !(0.0..=5.0).contains(&self.rating),
            "rating",
            "must be between 0 and 5",
        );
        errors.add_if(self.review_count < 0, "reviewCount", "cannot be negative");

        let images = normalize_list(&self.images);
        if images.len() > Self::MAX_IMAGES {
            errors.add(
                "images",
                format!("at most {} images are allowed", Self::MAX_IMAGES),
            );
        }

        let ingredients = normalize_list(&self.ingredients);
        let tags: Vec<String> = normalize_list(&self.tags)
            .into_iter()
            .map(|t| t.to_lowercase())
            .collect();

        match self.category {
            None => errors.add("category", "is required"),
            Some(category) => {
                if !self.specifications.fits(category) {
                    errors.add(
                        "specifications",
                        format!(
                            "{} specifications do not apply to {}",
                            self.specifications.kind(),
                            category.slug()
                        ),
                    );
                }
                if !ingredients.is_empty() && category != ProductCategory::Care {
                    errors.add("ingredients", "only care products list ingredients");
                }
            }
        }

        let (Some(category), Some(price), true) = (self.category, price, errors.is_empty()) else {
            return Err(errors);
        };

        Ok(ProductDraft {
            name: self.name.trim().to_owned(),
            slug,
            description: self.description.trim().to_owned(),
            brand: self.brand.trim().to_owned(),
            category,
            sku,
            price,
            compare_at_price,
            stock: self.stock,
            is_active: self.is_active,
            is_featured: self.is_featured,
            rating: self.rating,
            review_count: self.review_count,
            images,
            ingredients,
            tags,
            specifications: self.specifications.clone(),
        })
    }
}
