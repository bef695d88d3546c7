//! Catalog records: products, services and their categories.
//!
//! Products and services are owned by the back office and are read-only from
//! the storefront's perspective.

pub mod product;
pub mod service;
pub mod specifications;

use serde::{Deserialize, Serialize};

pub use product::{Product, ProductDraft, ProductInput};
pub use service::{Service, ServiceDraft, ServiceInput};
pub use specifications::{Handedness, Specifications};

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.product_category", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Guitars,
    Basses,
    Amplifiers,
    Effects,
    Accessories,
    Care,
}

impl ProductCategory {
    /// Every category, in menu order.
    pub const ALL: [Self; 6] = [
        Self::Guitars,
        Self::Basses,
        Self::Amplifiers,
        Self::Effects,
        Self::Accessories,
        Self::Care,
    ];

    /// URL/JSON slug.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Guitars => "guitars",
            Self::Basses => "basses",
            Self::Amplifiers => "amplifiers",
            Self::Effects => "effects",
            Self::Accessories => "accessories",
            Self::Care => "care",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Guitars => "Guitars",
            Self::Basses => "Basses",
            Self::Amplifiers => "Amplifiers",
            Self::Effects => "Effects & Pedals",
            Self::Accessories => "Accessories",
            Self::Care => "Care & Maintenance",
        }
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.slug() == s)
            .ok_or_else(|| format!("unknown product category: {s}"))
    }
}

/// Service desk category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.service_category", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Repair,
    Setup,
    Lesson,
    CustomBuild,
}

impl ServiceCategory {
    /// URL/JSON slug.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Repair => "repair",
            Self::Setup => "setup",
            Self::Lesson => "lesson",
            Self::CustomBuild => "custom_build",
        }
    }
}

/// Derive a URL slug from a display name: lowercase ASCII alphanumerics
/// separated by single dashes.
///
/// ```
/// use tonewood_core::catalog::slugify;
///
/// assert_eq!(slugify("  Strat-Style  '62 Reissue!"), "strat-style-62-reissue");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' || ch == '/' {
            pending_dash = true;
        }
    }

    slug
}
