//! Service desk offerings (repairs, setups, lessons, custom builds).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ServiceCategory, slugify};
use crate::types::{Price, ServiceId};
use crate::validation::{ValidationErrors, normalize_list};

/// A bookable service as stored in `shop.services`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category: ServiceCategory,
    /// Starting price; the final quote may differ after inspection.
    pub price: Price,
    pub duration_minutes: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub image: Option<String>,
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

/// Create/update payload from the back office.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub category: Option<ServiceCategory>,
    pub price: Decimal,
    pub duration_minutes: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

/// A validated service ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDraft {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category: ServiceCategory,
    pub price: Price,
    pub duration_minutes: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub image: Option<String>,
    pub features: Vec<String>,
}

impl ServiceInput {
    pub const MIN_DURATION: i32 = 15;
    /// One working day.
    pub const MAX_DURATION: i32 = 480;

    /// Validate and normalize the payload.
    ///
    /// # Errors
    ///
    /// Returns every field-level failure found.
    pub fn validate(&self) -> Result<ServiceDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        errors.require_text("name", &self.name, 200);
        errors.limit_text("description", Some(&self.description), 10_000);

        let slug = self
            .slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(|| slugify(&self.name), slugify);

        let price = Price::new(self.price)
            .map_err(|e| errors.add("price", e.to_string()))
            .ok();

        if !(Self::MIN_DURATION..=Self::MAX_DURATION).contains(&self.duration_minutes)
            || self.duration_minutes % 15 != 0
        {
            errors.add(
                "durationMinutes",
                format!(
                    "must be a multiple of 15 between {} and {}",
                    Self::MIN_DURATION,
                    Self::MAX_DURATION
                ),
            );
        }

        errors.add_if(self.category.is_none(), "category", "is required");

        let (Some(category), Some(price), true) = (self.category, price, errors.is_empty()) else {
            return Err(errors);
        };

        Ok(ServiceDraft {
            name: self.name.trim().to_owned(),
            slug,
            description: self.description.trim().to_owned(),
            category,
            price,
            duration_minutes: self.duration_minutes,
            is_active: self.is_active,
            is_featured: self.is_featured,
            image: self
                .image
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            features: normalize_list(&self.features),
        })
    }
}
