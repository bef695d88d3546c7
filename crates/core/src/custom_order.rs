//! Custom guitar commission requests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Handedness;
use crate::types::{CustomOrderId, CustomOrderStatus, Email, Phone, Price};
use crate::validation::ValidationErrors;

/// Smallest budget the workshop accepts for a commission.
pub const MIN_BUDGET_UNITS: u32 = 1500;

/// Body shape families the workshop builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.body_shape", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum BodyShape {
    SingleCut,
    DoubleCut,
    Offset,
    SemiHollow,
    Dreadnought,
    Concert,
}

/// Commission form submission.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomGuitarInput {
    pub customer_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub body_shape: Option<BodyShape>,
    pub top_wood: String,
    pub back_wood: String,
    pub finish: String,
    #[serde(default)]
    pub pickups: Option<String>,
    #[serde(default)]
    pub handedness: Handedness,
    pub budget: Decimal,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A commission request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCustomGuitar {
    pub customer_name: String,
    pub email: Email,
    pub phone: Option<Phone>,
    pub body_shape: BodyShape,
    pub top_wood: String,
    pub back_wood: String,
    pub finish: String,
    pub pickups: Option<String>,
    pub handedness: Handedness,
    pub budget: Price,
    pub timeline: Option<String>,
    pub notes: Option<String>,
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

impl CustomGuitarInput {
    /// Validate the submission.
    ///
    /// # Errors
    ///
    /// Returns every field-level failure found.
    pub fn validate(&self) -> Result<ValidCustomGuitar, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        errors.require_text("customerName", &self.customer_name, 200);
        let email = Email::parse(&self.email)
            .map_err(|e| errors.add("email", e.to_string()))
            .ok();
        let phone = match optional(self.phone.as_deref()) {
            None => None,
            Some(raw) => Phone::parse(&raw)
                .map_err(|e| errors.add("phone", e.to_string()))
                .ok(),
        };

        errors.add_if(self.body_shape.is_none(), "bodyShape", "is required");
        errors.require_text("topWood", &self.top_wood, 100);
        errors.require_text("backWood", &self.back_wood, 100);
        errors.require_text("finish", &self.finish, 200);
        errors.limit_text("pickups", self.pickups.as_deref(), 200);
        errors.limit_text("timeline", self.timeline.as_deref(), 200);
        errors.limit_text("notes", self.notes.as_deref(), 4000);

        let budget = match Price::new(self.budget) {
            Err(e) => {
                errors.add("budget", e.to_string());
                None
            }
            Ok(budget) if budget < Price::from_units(MIN_BUDGET_UNITS) => {
                errors.add("budget", format!("must be at least {MIN_BUDGET_UNITS}"));
                None
            }
            Ok(budget) => Some(budget),
        };

        let (Some(email), Some(body_shape), Some(budget), true) =
            (email, self.body_shape, budget, errors.is_empty())
        else {
            return Err(errors);
        };

        Ok(ValidCustomGuitar {
            customer_name: self.customer_name.trim().to_owned(),
            email,
            phone,
            body_shape,
            top_wood: self.top_wood.trim().to_owned(),
            back_wood: self.back_wood.trim().to_owned(),
            finish: self.finish.trim().to_owned(),
            pickups: optional(self.pickups.as_deref()),
            handedness: self.handedness,
            budget,
            timeline: optional(self.timeline.as_deref()),
            notes: optional(self.notes.as_deref()),
        })
    }
}

/// A commission request as stored in `shop.custom_orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CustomGuitarRequest {
    pub id: CustomOrderId,
    pub customer_name: String,
    pub email: Email,
    pub phone: Option<Phone>,
    pub body_shape: BodyShape,
    pub top_wood: String,
    pub back_wood: String,
    pub finish: String,
    pub pickups: Option<String>,
    pub left_handed: bool,
    pub budget: Price,
    pub timeline: Option<String>,
    pub notes: Option<String>,
    pub status: CustomOrderStatus,
    pub created_at: DateTime<Utc>,
}
