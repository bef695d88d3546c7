//! Per-category product specifications.
//!
//! Each product category has a fixed specification schema. The variant is
//! stored as JSONB with a `kind` tag so the storefront can render a spec
//! table without guessing at keys.

use serde::{Deserialize, Serialize};

use super::ProductCategory;

/// Which hand the instrument is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    #[default]
    Right,
    Left,
}

/// Category-specific specification bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Specifications {
    /// No specification table (allowed for every category).
    #[default]
    Unspecified,
    /// Electric/acoustic guitars and basses.
    #[serde(rename_all = "camelCase")]
    Instrument {
        body_wood: String,
        neck_wood: String,
        fretboard: String,
        pickups: Option<String>,
        /// Scale length in inches.
        scale_length: f32,
        frets: u8,
        strings: u8,
        #[serde(default)]
        handedness: Handedness,
    },
    /// Amplifiers and cabinets.
    #[serde(rename_all = "camelCase")]
    Amplifier {
        wattage: u16,
        channels: u8,
        speaker_config: String,
        tube: bool,
    },
    /// Effect pedals.
    #[serde(rename_all = "camelCase")]
    Effect {
        effect_type: String,
        true_bypass: bool,
        /// Power draw in milliamps.
        current_draw_ma: u16,
    },
    /// Straps, strings, cables, cases.
    #[serde(rename_all = "camelCase")]
    Accessory {
        material: Option<String>,
        dimensions: Option<String>,
    },
    /// Polishes, oils and cleaning products.
    #[serde(rename_all = "camelCase")]
    Care { volume_ml: u16, scent: Option<String> },
}

impl Specifications {
    /// Whether this specification variant is valid for `category`.
    #[must_use]
    pub const fn fits(&self, category: ProductCategory) -> bool {
        matches!(
            (self, category),
            (Self::Unspecified, _)
                | (
                    Self::Instrument { .. },
                    ProductCategory::Guitars | ProductCategory::Basses
                )
                | (Self::Amplifier { .. }, ProductCategory::Amplifiers)
                | (Self::Effect { .. }, ProductCategory::Effects)
                | (Self::Accessory { .. }, ProductCategory::Accessories)
                | (Self::Care { .. }, ProductCategory::Care)
        )
    }

    /// The `kind` tag as it appears in JSON.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Instrument { .. } => "instrument",
            Self::Amplifier { .. } => "amplifier",
            Self::Effect { .. } => "effect",
            Self::Accessory { .. } => "accessory",
            Self::Care { .. } => "care",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_category() {
        let amp = Specifications::Amplifier {
            wattage: 30,
            channels: 2,
            speaker_config: "1x12".to_owned(),
            tube: true,
        };
        assert!(amp.fits(ProductCategory::Amplifiers));
        assert!(!amp.fits(ProductCategory::Guitars));
        assert!(Specifications::Unspecified.fits(ProductCategory::Care));
    }

    #[test]
    fn test_tagged_json_shape() {
        let json = serde_json::json!({
            "kind": "instrument",
            "bodyWood": "Alder",
            "neckWood": "Maple",
            "fretboard": "Rosewood",
            "pickups": "SSS",
            "scaleLength": 25.5,
            "frets": 22,
            "strings": 6
        });
        let specs: Specifications = serde_json::from_value(json).unwrap();
        assert_eq!(specs.kind(), "instrument");
        assert!(matches!(
            specs,
            Specifications::Instrument {
                handedness: Handedness::Right,
                ..
            }
        ));
    }
}
