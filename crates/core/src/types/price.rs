//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are never negative. Arithmetic that could produce a negative value
//! is not offered. Amounts accepted from outside go through [`Price::new`],
//! which also enforces the `NUMERIC(10,2)` range of the money columns; sums
//! and multiples can exceed it and are checked with [`Price::fits_column`]
//! before they are stored.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("cannot be negative")]
    Negative(Decimal),

    /// The amount is above [`Price::MAX`].
    #[error("must be at most {}", Price::MAX)]
    TooLarge(Decimal),

    /// The amount has fractions of a cent.
    #[error("must have at most {} decimal places", Price::SCALE)]
    TooPrecise(Decimal),
}

/// A non-negative monetary amount in the shop currency's standard unit.
///
/// Serialized as a decimal string (e.g. `"19.99"`); deserializes from either a
/// string or a JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Decimal places stored for money.
    pub const SCALE: u32 = 2;

    /// Largest amount a `NUMERIC(10,2)` column holds: 99,999,999.99.
    pub const MAX: Self = Self(Decimal::from_parts(0x540B_E3FF, 2, 0, false, 2));

    /// Create a price from an amount received from outside.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount < 0`,
    /// [`PriceError::TooLarge`] above [`Price::MAX`], and
    /// [`PriceError::TooPrecise`] for fractions of a cent.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge(amount));
        }
        if amount.normalize().scale() > Self::SCALE {
            return Err(PriceError::TooPrecise(amount));
        }
        Ok(Self(amount))
    }

    /// Whether the amount can be written to a money column.
    #[must_use]
    pub fn fits_column(&self) -> bool {
        *self <= Self::MAX
    }

    /// Create a price from a whole number of currency units.
    #[must_use]
    pub fn from_units(units: u32) -> Self {
        Self(Decimal::from(units))
    }

    /// Create a price from minor units (cents).
    #[must_use]
    pub fn from_cents(cents: u64) -> Self {
        Self(Decimal::from(cents) / Decimal::ONE_HUNDRED)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether this price is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The price multiplied by a quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// The price scaled by a non-negative rate, rounded to cents
    /// (midpoint away from zero). Negative rates yield zero.
    #[must_use]
    pub fn scaled_by(&self, rate: Decimal) -> Self {
        if rate.is_sign_negative() {
            return Self::ZERO;
        }
        Self(self.0 * rate).rounded()
    }

    /// The price rounded to two decimal places (midpoint away from zero).
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Format for display with a currency symbol, e.g. `$1,249.00`.
    #[must_use]
    pub fn display(&self, currency: CurrencyCode) -> String {
        let rounded = self.rounded().0;
        let text = format!("{rounded:.2}");
        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        format!("{}{grouped}.{fraction}", currency.symbol())
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// ISO 4217 currency codes the shop can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert!(matches!(
            Price::new(Decimal::new(-1, 2)),
            Err(PriceError::Negative(_))
        ));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_rejects_amounts_the_columns_cannot_hold() {
        assert_eq!(Price::MAX.amount(), Decimal::new(9_999_999_999, 2));
        assert_eq!(Price::new(Price::MAX.amount()), Ok(Price::MAX));

        let too_large = Decimal::from(1_000_000_000_000_u64);
        assert!(matches!(Price::new(too_large), Err(PriceError::TooLarge(_))));
        assert!(matches!(
            Price::new(Decimal::new(100_000_000, 0)),
            Err(PriceError::TooLarge(_))
        ));

        // 99999999.999 would round up past the cap in the database
        assert!(matches!(
            Price::new(Decimal::new(99_999_999_999, 3)),
            Err(PriceError::TooPrecise(_))
        ));
        assert!(matches!(
            Price::new(Decimal::new(19_995, 3)),
            Err(PriceError::TooPrecise(_))
        ));
        // Trailing zeros are not extra precision
        assert_eq!(Price::new(Decimal::new(19_500, 3)), Ok(Price::from_cents(1950)));
    }

    #[test]
    fn test_sums_past_the_cap_do_not_fit() {
        let line = Price::MAX.times(99);
        assert!(!line.fits_column());
        assert!(Price::MAX.fits_column());
        assert!(!(Price::MAX + Price::from_cents(1)).fits_column());
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Price>("\"1000000000000\"").is_err());
        assert!(serde_json::from_str::<Price>("\"1.005\"").is_err());
    }

    #[test]
    fn test_times_and_sum() {
        let total: Price = [Price::from_units(1000).times(2), Price::from_units(500)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_units(2500));
    }

    #[test]
    fn test_scaled_by_rounds_half_away_from_zero() {
        // 1.25 * 0.1 = 0.125 -> 0.13
        let price = Price::from_cents(125);
        assert_eq!(price.scaled_by(Decimal::new(1, 1)), Price::from_cents(13));
        assert_eq!(price.scaled_by(Decimal::new(-1, 1)), Price::ZERO);
        assert_eq!(
            Price::new(Decimal::new(125, 3)).unwrap().rounded(),
            Price::from_cents(13)
        );
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::from_cents(124_900).display(CurrencyCode::USD), "$1,249.00");
        assert_eq!(Price::from_cents(999).display(CurrencyCode::GBP), "£9.99");
        assert_eq!(
            Price::from_units(1_000_000).display(CurrencyCode::EUR),
            "€1,000,000.00"
        );
    }

    #[test]
    fn test_deserialize_from_number_and_string() {
        let from_number: Price = serde_json::from_str("19.5").unwrap();
        let from_string: Price = serde_json::from_str("\"19.50\"").unwrap();
        assert_eq!(from_number, from_string);
        assert!(serde_json::from_str::<Price>("-3").is_err());
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("eur".parse::<CurrencyCode>().unwrap(), CurrencyCode::EUR);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
