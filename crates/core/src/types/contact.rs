//! Customer contact details: email addresses and phone numbers.
//!
//! Both types normalize their input (trim, lowercase the email) so that
//! values stored in the database compare reliably.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Allowed phone characters: optional leading `+`, then digits, spaces,
/// dashes, dots and parentheses.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9 ().\-]+$").unwrap_or_else(|_| unreachable!("static pattern"))
});

/// Errors that can occur when parsing contact details.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    #[error("email cannot be empty")]
    EmptyEmail,
    #[error("email must be at most {max} characters")]
    EmailTooLong { max: usize },
    #[error("email must contain exactly one @ symbol")]
    BadAtSymbol,
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    #[error("email domain must contain a dot")]
    BadDomain,
    #[error("phone number contains invalid characters")]
    PhoneCharacters,
    #[error("phone number must have between {min} and {max} digits")]
    PhoneDigits { min: usize, max: usize },
}

/// A normalized (trimmed, lowercased) email address.
///
/// ```
/// use tonewood_core::Email;
///
/// let email = Email::parse("  Player@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "player@example.com");
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("user@localhost").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalize an email address.
    ///
    /// # Errors
    ///
    /// Returns a [`ContactError`] describing the first rule the input breaks.
    pub fn parse(input: &str) -> Result<Self, ContactError> {
        let normalized = input.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(ContactError::EmptyEmail);
        }
        if normalized.len() > Self::MAX_LENGTH {
            return Err(ContactError::EmailTooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let mut parts = normalized.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ContactError::BadAtSymbol);
        };

        if local.is_empty() {
            return Err(ContactError::EmptyLocalPart);
        }
        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(ContactError::BadDomain);
        }

        Ok(Self(normalized))
    }

    /// The email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = ContactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A loosely formatted phone number with 7 to 15 digits.
///
/// The original formatting is kept (trimmed) for display to staff.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Minimum number of digits.
    pub const MIN_DIGITS: usize = 7;
    /// Maximum number of digits (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Parse a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::PhoneCharacters`] for unexpected characters and
    /// [`ContactError::PhoneDigits`] when the digit count is out of range.
    pub fn parse(input: &str) -> Result<Self, ContactError> {
        let trimmed = input.trim();
        if !PHONE_PATTERN.is_match(trimmed) {
            return Err(ContactError::PhoneCharacters);
        }

        let digits = trimmed.chars().filter(char::is_ascii_digit).count();
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits) {
            return Err(ContactError::PhoneDigits {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// The phone number as entered (trimmed).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Phone {
    type Error = ContactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "postgres")]
mod postgres {
    use super::{Email, Phone};

    macro_rules! text_backed {
        ($ty:ty) => {
            impl sqlx::Type<sqlx::Postgres> for $ty {
                fn type_info() -> sqlx::postgres::PgTypeInfo {
                    <String as sqlx::Type<sqlx::Postgres>>::type_info()
                }

                fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                    <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
                }
            }

            impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
                fn decode(
                    value: sqlx::postgres::PgValueRef<'r>,
                ) -> Result<Self, sqlx::error::BoxDynError> {
                    let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                    // Database values were validated on the way in
                    Ok(Self(s))
                }
            }

            impl sqlx::Encode<'_, sqlx::Postgres> for $ty {
                fn encode_by_ref(
                    &self,
                    buf: &mut sqlx::postgres::PgArgumentBuffer,
                ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                    <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
                }
            }
        };
    }

    text_backed!(Email);
    text_backed!(Phone);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalizes() {
        let email = Email::parse(" Jane.Doe+strings@Example.co.uk ").unwrap();
        assert_eq!(email.as_str(), "jane.doe+strings@example.co.uk");
    }

    #[test]
    fn test_email_rejections() {
        assert_eq!(Email::parse("   "), Err(ContactError::EmptyEmail));
        assert_eq!(Email::parse("a@b@c.com"), Err(ContactError::BadAtSymbol));
        assert_eq!(Email::parse("@example.com"), Err(ContactError::EmptyLocalPart));
        assert_eq!(Email::parse("user@example"), Err(ContactError::BadDomain));
        assert_eq!(Email::parse("user@.com"), Err(ContactError::BadDomain));
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(ContactError::EmailTooLong { .. })
        ));
    }

    #[test]
    fn test_email_deserialize_validates() {
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
        let email: Email = serde_json::from_str("\"A@B.io\"").unwrap();
        assert_eq!(email.to_string(), "a@b.io");
    }

    #[test]
    fn test_phone_accepts_common_formats() {
        assert!(Phone::parse("+1 (555) 010-2030").is_ok());
        assert!(Phone::parse("555.010.2030").is_ok());
        assert_eq!(Phone::parse("  5550102 ").unwrap().as_str(), "5550102");
    }

    #[test]
    fn test_phone_rejections() {
        assert_eq!(Phone::parse("call me"), Err(ContactError::PhoneCharacters));
        assert!(matches!(
            Phone::parse("12345"),
            Err(ContactError::PhoneDigits { .. })
        ));
        assert!(matches!(
            Phone::parse("1234567890123456"),
            Err(ContactError::PhoneDigits { .. })
        ));
    }
}
