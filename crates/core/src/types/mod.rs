//! Core types for Tonewood.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod contact;
pub mod id;
pub mod price;
pub mod status;

pub use contact::{ContactError, Email, Phone};
pub use id::*;
pub use price::{CurrencyCode, Price, PriceError};
pub use status::*;
