//! Tonewood Core - Shared domain library.
//!
//! This crate provides the types and pure logic used across all Tonewood
//! components:
//! - `storefront` - Public JSON API (catalog, cart, bookings, checkout)
//! - `admin` - Back office for products, services and incoming requests
//! - `cli` - Command-line tools for migrations, admin users and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and logic - no I/O, no database access,
//! no HTTP clients. Database encodings are available behind the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, contact details and statuses
//! - [`catalog`] - Products, services and per-category specifications
//! - [`cart`] / [`wishlist`] - Session-owned line item stores
//! - [`listing`] - Filter, sort and paginate record sets
//! - [`checkout`], [`booking`], [`custom_order`] - Form flow validation
//! - [`validation`] - Field-level validation errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod booking;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod custom_order;
pub mod listing;
pub mod types;
pub mod validation;
pub mod wishlist;

pub use types::*;
pub use validation::ValidationErrors;
