//! GeekShop Core - Shared domain types.
//!
//! This crate provides the validated newtypes used across all GeekShop
//! components:
//! - `storefront` - Catalog, basket, auth and the `/admin` panel
//! - `cli` - Migrations, catalog seeding and superuser management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP.
//! Enable the `postgres` feature to get `sqlx` encode/decode impls.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, usernames, emails, prices and quantities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
