//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, password login and password hashing
//! - `catalog` - Featured product selection

pub mod auth;
pub mod catalog;
