//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow` and are read with `query_as`. Session
//! types are serialized into the tower-sessions store.

pub mod basket;
pub mod catalog;
pub mod session;
pub mod user;

pub use basket::{BasketLine, BasketSummary};
pub use catalog::{Category, Product};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
