//! Row models for the shop database.
//!
//! These mirror the tables one-to-one. They derive `sqlx::FromRow` when the
//! `postgres` feature is enabled so both binaries can load them with runtime
//! queries. Response shapes that join several tables live in the binaries.

pub mod catalog;
pub mod content;
pub mod order;
pub mod user;

pub use catalog::{Category, Collection, Product, ProductAttribute, ProductImage, Tag};
pub use content::{Post, Review};
pub use order::{Order, OrderItem};
pub use user::User;
