//! Response and session models for the storefront.
//!
//! Row types shared with the admin live in `kilala_core::models`; the types
//! here are the joined shapes the JSON API returns.

pub mod catalog;
pub mod session;

pub use catalog::{
    NavItem, ProductCard, ProductCardRow, ProductDetail, ProductFilter, ProductSort,
    RatingSummary,
};
pub use session::{CurrentUser, keys as session_keys};
