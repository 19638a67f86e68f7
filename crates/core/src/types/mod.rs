//! Core types for Kilala Eye.
//!
//! This module provides type-safe wrappers and pure business rules for
//! common domain concepts.

pub mod email;
pub mod id;
pub mod order_code;
pub mod pagination;
pub mod phone;
pub mod price;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use order_code::OrderCode;
pub use pagination::{Page, PageParams};
pub use phone::normalize_phone;
pub use price::{Price, ShippingPolicy, effective_price};
pub use slug::{SlugError, slug_or_derive, slugify};
pub use status::*;
