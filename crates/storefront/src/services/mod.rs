//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Customer registration, login and password changes
//! - `cart` - Session cart and live stock validation
//! - `checkout` - Checkout form validation
//! - `content` - Blog markdown rendering
//! - `reviews` - Review eligibility and validation

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod content;
pub mod reviews;
