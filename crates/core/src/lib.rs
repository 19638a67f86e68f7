//! Kilala Core - Shared domain types.
//!
//! This crate provides the types shared by every Kilala Eye component:
//! - `storefront` - Public catalog, cart, checkout and customer accounts
//! - `admin` - Back-office API for catalog, orders, users, blog and reviews
//! - `cli` - Migrations, admin user management and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. Row models derive `sqlx::FromRow` only when the
//! `postgres` feature is enabled.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, email, money, statuses, slugs, pagination
//! - [`models`] - Row models for the shop database

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use types::*;
