//! Business logic that sits between routes and repositories.

pub mod auth;
pub mod catalog;
pub mod content;
pub mod uploads;
pub mod users;
