//! Session-held types for the admin API.
//!
//! Row models live in `kilala_core::models`; joined response shapes live
//! next to the repositories that produce them.

pub mod session;

pub use session::{CurrentAdmin, keys as session_keys};
