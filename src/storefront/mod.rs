//! Storefront Module
//!
//! The typed `api` surface the storefront and admin frontends call: cached
//! reads and invalidating writes against the upstream backend.

mod service;

pub use service::{record_id, Record, StorefrontApi};
