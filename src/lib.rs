//! Wardrobe Commerce
//!
//! Self-hosted storefront backend for a small fashion shop.
//!
//! ## Features
//! - Product catalog with category browsing
//! - Shopping bag with merge-on-duplicate adds
//! - Server-computed pricing: per-line totals, MRP and bag-level savings
//! - Postgres persistence with an in-memory fallback for development

pub mod bag;
pub mod cart;
pub mod error;
pub mod models;
pub mod pricing;
pub mod routes;
pub mod store;

pub use error::{CommerceError, Result};
