//! Core types and error definitions for Grocer.
//!
//! This crate provides the foundational types shared across all Grocer crates:
//! the unified error type, the product metadata model with its defaults, and
//! query tokenization.
//!
//! # Main types
//!
//! - [`GrocerError`]: Unified error enum for all Grocer subsystems.
//! - [`GrocerResult`]: Convenience alias for `Result<T, GrocerError>`.
//! - [`ProductMetadata`]: Typed, defaulted view over a metadata record.
//! - [`CatalogDocument`] / [`SemanticHit`]: What the catalog service returns.
//! - [`ResultItem`]: A single search result.
//! - [`Query`]: Raw query text plus its lowercase tokens.

/// Error types.
pub mod error;
/// Product metadata, catalog documents and result items.
pub mod product;
/// Query tokenization.
pub mod query;

pub use error::{GrocerError, GrocerResult};
pub use product::{
    parse_price, Bucket, CatalogDocument, ProductMetadata, ResultItem, SemanticHit,
    BRAND_KEY, PRICE_KEY, STORE_KEY, UNKNOWN_BRAND, UNKNOWN_STORE,
};
pub use query::Query;
