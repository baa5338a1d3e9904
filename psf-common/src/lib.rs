//! # PSF Common Library
//!
//! Shared code for the Product Spec Finder service:
//! - Configuration loading (TOML → ENV → CLI layering)
//! - Domain model (queries, per-source results, merged product records)
//! - Common error type

pub mod config;
pub mod error;
pub mod model;

pub use error::{Error, Result};
pub use model::{ProductRecord, Query, QueryKind, SourceResult};
