//! # Degree-Audit Common Library
//!
//! Shared code for the degree-audit scraper:
//! - Error types
//! - Configuration loading
//! - Catalog-year and timestamp helpers
//! - Durable file writes

pub mod config;
pub mod error;
pub mod fs;
pub mod time;

pub use config::{ScraperConfig, TomlConfig};
pub use error::{Error, Result};
pub use time::CatalogYear;
