//! audit-scraper library interface
//!
//! Exposes the clients, parser and orchestrator for the binary and for
//! integration testing.

pub mod error;
pub mod models;
pub mod services;
pub mod types;
pub mod utils;

pub use crate::error::{AuditError, ScrapeError, ScrapeResult};
