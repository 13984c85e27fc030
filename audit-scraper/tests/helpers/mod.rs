//! Test Helper Utilities
//!
//! Shared utilities for testing audit-scraper

#![allow(dead_code)]

pub mod fake_upstream;

// Re-export commonly used items
pub use fake_upstream::{
    block, course, course_rule, report, spec_ref, FakeAudit, FakeCatalog,
};
