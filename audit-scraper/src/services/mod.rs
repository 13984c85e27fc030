//! Service modules for the degree-audit scrape
//!
//! Upstream clients, discovery, parsing, specialization resolution and the
//! orchestrator that sequences them.

pub mod audit_client;
pub mod catalog_client;
pub mod course_index;
pub mod program_discovery;
pub mod requirement_parser;
pub mod scrape_orchestrator;
pub mod spec_cache;
pub mod specialization_resolver;

pub use audit_client::AuditClient;
pub use catalog_client::CatalogClient;
pub use course_index::CourseIndex;
pub use program_discovery::ProgramDiscovery;
pub use requirement_parser::RequirementTreeParser;
pub use scrape_orchestrator::ScrapeOrchestrator;
pub use spec_cache::{CacheLookup, SpecCache, SpecCacheEntry};
pub use specialization_resolver::{Resolution, SpecializationResolver};
