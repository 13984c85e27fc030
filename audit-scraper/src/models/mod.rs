//! Data models for the degree-audit scraper
//!
//! - Raw upstream blocks
//! - Canonical requirement tree
//! - Programs and produced entities
//! - Scrape run state machine

pub mod block;
pub mod entities;
pub mod program;
pub mod requirement;
pub mod scrape_stage;

pub use block::{AuditEnvelope, Block};
pub use entities::{
    CollegeRequirement, Degree, DegreesAwardedIndex, Division, Major, Minor, SchoolRequirement,
    ScrapeOutput, Specialization,
};
pub use program::{MajorRecord, Program, ProgramIdentity, ProgramTriplet, SpecializationRecord};
pub use requirement::RequirementNode;
pub use scrape_stage::{ScrapeRun, ScrapeStage, StageTransition};
