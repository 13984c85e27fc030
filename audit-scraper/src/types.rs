//! Core types and trait definitions for audit-scraper
//!
//! The orchestrator talks to both upstreams only through [`AuditApi`] and
//! [`CatalogApi`], so runs can be driven against in-memory fakes.

use crate::error::AuditError;
use crate::models::{Block, ProgramIdentity, ProgramTriplet};
use audit_common::CatalogYear;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Controlled vocabulary: code → description
pub type CodeMap = BTreeMap<String, String>;

/// Controlled vocabularies published by the audit system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vocabulary {
    Degrees,
    Majors,
    Minors,
    Specializations,
}

impl Vocabulary {
    /// Collection name in `/validations/special-entities/{collection}`
    pub fn collection(self) -> &'static str {
        match self {
            Vocabulary::Degrees => "degrees",
            Vocabulary::Majors => "majors",
            Vocabulary::Minors => "minors",
            Vocabulary::Specializations => "specializations",
        }
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// Blocks returned by a major audit
#[derive(Debug, Clone, PartialEq)]
pub struct MajorAudit {
    pub major: Block,
    /// College-level block, when the major's school publishes one
    pub college: Option<Block>,
}

// ============================================================================
// Upstream audit system
// ============================================================================

/// Typed access to the upstream audit system.
///
/// `Ok(None)` means "no data for this query" (error envelope, malformed body,
/// or block not present). `Err` is reserved for conditions that abort the run.
#[async_trait::async_trait]
pub trait AuditApi: Send + Sync {
    /// Catalog year every audit query is issued against
    fn catalog_year(&self) -> CatalogYear;

    /// University-wide (UC / GE) blocks
    async fn university_requirements(&self) -> Result<Option<Vec<Block>>, AuditError>;

    async fn major_audit(&self, triplet: &ProgramTriplet) -> Result<Option<MajorAudit>, AuditError>;

    async fn minor_audit(&self, minor_code: &str) -> Result<Option<Block>, AuditError>;

    /// Audit of `spec_code` taken under the candidate parent major
    async fn spec_audit(
        &self,
        parent: &ProgramIdentity,
        spec_code: &str,
    ) -> Result<Option<Block>, AuditError>;

    async fn mapping(&self, vocabulary: Vocabulary) -> Result<CodeMap, AuditError>;
}

// ============================================================================
// Independent catalog of record
// ============================================================================

/// One per-major-per-degree record from the catalog report search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogReportEntry {
    pub school: CatalogSchool,
    pub major: CatalogMajor,
    pub degree: CatalogDegree,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSchool {
    pub school_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMajor {
    pub major_code: String,
    /// Last valid term as `YYYYT` (year followed by term digit); `None` = still offered
    #[serde(default)]
    pub end_term_yyyyst: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDegree {
    pub degree_code: String,
}

/// Catalog-of-record API used for program discovery
#[async_trait::async_trait]
pub trait CatalogApi: Send + Sync {
    /// Award type code → label (e.g. `"1" → "B.S."`)
    async fn award_types(&self) -> Result<CodeMap, AuditError>;

    /// Every major/degree record the catalog knows about
    async fn report_search(&self) -> Result<Vec<CatalogReportEntry>, AuditError>;
}
