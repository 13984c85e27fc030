//! Program discovery
//!
//! Builds the list of (school, major, degree) triplets worth auditing by
//! cross-referencing the catalog of record against the audit system's own
//! vocabularies. The enumerated space is best-effort: records that cannot be
//! matched are logged and dropped.

use crate::error::AuditError;
use crate::models::ProgramTriplet;
use crate::types::{CatalogApi, CatalogReportEntry, CodeMap};
use std::collections::HashSet;

/// Majors retired before this year are never audited.
///
/// The oldest major still answering audits ended in 2006.
pub const CUTOFF_YEAR: i32 = 2006;

/// Catalog award labels that the audit system spells differently
pub const DEGREE_LABEL_ALIASES: &[(&str, &str)] = &[("B.Mus.", "B.M.")];

/// Catalog label as the audit degree vocabulary spells it, lowercased
fn normalize_label(label: &str) -> String {
    let label = label.trim();
    DEGREE_LABEL_ALIASES
        .iter()
        .find(|(catalog, _)| catalog.eq_ignore_ascii_case(label))
        .map(|(_, audit)| *audit)
        .unwrap_or(label)
        .to_lowercase()
}

/// Year part of a `YYYYT` end term; `None` if it does not start with a year
fn end_term_year(end_term: &str) -> Option<i32> {
    end_term.get(..4)?.parse().ok()
}

/// Whether a major is still in range: no end term, or ending at/after the cutoff
pub fn within_cutoff(entry: &CatalogReportEntry) -> bool {
    match entry.major.end_term_yyyyst.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(term) => match end_term_year(term) {
            Some(year) => year >= CUTOFF_YEAR,
            None => {
                tracing::warn!(
                    major = %entry.major.major_code,
                    end_term = term,
                    "Unparseable end term, keeping major"
                );
                true
            }
        },
    }
}

/// Audit degree keys whose description matches a catalog award label
pub fn matching_degrees<'a>(award_label: &str, audit_degrees: &'a CodeMap) -> Vec<&'a str> {
    let wanted = normalize_label(award_label);
    audit_degrees
        .iter()
        .filter(|(_, description)| description.trim().to_lowercase() == wanted)
        .map(|(key, _)| key.as_str())
        .collect()
}

/// Pure discovery over already-fetched inputs
pub fn discover_triplets(
    reports: &[CatalogReportEntry],
    award_types: &CodeMap,
    audit_majors: &CodeMap,
    audit_degrees: &CodeMap,
) -> Vec<ProgramTriplet> {
    let mut seen = HashSet::new();
    let mut triplets = Vec::new();

    for entry in reports {
        let major_code = entry.major.major_code.as_str();

        if !within_cutoff(entry) {
            tracing::debug!(major = major_code, "Major retired before cutoff, skipping");
            continue;
        }
        if !audit_majors.contains_key(major_code) {
            tracing::debug!(major = major_code, "Major unknown to audit system, skipping");
            continue;
        }

        let Some(award_label) = award_types.get(&entry.degree.degree_code) else {
            tracing::warn!(
                major = major_code,
                degree_code = %entry.degree.degree_code,
                "Unknown award type, skipping"
            );
            continue;
        };

        let degrees = matching_degrees(award_label, audit_degrees);
        if degrees.is_empty() {
            tracing::warn!(
                school = %entry.school.school_code,
                major = major_code,
                award = %award_label,
                "No audit degree matches award type, skipping"
            );
            continue;
        }

        for degree in degrees {
            let triplet = ProgramTriplet::new(&entry.school.school_code, major_code, degree);
            if seen.insert(triplet.clone()) {
                triplets.push(triplet);
            }
        }
    }

    triplets
}

/// Discovery against the live catalog API
pub struct ProgramDiscovery<'a> {
    catalog: &'a dyn CatalogApi,
}

impl<'a> ProgramDiscovery<'a> {
    pub fn new(catalog: &'a dyn CatalogApi) -> Self {
        Self { catalog }
    }

    pub async fn discover(
        &self,
        audit_majors: &CodeMap,
        audit_degrees: &CodeMap,
    ) -> Result<Vec<ProgramTriplet>, AuditError> {
        let award_types = self.catalog.award_types().await?;
        let reports = self.catalog.report_search().await?;

        let triplets = discover_triplets(&reports, &award_types, audit_majors, audit_degrees);
        tracing::info!(
            records = reports.len(),
            triplets = triplets.len(),
            "Program discovery complete"
        );
        Ok(triplets)
    }
}
