//! Specialization → parent major resolution
//!
//! The audit system lists specialization codes without saying which major
//! they belong to. Resolution order:
//! 1. cache (no network at all)
//! 2. exception table (irregular codes bound to a fixed major)
//! 3. suffix heuristic: `161A` belongs to a major coded `161`; candidate
//!    majors are tried in discovery order until one returns a block
//! 4. unresolved, remembered as such
//!
//! Every fresh outcome is written to the cache before returning.

use crate::error::ScrapeResult;
use crate::models::{MajorRecord, Program, ProgramIdentity, SpecializationRecord};
use crate::services::requirement_parser::RequirementTreeParser;
use crate::services::spec_cache::{CacheLookup, SpecCache, SpecCacheEntry};
use crate::types::AuditApi;

/// Specializations whose code does not follow the `{major}{LETTERS}` shape,
/// mapped to the major code they belong to.
///
/// Known incomplete: this is the only irregular case identified so far; any
/// other code that breaks the convention stays unresolved.
pub const SPEC_PARENT_EXCEPTIONS: &[(&str, &str)] = &[("OACSC", "203")];

/// Major code an irregular specialization is bound to
pub fn exception_parent(spec_code: &str) -> Option<&'static str> {
    SPEC_PARENT_EXCEPTIONS
        .iter()
        .find(|(code, _)| *code == spec_code)
        .map(|(_, major)| *major)
}

/// Candidate major code by convention: the code with its trailing uppercase
/// letter removed (`161A` → `161`, `0KQA` → `0KQ`). `None` when the code has
/// no such suffix or nothing would remain.
pub fn heuristic_major_code(spec_code: &str) -> Option<&str> {
    let last = spec_code.chars().last().filter(char::is_ascii_uppercase)?;
    let stem = &spec_code[..spec_code.len() - last.len_utf8()];
    (!stem.is_empty()).then_some(stem)
}

/// Parent candidates for a specialization, best first.
///
/// An exception-table entry replaces the heuristic entirely. Otherwise every
/// discovered major with the heuristic code is a candidate, in discovery order.
pub fn candidate_parents<'a>(spec_code: &str, majors: &'a [MajorRecord]) -> Vec<&'a ProgramIdentity> {
    let major_code: &str = match exception_parent(spec_code) {
        Some(major_code) => major_code,
        None => match heuristic_major_code(spec_code) {
            Some(major_code) => major_code,
            None => return Vec::new(),
        },
    };

    majors
        .iter()
        .map(|major| &major.triplet)
        .filter(|triplet| triplet.major_code == major_code)
        .collect()
}

/// Outcome of resolving one specialization
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(SpecializationRecord),
    Unresolved,
}

/// Resolves specializations against the audit API, backed by the cache
pub struct SpecializationResolver<'a> {
    api: &'a dyn AuditApi,
    parser: &'a RequirementTreeParser,
    cache: &'a mut SpecCache,
}

impl<'a> SpecializationResolver<'a> {
    pub fn new(
        api: &'a dyn AuditApi,
        parser: &'a RequirementTreeParser,
        cache: &'a mut SpecCache,
    ) -> Self {
        Self { api, parser, cache }
    }

    pub async fn resolve(&mut self, spec_code: &str, majors: &[MajorRecord]) -> ScrapeResult<Resolution> {
        match self.cache.lookup(spec_code) {
            CacheLookup::Resolved(entry) => {
                tracing::debug!(spec = spec_code, parent = %entry.parent, "Specialization cache hit");
                return Ok(Resolution::Resolved(self.to_record(spec_code, entry)));
            }
            CacheLookup::Unresolved => {
                tracing::debug!(spec = spec_code, "Specialization known unresolved");
                return Ok(Resolution::Unresolved);
            }
            CacheLookup::Miss => {}
        }

        for parent in candidate_parents(spec_code, majors) {
            let Some(block) = self.api.spec_audit(parent, spec_code).await? else {
                tracing::debug!(spec = spec_code, parent = %parent, "Candidate parent has no block");
                continue;
            };
            if block.is_empty() {
                tracing::debug!(spec = spec_code, parent = %parent, "Candidate parent returned empty block");
                continue;
            }

            let entry = SpecCacheEntry {
                parent: parent.clone(),
                block,
            };
            let record = self.to_record(spec_code, &entry);
            self.cache.record(spec_code, Some(entry))?;

            tracing::info!(spec = spec_code, parent = %parent, "Specialization resolved");
            return Ok(Resolution::Resolved(record));
        }

        tracing::warn!(spec = spec_code, "No parent major found for specialization");
        self.cache.record(spec_code, None)?;
        Ok(Resolution::Unresolved)
    }

    fn to_record(&self, spec_code: &str, entry: &SpecCacheEntry) -> SpecializationRecord {
        let program: Program = self.parser.parse_block(spec_code, &entry.block);
        SpecializationRecord {
            parent: entry.parent.clone(),
            program: Program {
                code: spec_code.to_string(),
                ..program
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProgramTriplet;

    fn major(school: &str, code: &str, degree: &str) -> MajorRecord {
        let triplet = ProgramTriplet::new(school, code, degree);
        MajorRecord {
            program: Program {
                id: triplet.major_id(),
                name: format!("Major {}", code),
                degree_type: Some(degree.to_string()),
                code: code.to_string(),
                requirements: vec![],
                specs: vec![],
            },
            triplet,
            college_id: None,
        }
    }

    #[test]
    fn test_heuristic_strips_uppercase_suffix() {
        assert_eq!(heuristic_major_code("161A"), Some("161"));
        assert_eq!(heuristic_major_code("0KQA"), Some("0KQ"));
        assert_eq!(heuristic_major_code("161"), None);
        assert_eq!(heuristic_major_code("ABC"), Some("AB"));
        assert_eq!(heuristic_major_code("A"), None);
        assert_eq!(heuristic_major_code(""), None);
    }

    #[test]
    fn test_only_one_letter_stripped() {
        let majors = vec![major("U", "0K", "BS"), major("U", "0KQ", "BS"), major("U", "0", "BA")];
        assert_eq!(candidate_parents("0KQA", &majors), vec![&majors[1].triplet]);
    }

    #[test]
    fn test_exception_table() {
        assert_eq!(exception_parent("OACSC"), Some("203"));
        assert_eq!(exception_parent("161A"), None);
    }

    #[test]
    fn test_candidates_in_discovery_order() {
        let majors = vec![
            major("U", "162", "BS"),
            major("U", "161", "BS"),
            major("U", "161", "BA"),
        ];
        let candidates = candidate_parents("161A", &majors);
        assert_eq!(
            candidates,
            vec![&majors[1].triplet, &majors[2].triplet]
        );
    }

    #[test]
    fn test_exception_ignores_code_shape() {
        let majors = vec![major("U", "0", "BS"), major("U", "203", "BS")];
        assert_eq!(candidate_parents("OACSC", &majors), vec![&majors[1].triplet]);
    }

    #[test]
    fn test_no_candidates() {
        let majors = vec![major("U", "161", "BS")];
        assert!(candidate_parents("999A", &majors).is_empty());
        assert!(candidate_parents("161", &majors).is_empty());
    }
}
