//! Stages: MINORS and MAJORS
//!
//! One audit per minor code and per discovered triplet. A program the audit
//! system has no block for is logged and skipped.

use super::{RunState, ScrapeOrchestrator};
use crate::error::ScrapeResult;
use crate::models::{CollegeRequirement, MajorRecord, Program, RequirementNode};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Content id of a college requirement set: first 16 hex digits of the
/// SHA-256 of its serialized requirements
pub fn college_id(requirements: &[RequirementNode]) -> ScrapeResult<String> {
    let json = serde_json::to_vec(requirements).map_err(audit_common::Error::from)?;
    let digest = Sha256::digest(&json);
    Ok(digest.iter().take(8).map(|byte| format!("{:02x}", byte)).collect())
}

impl ScrapeOrchestrator {
    pub(super) async fn stage_minors(&self, mut state: RunState) -> ScrapeResult<RunState> {
        for (code, description) in &state.vocabularies.minors {
            let Some(block) = self.api.minor_audit(code).await? else {
                tracing::warn!(minor = %code, "No audit block for minor, skipping");
                continue;
            };

            let program = self.parser.parse_block(code, &block);
            let name = if program.name.is_empty() {
                description.clone()
            } else {
                program.name
            };

            tracing::debug!(minor = %code, groups = program.requirements.len(), "Parsed minor");
            state.minors.push(Program {
                name,
                code: code.clone(),
                ..program
            });
        }

        tracing::info!(minors = state.minors.len(), "Minors parsed");
        Ok(state)
    }

    /// Parse every discovered major. Two triplets that yield the same audit
    /// title (or the same stored id) are the same major; the first one wins.
    /// Untitled blocks are deduplicated by id only.
    pub(super) async fn stage_majors(&self, mut state: RunState) -> ScrapeResult<RunState> {
        let mut seen_titles = HashSet::new();
        let mut seen_ids = HashSet::new();

        for triplet in &state.triplets {
            let Some(audit) = self.api.major_audit(triplet).await? else {
                tracing::warn!(triplet = %triplet, "No audit block for major, skipping");
                continue;
            };

            let id = triplet.major_id();
            let title = audit.major.title.trim();
            let duplicate_title = !title.is_empty() && !seen_titles.insert(title.to_string());
            if duplicate_title || !seen_ids.insert(id.clone()) {
                tracing::warn!(
                    triplet = %triplet,
                    title = %audit.major.title,
                    "Duplicate major, dropping"
                );
                continue;
            }

            let program = self.parser.parse_block(&id, &audit.major);
            let program = Program {
                degree_type: Some(triplet.degree.clone()),
                code: triplet.major_code.clone(),
                ..program
            };

            let college_id = match audit.college {
                Some(block) => {
                    let requirements = self.parser.rule_array_to_requirements(&block.rule_array);
                    if requirements.is_empty() {
                        None
                    } else {
                        let shared_id = college_id(&requirements)?;
                        if !state.colleges.iter().any(|college| college.id == shared_id) {
                            tracing::debug!(college = %shared_id, title = %block.title, "New college requirement block");
                            state.colleges.push(CollegeRequirement {
                                id: shared_id.clone(),
                                name: block.title,
                                requirements,
                            });
                        }
                        Some(shared_id)
                    }
                }
                None => None,
            };

            tracing::debug!(major = %program.id, groups = program.requirements.len(), "Parsed major");
            state.majors.push(MajorRecord {
                triplet: triplet.clone(),
                program,
                college_id,
            });
        }

        tracing::info!(
            majors = state.majors.len(),
            colleges = state.colleges.len(),
            "Majors parsed"
        );
        Ok(state)
    }
}
