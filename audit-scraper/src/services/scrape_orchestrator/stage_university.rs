//! Stage: UNIVERSITY_REQUIREMENTS
//!
//! University-wide requirement sets come from a single unauthenticated-goal
//! audit. Both sets must be present; without them the run is meaningless.

use super::{RunState, ScrapeOrchestrator};
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::SchoolRequirement;

/// (stored id, block requirement type, block requirement value)
const UNIVERSITY_BLOCKS: &[(&str, &str, &str)] = &[("UC", "SCHOOL", "U"), ("GE", "PROGRAM", "GE")];

impl ScrapeOrchestrator {
    pub(super) async fn stage_university(&self, mut state: RunState) -> ScrapeResult<RunState> {
        let blocks = self
            .api
            .university_requirements()
            .await?
            .ok_or_else(|| ScrapeError::MissingBlock("university requirements".to_string()))?;

        for (id, requirement_type, requirement_value) in UNIVERSITY_BLOCKS {
            let block = blocks
                .iter()
                .find(|block| block.is(requirement_type, requirement_value))
                .ok_or_else(|| {
                    ScrapeError::MissingBlock(format!("{}/{}", requirement_type, requirement_value))
                })?;

            let requirements = self.parser.rule_array_to_requirements(&block.rule_array);
            tracing::info!(id = *id, groups = requirements.len(), "Parsed university requirements");

            state.school_requirements.push(SchoolRequirement {
                id: id.to_string(),
                requirements,
            });
        }

        Ok(state)
    }
}
