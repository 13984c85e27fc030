//! Stage: SPECIALIZATIONS

use super::{RunState, ScrapeOrchestrator};
use crate::error::ScrapeResult;
use crate::models::{Program, SpecializationRecord};
use crate::services::specialization_resolver::{Resolution, SpecializationResolver};

impl ScrapeOrchestrator {
    /// Resolve every known specialization code to its parent major and attach
    /// it. Codes are visited in vocabulary (sorted) order.
    pub(super) async fn stage_specializations(&mut self, mut state: RunState) -> ScrapeResult<RunState> {
        let mut resolver = SpecializationResolver::new(self.api.as_ref(), &self.parser, &mut self.cache);
        let mut unresolved = 0usize;

        for (code, description) in &state.vocabularies.specializations {
            let record = match resolver.resolve(code, &state.majors).await? {
                Resolution::Resolved(record) => record,
                Resolution::Unresolved => {
                    unresolved += 1;
                    continue;
                }
            };

            let parent_id = record.parent.major_id();
            let Some(parent) = state
                .majors
                .iter_mut()
                .find(|major| major.triplet == record.parent || major.program.id == parent_id)
            else {
                tracing::warn!(
                    spec = %code,
                    parent = %record.parent,
                    "Parent major not produced by this run, skipping specialization"
                );
                continue;
            };
            parent.program.add_spec(code);

            let name = if record.program.name.is_empty() {
                description.clone()
            } else {
                record.program.name.clone()
            };
            state.specializations.push(SpecializationRecord {
                program: Program {
                    name,
                    ..record.program
                },
                parent: parent.triplet.clone(),
            });
        }

        tracing::info!(
            resolved = state.specializations.len(),
            unresolved,
            "Specializations resolved"
        );
        Ok(state)
    }
}
