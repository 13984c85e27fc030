//! Stage: DISCOVERY

use super::{RunState, ScrapeOrchestrator};
use crate::error::ScrapeResult;
use crate::services::program_discovery::ProgramDiscovery;

impl ScrapeOrchestrator {
    pub(super) async fn stage_discovery(&self, mut state: RunState) -> ScrapeResult<RunState> {
        let discovery = ProgramDiscovery::new(self.catalog.as_ref());
        state.triplets = discovery
            .discover(&state.vocabularies.majors, &state.vocabularies.degrees)
            .await?;

        if state.triplets.is_empty() {
            tracing::warn!("Discovery produced no program triplets");
        }
        Ok(state)
    }
}
