//! Stage: VOCABULARIES

use super::{RunState, ScrapeOrchestrator, Vocabularies};
use crate::error::{ScrapeError, ScrapeResult};
use crate::types::{CodeMap, Vocabulary};

impl ScrapeOrchestrator {
    /// Fetch the four code vocabularies. Degrees and majors drive discovery,
    /// so an empty one aborts; empty minor or specialization lists only warn.
    pub(super) async fn stage_vocabularies(&self, mut state: RunState) -> ScrapeResult<RunState> {
        let degrees = self.required_vocabulary(Vocabulary::Degrees).await?;
        let majors = self.required_vocabulary(Vocabulary::Majors).await?;
        let minors = self.optional_vocabulary(Vocabulary::Minors).await?;
        let specializations = self.optional_vocabulary(Vocabulary::Specializations).await?;

        state.vocabularies = Vocabularies {
            degrees,
            majors,
            minors,
            specializations,
        };
        Ok(state)
    }

    async fn required_vocabulary(&self, vocabulary: Vocabulary) -> ScrapeResult<CodeMap> {
        let map = self.api.mapping(vocabulary).await?;
        if map.is_empty() {
            return Err(ScrapeError::EmptyVocabulary(vocabulary.to_string()));
        }
        Ok(map)
    }

    async fn optional_vocabulary(&self, vocabulary: Vocabulary) -> ScrapeResult<CodeMap> {
        let map = self.api.mapping(vocabulary).await?;
        if map.is_empty() {
            tracing::warn!(vocabulary = %vocabulary, "Vocabulary is empty");
        }
        Ok(map)
    }
}
