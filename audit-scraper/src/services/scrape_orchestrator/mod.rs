//! Scrape orchestrator
//!
//! Sequences one full batch run against the audit system.
//!
//! # Stage Progression
//! INIT → UNIVERSITY_REQUIREMENTS → VOCABULARIES → DISCOVERY → MINORS → MAJORS
//! → SPECIALIZATIONS → POST_PROCESS → DONE
//!
//! Each stage lives in its own `stage_*` module and is a method that consumes
//! the [`RunState`] produced by the previous stage and returns the next one.
//! Any stage error moves the run to FAILED and is returned from
//! [`ScrapeOrchestrator::run`]; nothing is retried at this level.

use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{
    CollegeRequirement, MajorRecord, Program, ProgramTriplet, SchoolRequirement, ScrapeOutput,
    ScrapeRun, ScrapeStage, SpecializationRecord,
};
use crate::services::requirement_parser::RequirementTreeParser;
use crate::services::spec_cache::SpecCache;
use crate::types::{AuditApi, CatalogApi, CodeMap};
use std::sync::Arc;
use uuid::Uuid;

mod stage_discovery;
mod stage_post_process;
mod stage_programs;
mod stage_specializations;
mod stage_university;
mod stage_vocabularies;

pub use stage_post_process::{apply_spec_merges, degrees_awarded, SpecMerge, SPEC_MERGES};
pub use stage_programs::college_id;

/// Vocabularies fetched in the VOCABULARIES stage
#[derive(Debug, Clone, Default)]
pub(crate) struct Vocabularies {
    pub degrees: CodeMap,
    pub majors: CodeMap,
    pub minors: CodeMap,
    pub specializations: CodeMap,
}

/// Accumulated run state, handed from stage to stage by value
#[derive(Debug, Default)]
pub(crate) struct RunState {
    pub school_requirements: Vec<SchoolRequirement>,
    pub vocabularies: Vocabularies,
    pub triplets: Vec<ProgramTriplet>,
    pub minors: Vec<Program>,
    pub majors: Vec<MajorRecord>,
    pub colleges: Vec<CollegeRequirement>,
    pub specializations: Vec<SpecializationRecord>,
}

/// Single-use scrape run driver
pub struct ScrapeOrchestrator {
    api: Arc<dyn AuditApi>,
    catalog: Arc<dyn CatalogApi>,
    parser: RequirementTreeParser,
    cache: SpecCache,
    run: ScrapeRun,
    output: Option<ScrapeOutput>,
}

impl ScrapeOrchestrator {
    pub fn new(
        api: Arc<dyn AuditApi>,
        catalog: Arc<dyn CatalogApi>,
        parser: RequirementTreeParser,
        cache: SpecCache,
    ) -> Self {
        Self {
            api,
            catalog,
            parser,
            cache,
            run: ScrapeRun::new(),
            output: None,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run.run_id
    }

    pub fn stage(&self) -> ScrapeStage {
        self.run.stage
    }

    pub fn cache(&self) -> &SpecCache {
        &self.cache
    }

    /// Execute every stage once. A second call fails with `AlreadyRun`,
    /// whether or not the first one succeeded.
    pub async fn run(&mut self) -> ScrapeResult<()> {
        if self.run.stage != ScrapeStage::Init {
            return Err(ScrapeError::AlreadyRun);
        }

        tracing::info!(
            run_id = %self.run.run_id,
            catalog_year = %self.api.catalog_year(),
            "Scrape run starting"
        );

        match self.execute().await {
            Ok(output) => {
                tracing::info!(
                    run_id = %self.run.run_id,
                    majors = output.majors.len(),
                    minors = output.minors.len(),
                    specializations = output.specializations.len(),
                    colleges = output.college_requirements.len(),
                    "Scrape run complete"
                );
                self.output = Some(output);
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    run_id = %self.run.run_id,
                    stage = %self.run.stage,
                    error = %e,
                    "Scrape run failed"
                );
                self.run.transition_to(ScrapeStage::Failed);
                Err(e)
            }
        }
    }

    /// Result of a finished run
    pub fn get(&self) -> ScrapeResult<&ScrapeOutput> {
        match (&self.output, self.run.stage) {
            (Some(output), ScrapeStage::Done) => Ok(output),
            (_, stage) => Err(ScrapeError::NotFinished(stage)),
        }
    }

    async fn execute(&mut self) -> ScrapeResult<ScrapeOutput> {
        let state = RunState::default();

        self.advance(ScrapeStage::UniversityRequirements)?;
        let state = self.stage_university(state).await?;

        self.advance(ScrapeStage::Vocabularies)?;
        let state = self.stage_vocabularies(state).await?;

        self.advance(ScrapeStage::Discovery)?;
        let state = self.stage_discovery(state).await?;

        self.advance(ScrapeStage::Minors)?;
        let state = self.stage_minors(state).await?;

        self.advance(ScrapeStage::Majors)?;
        let state = self.stage_majors(state).await?;

        self.advance(ScrapeStage::Specializations)?;
        let state = self.stage_specializations(state).await?;

        self.advance(ScrapeStage::PostProcess)?;
        let output = self.stage_post_process(state);

        self.advance(ScrapeStage::Done)?;
        Ok(output)
    }

    fn advance(&mut self, stage: ScrapeStage) -> ScrapeResult<()> {
        let transition = self.run.transition_to(stage).ok_or_else(|| {
            audit_common::Error::Internal(format!(
                "Illegal stage transition {} -> {}",
                self.run.stage, stage
            ))
        })?;

        tracing::info!(
            run_id = %transition.run_id,
            from = %transition.old_stage,
            to = %transition.new_stage,
            "Stage transition"
        );
        Ok(())
    }
}
