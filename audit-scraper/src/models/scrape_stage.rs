//! Scrape run state machine
//!
//! Stages run strictly in order with no backward transitions:
//! INIT → UNIVERSITY_REQUIREMENTS → VOCABULARIES → DISCOVERY → MINORS → MAJORS
//! → SPECIALIZATIONS → POST_PROCESS → DONE

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Scrape run stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScrapeStage {
    /// Client bootstrapped, nothing fetched
    Init,
    /// UC and GE requirement blocks
    UniversityRequirements,
    /// Degree, major, minor and specialization code vocabularies
    Vocabularies,
    /// Valid (school, major, degree) triplets
    Discovery,
    Minors,
    Majors,
    Specializations,
    /// Hard-coded structural corrections
    PostProcess,
    /// Result available
    Done,
    /// A stage aborted the run
    Failed,
}

impl ScrapeStage {
    /// The stage that follows this one, `None` for terminal stages
    pub fn next(self) -> Option<ScrapeStage> {
        use ScrapeStage::*;
        match self {
            Init => Some(UniversityRequirements),
            UniversityRequirements => Some(Vocabularies),
            Vocabularies => Some(Discovery),
            Discovery => Some(Minors),
            Minors => Some(Majors),
            Majors => Some(Specializations),
            Specializations => Some(PostProcess),
            PostProcess => Some(Done),
            Done | Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ScrapeStage::Done | ScrapeStage::Failed)
    }
}

impl fmt::Display for ScrapeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScrapeStage::Init => "INIT",
            ScrapeStage::UniversityRequirements => "UNIVERSITY_REQUIREMENTS",
            ScrapeStage::Vocabularies => "VOCABULARIES",
            ScrapeStage::Discovery => "DISCOVERY",
            ScrapeStage::Minors => "MINORS",
            ScrapeStage::Majors => "MAJORS",
            ScrapeStage::Specializations => "SPECIALIZATIONS",
            ScrapeStage::PostProcess => "POST_PROCESS",
            ScrapeStage::Done => "DONE",
            ScrapeStage::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Stage transition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTransition {
    pub run_id: Uuid,
    pub old_stage: ScrapeStage,
    pub new_stage: ScrapeStage,
    pub transitioned_at: DateTime<Utc>,
}

/// Run bookkeeping: current stage and timing
#[derive(Debug, Clone)]
pub struct ScrapeRun {
    pub run_id: Uuid,
    pub stage: ScrapeStage,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl ScrapeRun {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            stage: ScrapeStage::Init,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Move forward to `new_stage`
    ///
    /// Only the immediate successor or `Failed` are accepted; anything else is
    /// a programming error in the orchestrator and returns `None`.
    pub fn transition_to(&mut self, new_stage: ScrapeStage) -> Option<StageTransition> {
        let allowed = self.stage.next() == Some(new_stage)
            || (new_stage == ScrapeStage::Failed && !self.stage.is_terminal());
        if !allowed {
            return None;
        }

        let transition = StageTransition {
            run_id: self.run_id,
            old_stage: self.stage,
            new_stage,
            transitioned_at: Utc::now(),
        };
        self.stage = new_stage;

        if new_stage.is_terminal() {
            self.ended_at = Some(Utc::now());
        }

        Some(transition)
    }
}

impl Default for ScrapeRun {
    fn default() -> Self {
        Self::new()
    }
}
