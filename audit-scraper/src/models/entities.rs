//! Entities handed to the persistence layer

use crate::models::RequirementNode;
use audit_common::CatalogYear;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// University-wide requirement set (`UC`, `GE`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolRequirement {
    pub id: String,
    pub requirements: Vec<RequirementNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Division {
    Undergraduate,
    Graduate,
}

impl Division {
    /// Bachelor's degrees are undergraduate; everything else graduate
    pub fn of_degree_name(name: &str) -> Self {
        if name.starts_with('B') {
            Division::Undergraduate
        } else {
            Division::Graduate
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Degree {
    pub id: String,
    pub name: String,
    pub division: Division,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Major {
    pub id: String,
    pub degree_id: String,
    pub code: String,
    pub name: String,
    pub requirements: Vec<RequirementNode>,
    pub specs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Minor {
    pub id: String,
    pub name: String,
    pub requirements: Vec<RequirementNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specialization {
    pub id: String,
    pub name: String,
    pub major_id: String,
    pub requirements: Vec<RequirementNode>,
}

/// College-level requirement block shared by any number of majors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollegeRequirement {
    pub id: String,
    pub name: String,
    pub requirements: Vec<RequirementNode>,
}

/// Degree code → display name, for the degree types parsed majors actually use
pub type DegreesAwardedIndex = BTreeMap<String, String>;

/// Everything one run produces, ready for hand-off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOutput {
    pub run_id: Uuid,
    pub catalog_year: CatalogYear,
    pub generated_at: DateTime<Utc>,
    pub school_requirements: Vec<SchoolRequirement>,
    pub degrees: Vec<Degree>,
    pub majors: Vec<Major>,
    pub minors: Vec<Minor>,
    pub specializations: Vec<Specialization>,
    pub college_requirements: Vec<CollegeRequirement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_of_degree_name() {
        assert_eq!(Division::of_degree_name("B.S."), Division::Undergraduate);
        assert_eq!(Division::of_degree_name("M.F.A."), Division::Graduate);
        assert_eq!(Division::of_degree_name("Pharm.D."), Division::Graduate);
    }
}
