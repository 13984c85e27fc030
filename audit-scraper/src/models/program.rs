//! Programs (majors, minors, specializations) and their query identities

use crate::models::RequirementNode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `(school, major, degree)`: one audit query target.
///
/// Unique as a query input only; two triplets can yield the same major.
/// Also the parent reference stored in the specialization cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramTriplet {
    pub school: String,
    pub major_code: String,
    pub degree: String,
}

/// Identity of a parent program, as persisted in the specialization cache
pub type ProgramIdentity = ProgramTriplet;

impl ProgramTriplet {
    pub fn new(
        school: impl Into<String>,
        major_code: impl Into<String>,
        degree: impl Into<String>,
    ) -> Self {
        Self {
            school: school.into(),
            major_code: major_code.into(),
            degree: degree.into(),
        }
    }

    /// Stored id of the major this triplet yields: `{degree}-{major}`
    pub fn major_id(&self) -> String {
        format!("{}-{}", self.degree, self.major_code)
    }
}

impl fmt::Display for ProgramTriplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.school, self.major_code, self.degree)
    }
}

/// Parsed program (major, minor or specialization)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree_type: Option<String>,
    pub code: String,
    pub requirements: Vec<RequirementNode>,
    /// Specialization codes belonging to this program
    pub specs: Vec<String>,
}

impl Program {
    /// Append a specialization code, ignoring duplicates
    pub fn add_spec(&mut self, spec_code: &str) {
        if !self.specs.iter().any(|s| s == spec_code) {
            self.specs.push(spec_code.to_string());
        }
    }
}

/// A discovered major: the triplet that produced it and its parsed program
#[derive(Debug, Clone, PartialEq)]
pub struct MajorRecord {
    pub triplet: ProgramTriplet,
    pub program: Program,
    /// Id of the deduplicated college requirement block, if any
    pub college_id: Option<String>,
}

/// A resolved specialization and the major it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct SpecializationRecord {
    pub parent: ProgramIdentity,
    pub program: Program,
}
