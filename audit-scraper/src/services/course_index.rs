//! Known-course index for expanding course patterns
//!
//! Audit rules often name courses by pattern: `COMPSCI 1@` (wildcard) or
//! `MATH 2A` through `MATH 2E` (range). Requirement leaves must be concrete
//! courses, so patterns are expanded against a list of known course ids.
//! With an empty index, patterns expand to nothing.

use audit_common::{Error, Result};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::Path;

/// Marker the audit system uses for "any characters"
pub const WILDCARD: char = '@';

/// Sorted set of course ids, `"{DEPARTMENT} {NUMBER}"`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseIndex {
    courses: BTreeSet<String>,
}

impl CourseIndex {
    pub fn new<I, S>(courses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            courses: courses.into_iter().map(Into::into).collect(),
        }
    }

    /// Load a JSON array of course ids
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let courses: Vec<String> = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Course index {} is not a JSON array of strings: {}", path.display(), e))
        })?;
        tracing::info!(path = %path.display(), courses = courses.len(), "Loaded course index");
        Ok(Self::new(courses))
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    fn in_department<'a>(&'a self, department: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.courses.iter().filter_map(move |id| {
            let (dept, number) = id.rsplit_once(' ')?;
            (dept == department).then_some((id.as_str(), number))
        })
    }

    /// Courses in `department` whose number starts with the part of
    /// `pattern` before the wildcard
    pub fn expand_wildcard(&self, department: &str, pattern: &str) -> Vec<String> {
        if department.contains(WILDCARD) {
            return Vec::new();
        }
        let prefix = pattern.split(WILDCARD).next().unwrap_or_default();
        self.in_department(department)
            .filter(|(_, number)| number.starts_with(prefix))
            .map(|(id, _)| id.to_string())
            .collect()
    }

    /// Courses in `department` numbered between `first` and `last`, inclusive
    pub fn expand_range(&self, department: &str, first: &str, last: &str) -> Vec<String> {
        self.in_department(department)
            .filter(|(_, number)| {
                compare_numbers(number, first) != Ordering::Less
                    && compare_numbers(number, last) != Ordering::Greater
            })
            .map(|(id, _)| id.to_string())
            .collect()
    }
}

/// Course number order: numeric prefix first, then the suffix (`2A < 2B < 10`)
pub fn compare_numbers(a: &str, b: &str) -> Ordering {
    fn split(number: &str) -> (Option<u32>, &str) {
        let digits = number.len() - number.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        (number[..digits].parse().ok(), &number[digits..])
    }
    let (a_num, a_rest) = split(a);
    let (b_num, b_rest) = split(b);
    a_num.cmp(&b_num).then_with(|| a_rest.cmp(b_rest))
}
