//! In-memory audit and catalog upstreams
//!
//! Both fakes record every call so tests can assert on network traffic
//! (e.g. "a cache hit issues zero audits").

use audit_common::CatalogYear;
use audit_scraper::error::AuditError;
use audit_scraper::models::{Block, ProgramIdentity, ProgramTriplet};
use audit_scraper::types::{
    AuditApi, CatalogApi, CatalogDegree, CatalogMajor, CatalogReportEntry, CatalogSchool, CodeMap,
    MajorAudit, Vocabulary,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

pub fn course(dept: &str, number: &str) -> Value {
    json!({"discipline": dept, "number": number})
}

/// Course rule requiring every listed course
pub fn course_rule(courses: &[(&str, &str)]) -> Value {
    let course_array: Vec<Value> = courses.iter().map(|(d, n)| course(d, n)).collect();
    json!({
        "ruleType": "Course",
        "label": "Required courses",
        "requirement": {
            "classesBegin": course_array.len().to_string(),
            "courseArray": course_array
        }
    })
}

/// Specialization reference as the audit system embeds it in a major block
pub fn spec_ref(code: &str) -> Value {
    json!({"ruleType": "Noncourse", "requirement": {"type": "SPEC", "value": code}})
}

pub fn block(requirement_type: &str, value: &str, title: &str, rules: Vec<Value>) -> Block {
    serde_json::from_value(json!({
        "requirementType": requirement_type,
        "requirementValue": value,
        "title": title,
        "ruleArray": rules
    }))
    .unwrap()
}

pub fn report(school: &str, major: &str, end_term: Option<&str>, degree_code: &str) -> CatalogReportEntry {
    CatalogReportEntry {
        school: CatalogSchool {
            school_code: school.to_string(),
        },
        major: CatalogMajor {
            major_code: major.to_string(),
            end_term_yyyyst: end_term.map(str::to_string),
        },
        degree: CatalogDegree {
            degree_code: degree_code.to_string(),
        },
    }
}

fn code_map(pairs: &[(&str, &str)]) -> CodeMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Fake audit system
pub struct FakeAudit {
    pub catalog_year: CatalogYear,
    pub university: Option<Vec<Block>>,
    pub vocabularies: HashMap<Vocabulary, CodeMap>,
    pub majors: HashMap<ProgramTriplet, MajorAudit>,
    pub minors: HashMap<String, Block>,
    pub specs: HashMap<(ProgramTriplet, String), Block>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeAudit {
    /// Audit system with UC/GE blocks and B.S./B.A. degrees, nothing else
    pub fn new() -> Self {
        let mut vocabularies = HashMap::new();
        vocabularies.insert(Vocabulary::Degrees, code_map(&[("BS", "B.S."), ("BA", "B.A.")]));
        vocabularies.insert(Vocabulary::Majors, CodeMap::new());
        vocabularies.insert(Vocabulary::Minors, CodeMap::new());
        vocabularies.insert(Vocabulary::Specializations, CodeMap::new());

        Self {
            catalog_year: CatalogYear::starting(2024),
            university: Some(vec![
                block("SCHOOL", "U", "University Requirements", vec![course_rule(&[("WRITING", "40")])]),
                block("PROGRAM", "GE", "General Education", vec![course_rule(&[("HUMAN", "1A")])]),
            ]),
            vocabularies,
            majors: HashMap::new(),
            minors: HashMap::new(),
            specs: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_major(mut self, triplet: ProgramTriplet, major: Block, college: Option<Block>) -> Self {
        self.vocabulary_mut(Vocabulary::Majors)
            .insert(triplet.major_code.clone(), major.title.clone());
        self.majors.insert(triplet, MajorAudit { major, college });
        self
    }

    pub fn with_minor(mut self, code: &str, description: &str, minor: Option<Block>) -> Self {
        self.vocabulary_mut(Vocabulary::Minors)
            .insert(code.to_string(), description.to_string());
        if let Some(minor) = minor {
            self.minors.insert(code.to_string(), minor);
        }
        self
    }

    /// Declare a specialization code, answered only under `answer`'s parent
    pub fn with_spec(mut self, code: &str, answer: Option<(ProgramTriplet, Block)>) -> Self {
        self.vocabulary_mut(Vocabulary::Specializations)
            .insert(code.to_string(), format!("Specialization {}", code));
        if let Some((parent, spec)) = answer {
            self.specs.insert((parent, code.to_string()), spec);
        }
        self
    }

    /// Major code the audit system knows but has no audit for
    pub fn with_unaudited_major(mut self, code: &str) -> Self {
        self.vocabulary_mut(Vocabulary::Majors)
            .insert(code.to_string(), format!("Major {}", code));
        self
    }

    fn vocabulary_mut(&mut self, vocabulary: Vocabulary) -> &mut CodeMap {
        self.vocabularies.entry(vocabulary).or_default()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(prefix))
            .collect()
    }
}

#[async_trait::async_trait]
impl AuditApi for FakeAudit {
    fn catalog_year(&self) -> CatalogYear {
        self.catalog_year
    }

    async fn university_requirements(&self) -> Result<Option<Vec<Block>>, AuditError> {
        self.record("university".to_string());
        Ok(self.university.clone())
    }

    async fn major_audit(&self, triplet: &ProgramTriplet) -> Result<Option<MajorAudit>, AuditError> {
        self.record(format!("major {}", triplet));
        Ok(self.majors.get(triplet).cloned())
    }

    async fn minor_audit(&self, minor_code: &str) -> Result<Option<Block>, AuditError> {
        self.record(format!("minor {}", minor_code));
        Ok(self.minors.get(minor_code).cloned())
    }

    async fn spec_audit(
        &self,
        parent: &ProgramIdentity,
        spec_code: &str,
    ) -> Result<Option<Block>, AuditError> {
        self.record(format!("spec {} {}", spec_code, parent));
        Ok(self
            .specs
            .get(&(parent.clone(), spec_code.to_string()))
            .cloned())
    }

    async fn mapping(&self, vocabulary: Vocabulary) -> Result<CodeMap, AuditError> {
        self.record(format!("mapping {}", vocabulary));
        Ok(self.vocabularies.get(&vocabulary).cloned().unwrap_or_default())
    }
}

/// Fake catalog of record
pub struct FakeCatalog {
    pub award_types: CodeMap,
    pub reports: Vec<CatalogReportEntry>,
}

impl FakeCatalog {
    /// Catalog where award `1` is a B.S. and `2` a B.A.
    pub fn new(reports: Vec<CatalogReportEntry>) -> Self {
        Self {
            award_types: code_map(&[("1", "B.S."), ("2", "B.A.")]),
            reports,
        }
    }
}

#[async_trait::async_trait]
impl CatalogApi for FakeCatalog {
    async fn award_types(&self) -> Result<CodeMap, AuditError> {
        Ok(self.award_types.clone())
    }

    async fn report_search(&self) -> Result<Vec<CatalogReportEntry>, AuditError> {
        Ok(self.reports.clone())
    }
}
