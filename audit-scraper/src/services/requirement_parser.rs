//! Requirement tree parser
//!
//! Converts an audit block's loosely-typed rule array into
//! [`RequirementNode`] trees. The walk is total: any entry it does not
//! understand is dropped with a warning and parsing continues.
//!
//! # Rule mapping
//! | `ruleType`  | Result                                                     |
//! |-------------|------------------------------------------------------------|
//! | `Course`    | course leaves; `AllOf` if every listed class is required, else `AnyOf`; `except` adds a `NoneOf` |
//! | `Test`      | exam leaf                                                  |
//! | `Group`     | `AllOf` when every child group is required, else `AnyOf`   |
//! | `Subset`    | `AllOf` of children                                        |
//! | `IfStmt`    | `AnyOf` of the flattened if/else branches                  |
//! | `Block`     | inline block parsed recursively, bare references skipped   |
//! | anything else | dropped                                                  |
//!
//! Output depends only on the input bytes; no maps with unstable iteration
//! order are involved, so identical blocks produce identical trees.

use crate::models::{Block, Program, RequirementNode};
use crate::services::course_index::{CourseIndex, WILDCARD};
use serde_json::Value;

/// Qualifier carrying the minimum passing grade
const GRADE_QUALIFIER: &str = "DWGRADE";
/// Qualifier marking a course that may be taken concurrently
const COREQ_QUALIFIER: &str = "DWCOREQ";
/// Pseudo-department the audit system uses for exam credit
const EXAM_DEPARTMENT: &str = "AP";

/// Requirement tree parser
#[derive(Debug, Clone, Default)]
pub struct RequirementTreeParser {
    courses: CourseIndex,
}

impl RequirementTreeParser {
    pub fn new(courses: CourseIndex) -> Self {
        Self { courses }
    }

    /// Parse one block into a program named after the block's title.
    ///
    /// `specs` starts empty; specializations are attached only once they
    /// resolve to this program.
    pub fn parse_block(&self, id: &str, block: &Block) -> Program {
        Program {
            id: id.to_string(),
            name: block.title.clone(),
            degree_type: None,
            code: block.requirement_value.clone(),
            requirements: self.rule_array_to_requirements(&block.rule_array),
            specs: Vec::new(),
        }
    }

    /// Top-level requirement groups of a rule array, in input order
    pub fn rule_array_to_requirements(&self, rule_array: &[Value]) -> Vec<RequirementNode> {
        rule_array
            .iter()
            .filter_map(|rule| self.parse_rule(rule))
            .collect()
    }

    fn parse_rule(&self, rule: &Value) -> Option<RequirementNode> {
        let Some(rule_type) = rule.get("ruleType").and_then(Value::as_str) else {
            tracing::warn!(rule = %abbreviate(rule), "Rule without ruleType dropped");
            return None;
        };

        match rule_type {
            "Course" => self.parse_course_rule(rule),
            "Test" => parse_test_rule(rule),
            "Group" => self.parse_group_rule(rule),
            "Subset" => RequirementNode::all_of(self.children(rule)),
            "IfStmt" => self.parse_if_rule(rule),
            "Block" => self.parse_block_rule(rule),
            "Noncourse" | "Complete" | "Incomplete" => {
                tracing::debug!(rule_type, label = label(rule), "Non-course rule skipped");
                None
            }
            other => {
                tracing::warn!(rule_type = other, label = label(rule), "Unrecognized rule dropped");
                None
            }
        }
    }

    fn children(&self, rule: &Value) -> Vec<RequirementNode> {
        match rule.get("ruleArray").and_then(Value::as_array) {
            Some(rules) => self.rule_array_to_requirements(rules),
            None => Vec::new(),
        }
    }

    fn parse_course_rule(&self, rule: &Value) -> Option<RequirementNode> {
        let requirement = rule.get("requirement")?;
        let included = self.course_leaves(requirement.get("courseArray"));
        let excluded = self.course_leaves(
            requirement
                .get("except")
                .or_else(|| rule.get("except"))
                .and_then(|except| except.get("courseArray")),
        );

        let excluded_ids: Vec<&str> = excluded.iter().filter_map(leaf_id).collect();
        let included: Vec<RequirementNode> = included
            .into_iter()
            .filter(|leaf| !leaf_id(leaf).is_some_and(|id| excluded_ids.contains(&id)))
            .collect();

        if included.is_empty() {
            tracing::warn!(label = label(rule), "Course rule resolved to no concrete courses");
            return None;
        }

        let classes = requirement.get("classesBegin").and_then(as_count);
        let credits = requirement.get("creditsBegin").and_then(as_count);
        let group = match (classes, credits) {
            (Some(n), _) if n >= included.len() => RequirementNode::all_of(included),
            (Some(_), _) | (None, Some(_)) => RequirementNode::any_of(included),
            (None, None) => RequirementNode::all_of(included),
        }?;

        match RequirementNode::none_of(excluded) {
            Some(exclusion) => RequirementNode::all_of(vec![group, exclusion]),
            None => Some(group),
        }
    }

    /// Concrete leaves for a course array, deduplicated, in listed order
    fn course_leaves(&self, course_array: Option<&Value>) -> Vec<RequirementNode> {
        let Some(courses) = course_array.and_then(Value::as_array) else {
            return Vec::new();
        };

        let mut leaves: Vec<RequirementNode> = Vec::new();
        for course in courses {
            for leaf in self.expand_course(course) {
                if !leaves.contains(&leaf) {
                    leaves.push(leaf);
                }
            }
        }
        leaves
    }

    fn expand_course(&self, course: &Value) -> Vec<RequirementNode> {
        let department = str_field(course, "discipline").trim();
        let number = str_field(course, "number").trim();
        let number_end = str_field(course, "numberEnd").trim();

        if department.is_empty() || number.is_empty() {
            tracing::warn!(course = %abbreviate(course), "Course entry without department/number dropped");
            return Vec::new();
        }

        let min_grade = qualifier(course, GRADE_QUALIFIER)
            .and_then(|q| q.get("valueList"))
            .and_then(Value::as_array)
            .and_then(|values| values.first())
            .and_then(Value::as_str)
            .map(str::to_string);
        let is_coreq = qualifier(course, COREQ_QUALIFIER).is_some();

        if department == EXAM_DEPARTMENT {
            return vec![RequirementNode::ExamRequirement {
                exam_name: format!("{} {}", department, number),
                min_grade,
            }];
        }

        let ids = if number.contains(WILDCARD) || department.contains(WILDCARD) {
            self.courses.expand_wildcard(department, number)
        } else if !number_end.is_empty() {
            self.courses.expand_range(department, number, number_end)
        } else {
            vec![format!("{} {}", department, number)]
        };

        if ids.is_empty() {
            tracing::debug!(department, number, number_end, "Course pattern matched no known courses");
        }

        ids.into_iter()
            .map(|course_id| RequirementNode::CourseRequirement {
                course_id,
                min_grade: min_grade.clone(),
                is_coreq,
            })
            .collect()
    }

    fn parse_group_rule(&self, rule: &Value) -> Option<RequirementNode> {
        let children = self.children(rule);
        let required = rule
            .get("requirement")
            .and_then(|r| r.get("numberOfGroups"))
            .and_then(as_count);

        match required {
            Some(n) if n < children.len() => RequirementNode::any_of(children),
            _ => RequirementNode::all_of(children),
        }
    }

    fn parse_if_rule(&self, rule: &Value) -> Option<RequirementNode> {
        let branches = flatten_if(rule);
        if branches
            .iter()
            .any(|r| r.get("ruleType").and_then(Value::as_str) == Some("Block"))
        {
            tracing::debug!(label = label(rule), "Conditional over block references skipped");
            return None;
        }

        let children = branches
            .into_iter()
            .filter_map(|branch| self.parse_rule(branch))
            .collect();
        RequirementNode::any_of(children)
    }

    fn parse_block_rule(&self, rule: &Value) -> Option<RequirementNode> {
        let Some(inline) = rule.get("block") else {
            tracing::debug!(label = label(rule), "Block reference without inline content skipped");
            return None;
        };

        match serde_json::from_value::<Block>(inline.clone()) {
            Ok(block) => RequirementNode::all_of(self.rule_array_to_requirements(&block.rule_array)),
            Err(e) => {
                tracing::warn!(label = label(rule), error = %e, "Malformed inline block dropped");
                None
            }
        }
    }
}

fn parse_test_rule(rule: &Value) -> Option<RequirementNode> {
    let requirement = rule.get("requirement")?;
    let name = str_field(requirement, "testName").trim();
    if name.is_empty() {
        tracing::warn!(label = label(rule), "Test rule without a test name dropped");
        return None;
    }

    let min_grade = requirement.get("minScore").and_then(|score| match score {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    Some(RequirementNode::ExamRequirement {
        exam_name: name.to_string(),
        min_grade,
    })
}

/// If/else branches of a conditional rule, nested conditionals inlined
fn flatten_if(rule: &Value) -> Vec<&Value> {
    let mut out = Vec::new();
    let requirement = rule.get("requirement");
    for part in ["ifPart", "elsePart"] {
        let rules = requirement
            .and_then(|r| r.get(part))
            .and_then(|p| p.get("ruleArray"))
            .and_then(Value::as_array);
        for inner in rules.into_iter().flatten() {
            if inner.get("ruleType").and_then(Value::as_str) == Some("IfStmt") {
                out.extend(flatten_if(inner));
            } else {
                out.push(inner);
            }
        }
    }
    out
}

fn qualifier<'a>(course: &'a Value, code: &str) -> Option<&'a Value> {
    course
        .get("withArray")
        .and_then(Value::as_array)?
        .iter()
        .find(|q| q.get("code").and_then(Value::as_str) == Some(code))
}

fn leaf_id(leaf: &RequirementNode) -> Option<&str> {
    match leaf {
        RequirementNode::CourseRequirement { course_id, .. } => Some(course_id),
        RequirementNode::ExamRequirement { exam_name, .. } => Some(exam_name),
        _ => None,
    }
}

/// Counts arrive as strings ("2"), numbers (2) or decimals ("2.0")
fn as_count(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| *f >= 0.0).map(|f| f.ceil() as usize),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f.ceil() as usize),
        _ => None,
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn label(rule: &Value) -> &str {
    str_field(rule, "label")
}

fn abbreviate(value: &Value) -> String {
    let mut text = value.to_string();
    if text.len() > 120 {
        let cut = (0..=120).rev().find(|i| text.is_char_boundary(*i)).unwrap_or(0);
        text.truncate(cut);
        text.push('…');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn course(dept: &str, number: &str) -> Value {
        json!({"discipline": dept, "number": number})
    }

    fn course_rule(classes: &str, courses: Vec<Value>) -> Value {
        json!({
            "ruleType": "Course",
            "label": "Courses",
            "requirement": {"classesBegin": classes, "courseArray": courses}
        })
    }

    fn parser() -> RequirementTreeParser {
        RequirementTreeParser::default()
    }

    #[test]
    fn test_all_listed_classes_required() {
        let rule = course_rule("2", vec![course("MATH", "2A"), course("MATH", "2B")]);
        let nodes = parser().rule_array_to_requirements(&[rule]);
        assert_eq!(
            nodes,
            vec![RequirementNode::AllOf {
                children: vec![RequirementNode::course("MATH 2A"), RequirementNode::course("MATH 2B")]
            }]
        );
    }

    #[test]
    fn test_choose_one_of_many() {
        let rule = course_rule("1", vec![course("STATS", "67"), course("STATS", "120A")]);
        let nodes = parser().rule_array_to_requirements(&[rule]);
        assert!(matches!(&nodes[0], RequirementNode::AnyOf { children } if children.len() == 2));
    }

    #[test]
    fn test_credit_rule_is_any_of() {
        let rule = json!({
            "ruleType": "Course",
            "requirement": {"creditsBegin": "8", "courseArray": [course("ART", "1"), course("ART", "2")]}
        });
        let nodes = parser().rule_array_to_requirements(&[rule]);
        assert!(matches!(nodes[0], RequirementNode::AnyOf { .. }));
    }

    #[test]
    fn test_single_course_is_bare_leaf() {
        let rule = course_rule("1", vec![course("I&C SCI", "31")]);
        assert_eq!(
            parser().rule_array_to_requirements(&[rule]),
            vec![RequirementNode::course("I&C SCI 31")]
        );
    }

    #[test]
    fn test_grade_and_coreq_qualifiers() {
        let rule = course_rule(
            "1",
            vec![json!({
                "discipline": "CHEM",
                "number": "1LC",
                "withArray": [
                    {"code": "DWGRADE", "operator": ">=", "valueList": ["C"]},
                    {"code": "DWCOREQ", "valueList": []}
                ]
            })],
        );
        assert_eq!(
            parser().rule_array_to_requirements(&[rule]),
            vec![RequirementNode::CourseRequirement {
                course_id: "CHEM 1LC".to_string(),
                min_grade: Some("C".to_string()),
                is_coreq: true,
            }]
        );
    }

    #[test]
    fn test_ap_pseudo_course_is_exam() {
        let rule = course_rule("1", vec![course("AP", "CALC BC")]);
        assert_eq!(
            parser().rule_array_to_requirements(&[rule]),
            vec![RequirementNode::exam("AP CALC BC")]
        );
    }

    #[test]
    fn test_test_rule() {
        let rule = json!({"ruleType": "Test", "requirement": {"testName": "ELWR", "minScore": 2}});
        assert_eq!(
            parser().rule_array_to_requirements(&[rule]),
            vec![RequirementNode::ExamRequirement {
                exam_name: "ELWR".to_string(),
                min_grade: Some("2".to_string()),
            }]
        );
    }

    #[test]
    fn test_wildcards_expand_through_index() {
        let parser = RequirementTreeParser::new(CourseIndex::new(["COMPSCI 161", "COMPSCI 162", "MATH 2A"]));
        let rule = json!({
            "ruleType": "Course",
            "requirement": {
                "classesBegin": "1",
                "courseArray": [course("COMPSCI", "16@")],
                "except": {"courseArray": [course("COMPSCI", "162")]}
            }
        });
        assert_eq!(
            parser.rule_array_to_requirements(&[rule]),
            vec![RequirementNode::AllOf {
                children: vec![
                    RequirementNode::course("COMPSCI 161"),
                    RequirementNode::NoneOf {
                        children: vec![RequirementNode::course("COMPSCI 162")]
                    },
                ]
            }]
        );
    }

    #[test]
    fn test_unresolvable_wildcard_dropped() {
        let rule = course_rule("1", vec![course("ELECTIVE", "@")]);
        assert!(parser().rule_array_to_requirements(&[rule]).is_empty());
    }

    #[test]
    fn test_group_one_of_subsets() {
        let rule = json!({
            "ruleType": "Group",
            "requirement": {"numberOfGroups": "1", "numberOfRules": "2"},
            "ruleArray": [
                course_rule("1", vec![course("PHYSICS", "7C")]),
                course_rule("1", vec![course("CHEM", "1A")])
            ]
        });
        assert_eq!(
            parser().rule_array_to_requirements(&[rule]),
            vec![RequirementNode::AnyOf {
                children: vec![RequirementNode::course("PHYSICS 7C"), RequirementNode::course("CHEM 1A")]
            }]
        );
    }

    #[test]
    fn test_if_statement_flattened() {
        let rule = json!({
            "ruleType": "IfStmt",
            "requirement": {
                "ifPart": {"ruleArray": [course_rule("1", vec![course("MATH", "2A")])]},
                "elsePart": {"ruleArray": [{
                    "ruleType": "IfStmt",
                    "requirement": {
                        "ifPart": {"ruleArray": [course_rule("1", vec![course("MATH", "5A")])]},
                        "elsePart": {"ruleArray": [course_rule("1", vec![course("MATH", "9")])]}
                    }
                }]}
            }
        });
        let nodes = parser().rule_array_to_requirements(&[rule]);
        assert_eq!(
            nodes,
            vec![RequirementNode::AnyOf {
                children: vec![
                    RequirementNode::course("MATH 2A"),
                    RequirementNode::course("MATH 5A"),
                    RequirementNode::course("MATH 9"),
                ]
            }]
        );
    }

    #[test]
    fn test_if_over_block_references_skipped() {
        let rule = json!({
            "ruleType": "IfStmt",
            "requirement": {
                "ifPart": {"ruleArray": [{"ruleType": "Block", "requirement": {"type": "SPEC", "value": "201A"}}]},
                "elsePart": {"ruleArray": [course_rule("1", vec![course("MATH", "2A")])]}
            }
        });
        assert!(parser().rule_array_to_requirements(&[rule]).is_empty());
    }

    #[test]
    fn test_inline_block_recursion() {
        let rule = json!({
            "ruleType": "Block",
            "requirement": {"type": "OTHER", "value": "LOWERDIV"},
            "block": {
                "requirementType": "OTHER",
                "requirementValue": "LOWERDIV",
                "title": "Lower Division",
                "ruleArray": [
                    course_rule("1", vec![course("MATH", "2A")]),
                    course_rule("1", vec![course("MATH", "2B")])
                ]
            }
        });
        assert_eq!(
            parser().rule_array_to_requirements(&[rule]),
            vec![RequirementNode::AllOf {
                children: vec![RequirementNode::course("MATH 2A"), RequirementNode::course("MATH 2B")]
            }]
        );
    }

    #[test]
    fn test_unrecognized_entries_skipped() {
        let rules = vec![
            json!("not an object"),
            json!({"label": "no type"}),
            json!({"ruleType": "Noncourse", "requirement": {"numberOfNonCourses": "1"}}),
            json!({"ruleType": "Mystery"}),
            json!({"ruleType": "Course"}),
            json!({"ruleType": "Group", "requirement": {"numberOfGroups": "1"}, "ruleArray": []}),
            course_rule("1", vec![course("WRITING", "39C")]),
        ];
        assert_eq!(
            parser().rule_array_to_requirements(&rules),
            vec![RequirementNode::course("WRITING 39C")]
        );
    }

    #[test]
    fn test_parse_block_leaves_specs_empty() {
        let block: Block = serde_json::from_value(json!({
            "requirementType": "MAJOR",
            "requirementValue": "201",
            "title": "Major in Computer Science",
            "ruleArray": [
                {"ruleType": "Block", "requirement": {"type": "SPEC", "value": "201A"}},
                {
                    "ruleType": "Block",
                    "requirement": {"type": "OTHER", "value": "LOWERDIV"},
                    "block": {
                        "requirementType": "OTHER",
                        "requirementValue": "LOWERDIV",
                        "title": "Lower Division",
                        "ruleArray": [course_rule("1", vec![course("MATH", "2A")])]
                    }
                },
                course_rule("1", vec![course("I&C SCI", "31")])
            ]
        }))
        .unwrap();

        let program = parser().parse_block("BS-201", &block);
        assert_eq!(program.name, "Major in Computer Science");
        assert_eq!(program.code, "201");
        assert!(program.specs.is_empty());
        assert_eq!(
            program.requirements,
            vec![RequirementNode::course("MATH 2A"), RequirementNode::course("I&C SCI 31")]
        );
    }

    fn mixed_rules() -> Vec<Value> {
        vec![
            json!("not an object"),
            json!({"label": "no type"}),
            json!({"ruleType": "Noncourse", "requirement": {"numberOfNonCourses": "1"}}),
            json!({"ruleType": "Mystery"}),
            json!({"ruleType": "Course"}),
            json!({"ruleType": "Test", "requirement": {}}),
            json!({"ruleType": "Group", "requirement": {"numberOfGroups": "1"}, "ruleArray": []}),
            json!({"ruleType": "Subset", "ruleArray": [json!({"ruleType": "Complete"})]}),
            json!({
                "ruleType": "Course",
                "requirement": {
                    "classesBegin": "1",
                    "courseArray": [],
                    "except": {"courseArray": [course("COMPSCI", "162")]}
                }
            }),
            json!({
                "ruleType": "Course",
                "requirement": {
                    "classesBegin": "1",
                    "courseArray": [course("COMPSCI", "162")],
                    "except": {"courseArray": [course("COMPSCI", "162")]}
                }
            }),
            json!({
                "ruleType": "Group",
                "requirement": {"numberOfGroups": "1"},
                "ruleArray": [
                    course_rule("1", vec![course("PHYSICS", "7C"), course("PHYSICS", "7D")]),
                    {
                        "ruleType": "IfStmt",
                        "requirement": {
                            "ifPart": {"ruleArray": [course_rule("1", vec![course("MATH", "2A")])]},
                            "elsePart": {"ruleArray": [{"ruleType": "Incomplete"}]}
                        }
                    },
                    {"ruleType": "Group", "ruleArray": [{"ruleType": "Mystery"}]}
                ]
            }),
            json!({
                "ruleType": "Block",
                "block": {
                    "requirementType": "OTHER",
                    "requirementValue": "UPPERDIV",
                    "title": "Upper Division",
                    "ruleArray": [
                        {"ruleType": "Noncourse"},
                        {
                            "ruleType": "Subset",
                            "ruleArray": [
                                course_rule("2", vec![course("COMPSCI", "161"), course("COMPSCI", "171")]),
                                {"ruleType": "Test", "requirement": {"testName": "ELWR"}}
                            ]
                        }
                    ]
                }
            }),
            json!({"ruleType": "Block", "block": {"ruleArray": "malformed"}}),
            course_rule("1", vec![course("AP", "CALC BC"), course("WRITING", "39C")]),
        ]
    }

    #[test]
    fn test_parsed_trees_are_well_formed() {
        let nodes = parser().rule_array_to_requirements(&mixed_rules());
        assert!(!nodes.is_empty());
        for node in &nodes {
            assert!(node.is_well_formed(), "childless group in {:?}", node);
            assert!(node.leaves().iter().all(|leaf| leaf.is_leaf()));
            assert!(node.leaves().iter().all(|leaf| matches!(
                leaf,
                RequirementNode::CourseRequirement { .. } | RequirementNode::ExamRequirement { .. }
            )));
        }
        let leaves: Vec<_> = nodes.iter().flat_map(|node| node.leaves()).cloned().collect();
        assert!(!leaves.contains(&RequirementNode::course("COMPSCI 162")));
        assert!(leaves.contains(&RequirementNode::course("COMPSCI 171")));
        assert!(leaves.contains(&RequirementNode::exam("AP CALC BC")));
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let rules = mixed_rules();
        let first = parser().rule_array_to_requirements(&rules);
        let second = parser().rule_array_to_requirements(&rules);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_as_count_shapes() {
        assert_eq!(as_count(&json!("2")), Some(2));
        assert_eq!(as_count(&json!(3)), Some(3));
        assert_eq!(as_count(&json!("1.5")), Some(2));
        assert_eq!(as_count(&json!("x")), None);
        assert_eq!(as_count(&json!(-1)), None);
    }
}
