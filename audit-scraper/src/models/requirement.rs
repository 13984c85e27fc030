//! Canonical requirement tree

use serde::{Deserialize, Serialize};

/// Boolean requirement tree produced from an audit rule array
///
/// Invariants (upheld by the constructors below and by the parser):
/// - every leaf is a concrete course or exam
/// - every internal node has at least one child
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RequirementNode {
    AllOf {
        children: Vec<RequirementNode>,
    },
    AnyOf {
        children: Vec<RequirementNode>,
    },
    NoneOf {
        children: Vec<RequirementNode>,
    },
    #[serde(rename_all = "camelCase")]
    CourseRequirement {
        course_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_grade: Option<String>,
        #[serde(default)]
        is_coreq: bool,
    },
    #[serde(rename_all = "camelCase")]
    ExamRequirement {
        exam_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_grade: Option<String>,
    },
}

impl RequirementNode {
    pub fn course(course_id: impl Into<String>) -> Self {
        RequirementNode::CourseRequirement {
            course_id: course_id.into(),
            min_grade: None,
            is_coreq: false,
        }
    }

    pub fn exam(exam_name: impl Into<String>) -> Self {
        RequirementNode::ExamRequirement {
            exam_name: exam_name.into(),
            min_grade: None,
        }
    }

    /// Conjunction; `None` when there is nothing to require, the child itself
    /// when there is exactly one
    pub fn all_of(children: Vec<RequirementNode>) -> Option<Self> {
        collapse(children, |children| RequirementNode::AllOf { children })
    }

    /// Disjunction; same collapsing rules as [`RequirementNode::all_of`]
    pub fn any_of(children: Vec<RequirementNode>) -> Option<Self> {
        collapse(children, |children| RequirementNode::AnyOf { children })
    }

    /// Exclusion; never collapsed since a bare leaf would invert its meaning
    pub fn none_of(children: Vec<RequirementNode>) -> Option<Self> {
        if children.is_empty() {
            None
        } else {
            Some(RequirementNode::NoneOf { children })
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            RequirementNode::CourseRequirement { .. } | RequirementNode::ExamRequirement { .. }
        )
    }

    pub fn children(&self) -> &[RequirementNode] {
        match self {
            RequirementNode::AllOf { children }
            | RequirementNode::AnyOf { children }
            | RequirementNode::NoneOf { children } => children,
            _ => &[],
        }
    }

    /// Leaves in depth-first order
    pub fn leaves(&self) -> Vec<&RequirementNode> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a RequirementNode>) {
        if self.is_leaf() {
            out.push(self);
        } else {
            for child in self.children() {
                child.collect_leaves(out);
            }
        }
    }

    /// True when no internal node anywhere in the tree is childless
    pub fn is_well_formed(&self) -> bool {
        self.is_leaf()
            || (!self.children().is_empty() && self.children().iter().all(Self::is_well_formed))
    }
}

fn collapse(
    mut children: Vec<RequirementNode>,
    wrap: impl FnOnce(Vec<RequirementNode>) -> RequirementNode,
) -> Option<RequirementNode> {
    match children.len() {
        0 => None,
        1 => children.pop(),
        _ => Some(wrap(children)),
    }
}
