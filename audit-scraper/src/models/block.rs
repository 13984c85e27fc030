//! Raw audit blocks as returned by the upstream audit API
//!
//! Only the requirement type, value, title and rule array are interpreted.
//! Every other field is carried verbatim so cached blocks round-trip intact.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One named section of an audit response (e.g. one major's requirements)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// `MAJOR`, `MINOR`, `SPEC`, `COLLEGE`, `SCHOOL`, `PROGRAM`, ...
    #[serde(default)]
    pub requirement_type: String,
    /// Code within the requirement type (major code, minor code, ...)
    #[serde(default)]
    pub requirement_value: String,
    #[serde(default)]
    pub title: String,
    /// Loosely-typed rule entries, interpreted by the requirement parser
    #[serde(default)]
    pub rule_array: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Block {
    pub fn is(&self, requirement_type: &str, requirement_value: &str) -> bool {
        self.requirement_type == requirement_type && self.requirement_value == requirement_value
    }

    pub fn is_empty(&self) -> bool {
        self.rule_array.is_empty()
    }
}

/// Audit response envelope: `{blockArray}` on success, `{error}` otherwise
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AuditEnvelope {
    Blocks {
        #[serde(rename = "blockArray")]
        block_array: Vec<Block>,
    },
    Error {
        error: Value,
    },
}

impl AuditEnvelope {
    /// Collapse the envelope to "blocks or nothing"
    pub fn into_blocks(self) -> Option<Vec<Block>> {
        match self {
            AuditEnvelope::Blocks { block_array } => Some(block_array),
            AuditEnvelope::Error { error } => {
                tracing::debug!(error = %error, "Audit returned error envelope");
                None
            }
        }
    }
}
