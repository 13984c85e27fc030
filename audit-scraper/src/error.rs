//! Error types for audit-scraper
//!
//! Two layers: [`AuditError`] for a single upstream request, [`ScrapeError`]
//! for a whole run. Absence of data is not an error at either layer; clients
//! return `Option` for that.

use crate::models::ScrapeStage;
use std::path::PathBuf;
use thiserror::Error;

/// Upstream request errors
#[derive(Debug, Error)]
pub enum AuditError {
    /// Transport failure (connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream rejected the session credentials
    #[error("Session rejected by upstream (HTTP {0})")]
    SessionInvalid(u16),

    /// Non-success status other than an auth failure
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// HTTP client could not be constructed
    #[error("Client build error: {0}")]
    Client(String),
}

impl AuditError {
    /// Worth retrying: transport failures, throttling and server errors
    pub fn is_transient(&self) -> bool {
        match self {
            AuditError::Network(_) => true,
            AuditError::Api(status, _) => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => AuditError::SessionInvalid(status),
            _ => AuditError::Api(status, body),
        }
    }
}

impl From<reqwest::Error> for AuditError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AuditError::Parse(err.to_string())
        } else {
            AuditError::Network(err.to_string())
        }
    }
}

/// Run-level errors; every one of these aborts the run
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Audit(#[from] AuditError),

    /// Neither the forward-looking nor the prior catalog year answered the probe
    #[error("No catalog year available (tried {0})")]
    CatalogYearUnavailable(String),

    /// A block an upstream stage depends on was not returned
    #[error("Required block missing: {0}")]
    MissingBlock(String),

    /// A controlled vocabulary came back empty
    #[error("Vocabulary {0:?} is empty")]
    EmptyVocabulary(String),

    /// Specialization cache file exists but is not valid JSON
    #[error("Specialization cache {path} is corrupt: {message}")]
    CorruptCache { path: PathBuf, message: String },

    #[error("run() may only be called once per orchestrator")]
    AlreadyRun,

    #[error("Result not available: run stopped at {0}")]
    NotFinished(ScrapeStage),

    #[error(transparent)]
    Common(#[from] audit_common::Error),
}

/// Result type for run-level operations
pub type ScrapeResult<T> = Result<T, ScrapeError>;
