//! Persistent specialization cache
//!
//! One JSON file per catalog year, keyed by specialization code. A value is
//! either `null` (confirmed unresolved) or the parent identity plus the
//! specialization's raw block. The file is read once at startup and
//! rewritten atomically after every new entry, so an interrupted run loses at
//! most the entry in flight.

use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{Block, ProgramIdentity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Resolved specialization: the major it belongs to and its audit block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecCacheEntry {
    pub parent: ProgramIdentity,
    pub block: Block,
}

/// Result of a cache lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheLookup<'a> {
    /// Never attempted
    Miss,
    /// Attempted before; no parent found
    Unresolved,
    Resolved(&'a SpecCacheEntry),
}

/// Specialization cache backed by a JSON file
#[derive(Debug)]
pub struct SpecCache {
    path: PathBuf,
    entries: BTreeMap<String, Option<SpecCacheEntry>>,
}

impl SpecCache {
    /// Load the cache file. A missing or blank file is an empty cache; any
    /// other unparseable content is fatal.
    pub fn load(path: &Path) -> ScrapeResult<Self> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(audit_common::Error::from)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| ScrapeError::CorruptCache {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?
            }
        } else {
            BTreeMap::new()
        };

        tracing::info!(
            path = %path.display(),
            entries = entries.len(),
            "Loaded specialization cache"
        );

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counts of (resolved, unresolved) entries
    pub fn summary(&self) -> (usize, usize) {
        let resolved = self.entries.values().filter(|e| e.is_some()).count();
        (resolved, self.entries.len() - resolved)
    }

    pub fn lookup(&self, spec_code: &str) -> CacheLookup<'_> {
        match self.entries.get(spec_code) {
            None => CacheLookup::Miss,
            Some(None) => CacheLookup::Unresolved,
            Some(Some(entry)) => CacheLookup::Resolved(entry),
        }
    }

    /// Record a resolution and persist the whole cache before returning
    pub fn record(&mut self, spec_code: &str, entry: Option<SpecCacheEntry>) -> ScrapeResult<()> {
        self.entries.insert(spec_code.to_string(), entry);
        audit_common::fs::write_json_atomic(&self.path, &self.entries)?;
        tracing::debug!(spec = spec_code, path = %self.path.display(), "Specialization cache written");
        Ok(())
    }
}
