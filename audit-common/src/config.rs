//! Configuration loading and data folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default upstream audit API root
pub const DEFAULT_AUDIT_BASE_URL: &str = "https://reg.uci.edu/RespDashboard/api";
/// Default catalog-of-record API root
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://www.reg.uci.edu/mdsd/api";
/// Environment variable naming the data folder
pub const DATA_FOLDER_ENV: &str = "AUDIT_DATA_FOLDER";

const DEFAULT_REQUEST_DELAY_MS: u64 = 1000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_LOG_LEVEL: &str = "audit_scraper=info,audit_common=info";

/// On-disk TOML configuration; every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub audit_base_url: Option<String>,
    pub catalog_base_url: Option<String>,
    pub student_id: Option<String>,
    pub auth_header: Option<String>,
    pub request_delay_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub data_folder: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub course_index_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// Read a TOML config file. A missing file yields the empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Fill every unset field of `self` from `fallback`
    pub fn or(self, fallback: TomlConfig) -> TomlConfig {
        TomlConfig {
            audit_base_url: self.audit_base_url.or(fallback.audit_base_url),
            catalog_base_url: self.catalog_base_url.or(fallback.catalog_base_url),
            student_id: self.student_id.or(fallback.student_id),
            auth_header: self.auth_header.or(fallback.auth_header),
            request_delay_ms: self.request_delay_ms.or(fallback.request_delay_ms),
            request_timeout_secs: self.request_timeout_secs.or(fallback.request_timeout_secs),
            max_retries: self.max_retries.or(fallback.max_retries),
            data_folder: self.data_folder.or(fallback.data_folder),
            output_path: self.output_path.or(fallback.output_path),
            course_index_path: self.course_index_path.or(fallback.course_index_path),
            log_level: self.log_level.or(fallback.log_level),
        }
    }
}

/// Fully resolved scraper configuration
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub audit_base_url: String,
    pub catalog_base_url: String,
    /// Already-resolved subject identifier of the session
    pub student_id: String,
    /// Opaque `Authorization` header value, passed through untouched
    pub auth_header: String,
    pub request_delay: Duration,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub data_folder: PathBuf,
    pub output_path: PathBuf,
    pub course_index_path: Option<PathBuf>,
    pub log_level: String,
}

impl ScraperConfig {
    /// Resolve configuration in priority order: overrides (CLI / env) → TOML → defaults
    pub fn resolve(overrides: TomlConfig, file: TomlConfig) -> Result<Self> {
        let merged = overrides.or(file);

        let student_id = merged
            .student_id
            .filter(|s| is_present(s))
            .ok_or_else(|| Error::Config("student_id is not configured".to_string()))?;
        let auth_header = merged
            .auth_header
            .filter(|s| is_present(s))
            .ok_or_else(|| Error::Config("auth_header is not configured".to_string()))?;

        let data_folder = match merged.data_folder {
            Some(folder) => folder,
            None => resolve_data_folder(None, DATA_FOLDER_ENV),
        };
        let output_path = merged
            .output_path
            .unwrap_or_else(|| data_folder.join("programs.json"));

        Ok(Self {
            audit_base_url: trim_url(
                merged.audit_base_url.as_deref().unwrap_or(DEFAULT_AUDIT_BASE_URL),
            ),
            catalog_base_url: trim_url(
                merged.catalog_base_url.as_deref().unwrap_or(DEFAULT_CATALOG_BASE_URL),
            ),
            student_id,
            auth_header,
            request_delay: crate::time::millis_to_duration(
                merged.request_delay_ms.unwrap_or(DEFAULT_REQUEST_DELAY_MS),
            ),
            request_timeout: Duration::from_secs(
                merged.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            max_retries: merged.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            data_folder,
            output_path,
            course_index_path: merged.course_index_path,
            log_level: merged.log_level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }

    /// Path of the specialization cache for a catalog year
    pub fn spec_cache_path(&self, catalog_year: crate::CatalogYear) -> PathBuf {
        spec_cache_file(&self.data_folder, catalog_year)
    }
}

/// `{data_folder}/spec-cache-{catalogYear}.json`
pub fn spec_cache_file(data_folder: &Path, catalog_year: crate::CatalogYear) -> PathBuf {
    data_folder.join(format!("spec-cache-{}.json", catalog_year))
}

/// Data folder resolution priority:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. OS-dependent default
pub fn resolve_data_folder(cli_arg: Option<&Path>, env_var_name: &str) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if is_present(&path) {
            return PathBuf::from(path);
        }
    }

    default_data_folder()
}

/// Default config file path (`~/.config/degree-audit/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("degree-audit").join("config.toml"))
}

fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("degree-audit"))
        .unwrap_or_else(|| PathBuf::from("./degree_audit_data"))
}

fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
