//! Upstream audit API client
//!
//! Rate-limited, retrying HTTP client for the degree-audit system. Every call
//! goes through one [`RateLimiter`], so no two requests overlap and each is
//! followed by the configured quiet period.
//!
//! Response handling is tri-state: a block array, an `{error}` envelope, or
//! an unparseable body. The last two collapse to `None`. Only a rejected
//! session (HTTP 401/403) or exhausted retries surface as errors.

use crate::error::{AuditError, ScrapeError, ScrapeResult};
use crate::models::{AuditEnvelope, Block, ProgramIdentity, ProgramTriplet};
use crate::types::{AuditApi, CodeMap, MajorAudit, Vocabulary};
use crate::utils::{retry_transient, RateLimiter, RetryPolicy};
use audit_common::{CatalogYear, ScraperConfig};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const USER_AGENT: &str = concat!("degree-audit-scraper/", env!("CARGO_PKG_VERSION"));

/// Probe target known to exist in every catalog year: B.S. in major 201
const PROBE_SCHOOL: &str = "U";
const PROBE_MAJOR: &str = "201";
const PROBE_DEGREE: &str = "BS";

/// Placeholder major used when auditing a minor on its own
const NO_MAJOR: &str = "000";

/// Goal facet of an audit request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GoalCode {
    Major,
    Minor,
    Spec,
    College,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Goal {
    pub code: GoalCode,
    pub value: String,
}

impl Goal {
    pub fn new(code: GoalCode, value: impl Into<String>) -> Self {
        Self {
            code,
            value: value.into(),
        }
    }
}

/// Body of `POST /audit`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest<'a> {
    pub catalog_year: CatalogYear,
    pub degree: &'a str,
    pub school: &'a str,
    pub student_id: &'a str,
    pub classes: Vec<Value>,
    pub goals: Vec<Goal>,
}

#[derive(Debug, Deserialize)]
struct VocabularyEntry {
    key: String,
    #[serde(default)]
    description: String,
}

enum Request {
    Get(reqwest::Url),
    Post(reqwest::Url, Value),
}

/// Degree-audit API client
pub struct AuditClient {
    http_client: reqwest::Client,
    base_url: String,
    student_id: String,
    catalog_year: CatalogYear,
    rate_limiter: RateLimiter,
    retry: RetryPolicy,
}

impl AuditClient {
    /// Build a client and resolve the active catalog year.
    ///
    /// Tries the forward-looking year first, then the one before it. Fails
    /// when neither answers the probe audit.
    pub async fn bootstrap(config: &ScraperConfig) -> ScrapeResult<Self> {
        Self::bootstrap_at(config, Utc::now()).await
    }

    /// [`AuditClient::bootstrap`] with an explicit "now"
    pub async fn bootstrap_at(config: &ScraperConfig, now: DateTime<Utc>) -> ScrapeResult<Self> {
        let mut client = Self::new(config, CatalogYear::forward_looking(now))?;
        let probe = ProgramTriplet::new(PROBE_SCHOOL, PROBE_MAJOR, PROBE_DEGREE);
        let forward = client.catalog_year;
        let candidates = [forward, forward.previous()];

        for year in candidates {
            client.catalog_year = year;
            tracing::debug!(catalog_year = %year, "Probing catalog year");
            if client.major_audit(&probe).await?.is_some() {
                tracing::info!(catalog_year = %year, "Catalog year resolved");
                return Ok(client);
            }
            tracing::warn!(catalog_year = %year, "Probe audit returned no data");
        }

        Err(ScrapeError::CatalogYearUnavailable(
            candidates
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        ))
    }

    /// Client pinned to a known catalog year, without probing
    pub fn new(config: &ScraperConfig, catalog_year: CatalogYear) -> Result<Self, AuditError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&config.auth_header)
            .map_err(|e| AuditError::Client(format!("Invalid auth header: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AuditError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.audit_base_url.clone(),
            student_id: config.student_id.clone(),
            catalog_year,
            rate_limiter: RateLimiter::new(config.request_delay),
            retry: RetryPolicy::new(config.max_retries),
        })
    }

    fn url(&self, path: &str) -> Result<reqwest::Url, AuditError> {
        reqwest::Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| AuditError::Client(format!("Invalid URL for {}: {}", path, e)))
    }

    async fn send_once(&self, request: &Request) -> Result<Option<Value>, AuditError> {
        let builder = match request {
            Request::Get(url) => self.http_client.get(url.clone()),
            Request::Post(url, body) => self.http_client.post(url.clone()).json(body),
        };

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = AuditError::from_status(status.as_u16(), body);
            if err.is_transient() || matches!(err, AuditError::SessionInvalid(_)) {
                return Err(err);
            }
            tracing::debug!(status = status.as_u16(), "Audit request rejected, treating as no data");
            return Ok(None);
        }

        let text = response.text().await?;
        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::debug!(error = %e, "Malformed audit response, treating as no data");
                Ok(None)
            }
        }
    }

    async fn execute(&self, operation: &str, request: Request) -> Result<Option<Value>, AuditError> {
        retry_transient(operation, self.retry, || {
            self.rate_limiter.run(|| self.send_once(&request))
        })
        .await
    }

    async fn audit(&self, degree: &str, school: &str, goals: Vec<Goal>) -> Result<Option<Vec<Block>>, AuditError> {
        let body = AuditRequest {
            catalog_year: self.catalog_year,
            degree,
            school,
            student_id: &self.student_id,
            classes: Vec::new(),
            goals,
        };
        let body = serde_json::to_value(&body).map_err(|e| AuditError::Parse(e.to_string()))?;
        let response = self.execute("audit", Request::Post(self.url("audit")?, body)).await?;
        Ok(response.and_then(into_blocks))
    }
}

fn into_blocks(value: Value) -> Option<Vec<Block>> {
    match serde_json::from_value::<AuditEnvelope>(value) {
        Ok(envelope) => envelope.into_blocks(),
        Err(e) => {
            tracing::debug!(error = %e, "Unrecognized audit envelope");
            None
        }
    }
}

fn take_block(blocks: &mut Vec<Block>, requirement_type: &str, requirement_value: &str) -> Option<Block> {
    let index = blocks.iter().position(|b| b.is(requirement_type, requirement_value))?;
    Some(blocks.swap_remove(index))
}

#[async_trait::async_trait]
impl AuditApi for AuditClient {
    fn catalog_year(&self) -> CatalogYear {
        self.catalog_year
    }

    async fn university_requirements(&self) -> Result<Option<Vec<Block>>, AuditError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/audit", self.base_url),
            &[
                ("studentId", self.student_id.as_str()),
                ("school", "U"),
                ("degree", "BA"),
            ],
        )
        .map_err(|e| AuditError::Client(e.to_string()))?;

        let response = self.execute("university_requirements", Request::Get(url)).await?;
        Ok(response.and_then(into_blocks))
    }

    async fn major_audit(&self, triplet: &ProgramTriplet) -> Result<Option<MajorAudit>, AuditError> {
        let goals = vec![Goal::new(GoalCode::Major, &triplet.major_code)];
        let Some(mut blocks) = self.audit(&triplet.degree, &triplet.school, goals).await? else {
            return Ok(None);
        };

        let Some(major) = take_block(&mut blocks, "MAJOR", &triplet.major_code) else {
            return Ok(None);
        };
        let college = blocks.into_iter().find(|b| b.requirement_type == "COLLEGE");

        Ok(Some(MajorAudit { major, college }))
    }

    async fn minor_audit(&self, minor_code: &str) -> Result<Option<Block>, AuditError> {
        let goals = vec![
            Goal::new(GoalCode::Major, NO_MAJOR),
            Goal::new(GoalCode::Minor, minor_code),
        ];
        let blocks = self.audit("BA", "U", goals).await?;
        Ok(blocks.and_then(|mut blocks| take_block(&mut blocks, "MINOR", minor_code)))
    }

    async fn spec_audit(
        &self,
        parent: &ProgramIdentity,
        spec_code: &str,
    ) -> Result<Option<Block>, AuditError> {
        let goals = vec![
            Goal::new(GoalCode::Major, &parent.major_code),
            Goal::new(GoalCode::Spec, spec_code),
        ];
        let blocks = self.audit(&parent.degree, &parent.school, goals).await?;
        Ok(blocks.and_then(|mut blocks| take_block(&mut blocks, "SPEC", spec_code)))
    }

    async fn mapping(&self, vocabulary: Vocabulary) -> Result<CodeMap, AuditError> {
        let collection = vocabulary.collection();
        let url = self.url(&format!("validations/special-entities/{}", collection))?;
        let response = self
            .execute("mapping", Request::Get(url))
            .await?
            .ok_or_else(|| AuditError::Parse(format!("No response body for {}", collection)))?;

        let entries = response
            .get("_embedded")
            .and_then(|embedded| embedded.get(collection))
            .cloned()
            .ok_or_else(|| AuditError::Parse(format!("Missing _embedded.{}", collection)))?;
        let entries: Vec<VocabularyEntry> =
            serde_json::from_value(entries).map_err(|e| AuditError::Parse(e.to_string()))?;

        let map: CodeMap = entries
            .into_iter()
            .map(|entry| (entry.key, entry.description))
            .collect();

        tracing::info!(vocabulary = collection, entries = map.len(), "Fetched vocabulary");
        Ok(map)
    }
}
