//! Catalog-of-record API client
//!
//! The audit system cannot list its programs, so discovery cross-references
//! this independent catalog. Two endpoints are used: the award-type lookup
//! and the report search over every major/degree record.

use crate::error::AuditError;
use crate::types::{CatalogApi, CatalogReportEntry, CodeMap};
use crate::utils::{retry_transient, RateLimiter, RetryPolicy};
use audit_common::ScraperConfig;
use serde::Deserialize;
use serde_json::{json, Value};

const USER_AGENT: &str = concat!("degree-audit-scraper/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct AwardType {
    code: String,
    #[serde(default)]
    description: String,
}

/// Report search filter: every flag off, i.e. no narrowing at all
fn broad_search_filter() -> Value {
    json!({
        "schoolCode": null,
        "majorCode": null,
        "degreeCode": null,
        "includeInactive": true,
        "onlyActive": false,
        "onlyOnline": false,
        "onlySelfSupported": false,
        "onlyImpacted": false,
        "onlyHonors": false
    })
}

/// Catalog API client
pub struct CatalogClient {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: RateLimiter,
    retry: RetryPolicy,
}

impl CatalogClient {
    pub fn new(config: &ScraperConfig) -> Result<Self, AuditError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AuditError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.catalog_base_url.clone(),
            rate_limiter: RateLimiter::new(config.request_delay),
            retry: RetryPolicy::new(config.max_retries),
        })
    }

    async fn send_once<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, AuditError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuditError::Api(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| AuditError::Parse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl CatalogApi for CatalogClient {
    async fn award_types(&self) -> Result<CodeMap, AuditError> {
        let url = format!("{}/lookups/awardTypes", self.base_url);
        let award_types: Vec<AwardType> = retry_transient("award_types", self.retry, || {
            self.rate_limiter
                .run(|| self.send_once(self.http_client.get(&url)))
        })
        .await?;

        tracing::info!(count = award_types.len(), "Fetched award types");
        Ok(award_types
            .into_iter()
            .map(|award| (award.code, award.description))
            .collect())
    }

    async fn report_search(&self) -> Result<Vec<CatalogReportEntry>, AuditError> {
        let url = format!("{}/reports/search", self.base_url);
        let filter = broad_search_filter();
        let entries: Vec<CatalogReportEntry> = retry_transient("report_search", self.retry, || {
            self.rate_limiter
                .run(|| self.send_once(self.http_client.post(&url).json(&filter)))
        })
        .await?;

        tracing::info!(count = entries.len(), "Fetched catalog report");
        Ok(entries)
    }
}
