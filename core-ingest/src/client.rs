//! Knowledge-store REST client.
//!
//! Implements the two-phase ingestion protocol: `register_content`
//! reserves a slot and returns a pre-authenticated write URL,
//! `finalize_content` commits it after the upload. `delete_content`
//! removes finalized content and orphaned registrations alike, which
//! is what the pipeline's compensating rollback relies on.

use async_trait::async_trait;
use connector_traits::{
    ConnectorError, FinalizationRequest, HttpMethod, HttpRequest, KnowledgeStore, ManifestEntry,
    RegisteredContent, RegistrationRequest, Result,
};
use core_http::{RateLimiter, ResilientClient};
use serde::Deserialize;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct IngestClientConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
struct ManifestResponse {
    #[serde(default)]
    entries: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct FinalizeResponse {
    id: String,
}

pub struct IngestClient {
    client: ResilientClient,
    limiter: RateLimiter,
    config: IngestClientConfig,
}

impl IngestClient {
    pub fn new(client: ResilientClient, limiter: RateLimiter, config: IngestClientConfig) -> Self {
        Self {
            client,
            limiter,
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl KnowledgeStore for IngestClient {
    #[instrument(skip(self))]
    async fn fetch_manifest(&self, source_name: &str) -> Result<Vec<ManifestEntry>> {
        let request = HttpRequest::new(
            HttpMethod::Get,
            format!(
                "{}?source={}",
                self.url("/v1/content/manifest"),
                urlencoding::encode(source_name)
            ),
        );
        let manifest: ManifestResponse = self
            .limiter
            .schedule(self.client.execute_json(request))
            .await?;
        debug!(entries = manifest.entries.len(), "Fetched manifest");
        Ok(manifest.entries)
    }

    #[instrument(skip(self, request), fields(key = %request.key))]
    async fn register_content(&self, request: &RegistrationRequest) -> Result<RegisteredContent> {
        let http_request =
            HttpRequest::new(HttpMethod::Post, self.url("/v1/content")).json(request)?;
        let registered: RegisteredContent = self
            .limiter
            .schedule(self.client.execute_json(http_request))
            .await?;
        debug!(content_id = %registered.id, "Registered content");
        Ok(registered)
    }

    #[instrument(skip(self, request), fields(key = %request.key, content_id = %request.content_id))]
    async fn finalize_content(&self, request: &FinalizationRequest) -> Result<String> {
        let http_request = HttpRequest::new(
            HttpMethod::Post,
            self.url(&format!(
                "/v1/content/{}/finalize",
                urlencoding::encode(&request.content_id)
            )),
        )
        .json(request)?;
        let finalized: FinalizeResponse = self
            .limiter
            .schedule(self.client.execute_json(http_request))
            .await?;
        debug!(content_id = %finalized.id, "Finalized content");
        Ok(finalized.id)
    }

    #[instrument(skip(self))]
    async fn delete_content(&self, content_id: &str) -> Result<()> {
        let request = HttpRequest::new(
            HttpMethod::Delete,
            self.url(&format!(
                "/v1/content/{}",
                urlencoding::encode(content_id)
            )),
        );
        let response = self.limiter.schedule(self.client.execute(request)).await?;
        // Already-gone content is a success for every caller we have.
        if response.status == 404 || response.is_success() {
            return Ok(());
        }
        Err(response.into_status_error())
    }
}
