use crate::retry::{Attempt, RetryPolicy};
use crate::schema::{Extraction, ExtractionEnvelope};
use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use tracing::debug;

/// Reads finished extractions from the extraction backend.
#[derive(Clone)]
pub struct ExtractionClient {
    base_url: String,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl ExtractionClient {
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn extraction_url(&self, id: &str) -> String {
        format!("{}/api/extractions/{}", self.base_url, id)
    }

    /// `GET /api/extractions/:id`. Transport errors and 5xx are retried; any
    /// other non-success status fails immediately. `Ok(None)` when the backend
    /// does not know the id.
    pub async fn fetch(&self, id: &str) -> Result<Option<Extraction>> {
        let url = self.extraction_url(id);
        debug!(url = %url, "Fetching extraction");

        let response = self
            .retry
            .retry("fetch_extraction", || async {
                match self.client.get(&url).send().await {
                    Ok(resp) if resp.status().is_success() => Attempt::Done(Some(resp)),
                    Ok(resp) if resp.status() == StatusCode::NOT_FOUND => Attempt::Done(None),
                    Ok(resp) if resp.status().is_server_error() => {
                        Attempt::Retry(anyhow!("Extraction backend returned {}", resp.status()))
                    }
                    Ok(resp) => {
                        Attempt::Fatal(anyhow!("Extraction request failed: {}", resp.status()))
                    }
                    Err(e) => Attempt::Retry(
                        anyhow::Error::new(e).context("Failed to reach extraction backend"),
                    ),
                }
            })
            .await?;

        let Some(response) = response else {
            debug!(id = id, "Extraction not found on backend");
            return Ok(None);
        };

        let envelope: ExtractionEnvelope = response
            .json()
            .await
            .context("Failed to parse extraction response")?;

        Ok(Some(envelope.extraction))
    }
}
