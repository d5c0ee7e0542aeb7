use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::{RelationSource, RelationshipTuple};
use crate::error::{RelgraphError, Result};

/// Client for the triple-pattern relation API
///
/// Issues `GET {base}?subject=..&predicate=..&object=..` and expects a JSON
/// array of relationship tuples. Every request is bounded by a hard timeout.
pub struct HttpRelationClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpRelationClient {
    /// Create a new relation client
    ///
    /// # Arguments
    ///
    /// * `base_url` - Query endpoint, e.g. `https://host/query`
    /// * `timeout` - Per-request deadline covering connect, headers and body
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| RelgraphError::Config(format!("Invalid base URL {}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelgraphError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Build the request URL; all three parameters are always present and encoded.
    fn query_url(&self, subject: &str, predicate: &str, object: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("subject", subject)
            .append_pair("predicate", predicate)
            .append_pair("object", object);
        url
    }

    async fn fetch(&self, url: Url) -> Result<Vec<RelationshipTuple>> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RelgraphError::Upstream(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelgraphError::Upstream(format!("API error {}", status)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.contains("application/json") {
            return Err(RelgraphError::Upstream(format!(
                "Unexpected content type: {:?}",
                content_type
            )));
        }

        response
            .json::<Vec<RelationshipTuple>>()
            .await
            .map_err(|e| RelgraphError::Upstream(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl RelationSource for HttpRelationClient {
    async fn query(
        &self,
        subject: &str,
        predicate: &str,
        object: &str,
    ) -> Result<Vec<RelationshipTuple>> {
        if subject.is_empty() && object.is_empty() {
            return Err(RelgraphError::InvalidInput(
                "subject and object cannot both be wildcards".to_string(),
            ));
        }

        let url = self.query_url(subject, predicate, object);
        log::debug!("Relation query: {}", url);
        let start = std::time::Instant::now();

        let tuples = tokio::time::timeout(self.timeout, self.fetch(url))
            .await
            .map_err(|_| {
                RelgraphError::Upstream(format!("Request timed out after {:?}", self.timeout))
            })??;

        log::debug!(
            "Relation query returned {} tuples in {:?}",
            tuples.len(),
            start.elapsed()
        );
        Ok(tuples)
    }
}
