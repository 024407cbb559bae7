//! HTTP-backed reference implementations of the collaborator contracts.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{EmbeddingClient, ToolInvoker, ToolOutcome};
use crate::error::EngineError;

/// Client for an OpenAI-compatible embeddings endpoint.
pub struct HttpEmbeddingClient {
    client: Client,
    base_url: String,
}

/// Request payload for the embeddings endpoint.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response from the embeddings endpoint.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

impl HttpEmbeddingClient {
    /// Create a new embedding client.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>, EngineError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        debug!(model, payload_count = texts.len(), "requesting embeddings");

        let response = self
            .client
            .post(&url)
            .json(&EmbeddingsRequest { model, input: texts })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::ExternalService(format!(
                "embedding service returned {}: {}",
                status, text
            )));
        }

        let body: EmbeddingsResponse = response.json().await?;
        info!(model, vector_count = body.data.len(), "embeddings ready");
        Ok(body.data.into_iter().map(|row| row.embedding).collect())
    }
}

/// Client for a JSON tool-invocation endpoint.
pub struct HttpToolInvoker {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ToolResponse {
    policy: Option<String>,
    #[serde(default)]
    reason: String,
}

impl HttpToolInvoker {
    /// Create a new tool invoker.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ToolInvoker for HttpToolInvoker {
    async fn call(&self, tool: &str, args: Value) -> Result<ToolOutcome, EngineError> {
        let url = format!("{}/tools/{}", self.base_url, tool);
        debug!(tool, "invoking tool");

        let response = self.client.post(&url).json(&args).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(EngineError::ExternalService(format!(
                "tool service returned {} for {}",
                status, tool
            )));
        }

        let body: ToolResponse = response.json().await?;
        info!(tool, policy = body.policy.as_deref(), "tool responded");
        Ok(ToolOutcome {
            policy: body.policy,
            reason: body.reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = HttpEmbeddingClient::new("http://localhost:3018/");
        assert_eq!(client.base_url, "http://localhost:3018");

        let invoker = HttpToolInvoker::new("http://localhost:4020");
        assert_eq!(invoker.base_url, "http://localhost:4020");
    }
}
