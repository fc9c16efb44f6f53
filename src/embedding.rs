//! Embedding backend abstraction and the Ollama implementation.
//!
//! The [`Embedder`] trait is consumed by the Chroma store adapter, which
//! owns embedding computation: segment texts go in, vectors come out, and
//! nothing outside the adapter ever sees a vector.
//!
//! [`OllamaEmbedder`] calls `POST /api/embed` on a local Ollama server.
//! There is no retry here; calls carry the configured timeout and failures
//! propagate to the caller.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::OllamaConfig;

/// Turns text into embedding vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier, for reporting.
    fn model_name(&self) -> &str;

    /// Embed a batch of texts. Output order matches input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embedding client for the Ollama `/api/embed` endpoint.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            model: config.embedding_model.clone(),
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(format!("{}/api/embed", self.url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach Ollama at {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Ollama API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_embed_response(&json, texts.len())
    }
}

/// Parse the `/api/embed` response: `{"embeddings": [[f32, ...], ...]}`.
fn parse_embed_response(json: &serde_json::Value, expected: usize) -> Result<Vec<Vec<f32>>> {
    let rows = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing embeddings array"))?;

    if rows.len() != expected {
        bail!(
            "Invalid Ollama response: expected {} embeddings, got {}",
            expected,
            rows.len()
        );
    }

    let mut embeddings = Vec::with_capacity(rows.len());
    for row in rows {
        let values = row
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: embedding is not an array"))?;
        let vec: Vec<f32> = values
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        embeddings.push(vec);
    }

    Ok(embeddings)
}
