//! Answer generation through the Ollama chat API.
//!
//! [`OllamaChat`] posts a single non-streaming `/api/chat` request per
//! question. Generation stays deliberately tight for the QA task: near-zero
//! temperature and answers capped at 256 tokens.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::time::Duration;

use crate::config::OllamaConfig;

const TEMPERATURE: f64 = 0.01;
const NUM_PREDICT: u32 = 256;

const QA_PROMPT: &str = "You are an assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, just say that you don't know. \
Use three sentences maximum and keep the answer concise.\n\
Question: {question} \n\
Context: {context} \n\
Answer:";

/// Fill the QA template. Retrieved texts join with blank lines so section
/// boundaries stay visible to the model.
pub fn qa_prompt(question: &str, contexts: &[String]) -> String {
    let context = contexts.join("\n\n");
    QA_PROMPT
        .replace("{question}", question)
        .replace("{context}", &context)
}

/// Chat client for the Ollama `/api/chat` endpoint.
pub struct OllamaChat {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaChat {
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            model: config.chat_model.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Send one prompt, get one answer.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
            "options": {
                "temperature": TEMPERATURE,
                "num_predict": NUM_PREDICT,
            },
        });

        let response = self
            .client
            .post(format!("{}/api/chat", self.url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach Ollama at {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Ollama API error {}: {}", status, body_text);
        }

        let json: Value = response.json().await?;
        parse_chat_response(&json)
    }
}

fn parse_chat_response(json: &Value) -> Result<String> {
    json.get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing message content"))
}
