use std::time::Duration;

use async_trait::async_trait;
use billchat_core::config::LlmConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("language model request failed: {0}")]
    Transport(String),
    #[error("language model returned status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("language model response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self { temperature: 0.3, top_p: 0.9 }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Non-streaming client for Ollama's `/api/generate` endpoint.
pub struct OllamaClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    options: SamplingOptions,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        options: SamplingOptions,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| LlmError::Transport(error.to_string()))?;
        Ok(Self { http_client, base_url: base_url.into(), model: model.into(), options })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(
            config.base_url.clone(),
            config.model.clone(),
            SamplingOptions { temperature: config.temperature, top_p: config.top_p },
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    /// Probes the model listing endpoint.
    pub async fn is_available(&self) -> bool {
        match self.http_client.get(self.url("api/tags")).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request =
            GenerateRequest { model: &self.model, prompt, stream: false, options: self.options };

        debug!(
            event_name = "agent.llm.request",
            model = %self.model,
            prompt_chars = prompt.len(),
            "sending completion request"
        );

        let response = self
            .http_client
            .post(self.url("api/generate"))
            .json(&request)
            .send()
            .await
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status: status.as_u16(), detail });
        }

        let body: GenerateResponse =
            response.json().await.map_err(|error| LlmError::Decode(error.to_string()))?;

        debug!(
            event_name = "agent.llm.response",
            model = %self.model,
            response_chars = body.response.len(),
            "received completion"
        );
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{GenerateRequest, OllamaClient, SamplingOptions};

    #[test]
    fn generate_request_matches_ollama_contract() {
        let request = GenerateRequest {
            model: "llama3:latest",
            prompt: "hi",
            stream: false,
            options: SamplingOptions::default(),
        };
        let json = serde_json::to_value(&request).expect("json");

        assert_eq!(json["model"], "llama3:latest");
        assert_eq!(json["stream"], false);
        let temperature = json["options"]["temperature"].as_f64().expect("temperature");
        let top_p = json["options"]["top_p"].as_f64().expect("top_p");
        assert!((temperature - 0.3).abs() < 1e-6);
        assert!((top_p - 0.9).abs() < 1e-6);
    }

    #[test]
    fn url_trims_trailing_slash() {
        let client = OllamaClient::new(
            "http://localhost:11434/",
            "llama3:latest",
            SamplingOptions::default(),
            Duration::from_secs(1),
        )
        .expect("client");
        assert_eq!(client.url("api/generate"), "http://localhost:11434/api/generate");
    }
}
