use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::runtime::Runtime;

use super::{GenerationError, TextGenerator};
use crate::config::SummaryConfig;

/// Synchronous wrapper around the Gemini `generateContent` REST API so the
/// calculation path stays free of async plumbing. Each request carries the
/// configured timeout; there are no retries.
pub struct GeminiClient {
    http: reqwest::Client,
    runtime: Runtime,
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(config: &SummaryConfig) -> Result<Self, GenerationError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| GenerationError::Transport(err.to_string()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            runtime,
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            timeout: config.request_timeout,
        })
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredentials)?;

        let body = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });
        let url = format!("{}?key={}", self.endpoint, api_key);

        let response = self
            .runtime
            .block_on(async { self.http.post(&url).json(&body).timeout(self.timeout).send().await })
            .map_err(|err| {
                if err.is_timeout() {
                    GenerationError::Timeout(self.timeout)
                } else {
                    GenerationError::Transport(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Transport(format!(
                "unexpected status {status}"
            )));
        }

        let payload: GenerateContentResponse = self
            .runtime
            .block_on(async { response.json().await })
            .map_err(|_| GenerationError::MalformedResponse)?;

        payload
            .first_text()
            .ok_or(GenerationError::MalformedResponse)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .find_map(|part| part.text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}
