//! Ollama Backend Implementation
//!
//! Generator for Ollama (local LLM server). Uses the `/api/generate`
//! endpoint in streaming mode: the response body is newline-delimited JSON,
//! one object per token, the last one carrying `"done": true`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::Deserialize;

use super::traits::{GenerationRequest, TokenGenerator};
use crate::hooks::GenerationHooks;

/// Default Ollama host
pub const DEFAULT_HOST: &str = "localhost";

/// Default Ollama port
pub const DEFAULT_PORT: u16 = 11434;

/// One line of Ollama's streaming response
#[derive(Debug, Deserialize, PartialEq)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Ollama backend client
#[derive(Clone, Debug)]
pub struct OllamaBackend {
    /// Host address
    host: String,
    /// Port number
    port: u16,
    /// HTTP client
    http_client: reqwest::Client,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(host: impl Into<String>, port: u16) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            host: host.into(),
            port,
            http_client,
        })
    }

    /// Create from `OLLAMA_HOST` / `OLLAMA_PORT`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self::new(host, port)
    }

    /// Get the base URL
    fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Get generate endpoint URL
    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url())
    }

    /// Get tags endpoint URL
    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url())
    }

    /// JSON body for a streaming generate call
    fn request_body(request: &GenerationRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "prompt": request.full_prompt(),
            "stream": true,
        });

        let mut options = serde_json::Map::new();
        if (request.temperature - 0.7).abs() > f32::EPSILON {
            options.insert("temperature".to_string(), request.temperature.into());
        }
        if request.max_tokens > 0 {
            options.insert("num_predict".to_string(), request.max_tokens.into());
        }
        if !options.is_empty() {
            body["options"] = serde_json::Value::Object(options);
        }

        body
    }
}

/// Parse one NDJSON line; blank lines yield `None`
fn parse_line(line: &str) -> anyhow::Result<Option<GenerateChunk>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let chunk: GenerateChunk =
        serde_json::from_str(line).with_context(|| format!("malformed stream line: {line}"))?;
    if let Some(error) = chunk.error {
        anyhow::bail!("Ollama error: {error}");
    }
    Ok(Some(chunk))
}

#[async_trait]
impl TokenGenerator for OllamaBackend {
    fn name(&self) -> &'static str {
        "Ollama"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.tags_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok()
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        hooks: &dyn GenerationHooks,
    ) -> anyhow::Result<String> {
        let response = self
            .http_client
            .post(self.generate_url())
            .json(&Self::request_body(request))
            .send()
            .await
            .context("failed to reach Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {status}: {body}");
        }

        read_ndjson(response.bytes_stream(), hooks).await
    }
}

/// Read a streamed NDJSON body, reporting each response fragment as a token
///
/// Lines are assembled from raw bytes, since a network chunk may end in the
/// middle of a line or of a multi-byte character. Returns the full response.
async fn read_ndjson<S, B, E>(body: S, hooks: &dyn GenerationHooks) -> anyhow::Result<String>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut body = std::pin::pin!(body);
    let mut buffer: Vec<u8> = Vec::new();
    let mut full_response = String::new();

    while let Some(chunk) = body.next().await {
        let bytes = chunk.context("stream interrupted")?;
        buffer.extend_from_slice(bytes.as_ref());

        while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=pos).collect();
            if let Some(chunk) = parse_line(&String::from_utf8_lossy(&line))? {
                if !chunk.response.is_empty() {
                    hooks.on_token(&chunk.response);
                    full_response.push_str(&chunk.response);
                }
                if chunk.done {
                    return Ok(full_response);
                }
            }
        }
    }

    // Body ended without a trailing newline or done flag
    if let Some(chunk) = parse_line(&String::from_utf8_lossy(&buffer))? {
        if !chunk.response.is_empty() {
            hooks.on_token(&chunk.response);
            full_response.push_str(&chunk.response);
        }
    }

    Ok(full_response)
}
