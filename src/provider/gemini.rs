//! Gemini `generateContent` client

use super::{FeedbackProvider, ProviderError, ProviderResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Environment variable holding the Gemini API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Secondary variable consulted when `GEMINI_API_KEY` is unset
pub const API_KEY_FALLBACK_ENV: &str = "API_KEY";

/// Connection settings for the Gemini API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.5,
        }
    }
}

/// Provider backed by the Gemini HTTP API.
///
/// A missing API key is not an error at construction; every call fails with
/// `MissingCredential` instead, so the session can still start and report it.
pub struct GeminiProvider {
    client: reqwest::Client,
    config: GeminiConfig,
    api_key: Option<String>,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Read the API key from `GEMINI_API_KEY`, falling back to `API_KEY`.
    pub fn from_env(config: GeminiConfig) -> Self {
        let api_key = std::env::var(API_KEY_ENV)
            .or_else(|_| std::env::var(API_KEY_FALLBACK_ENV))
            .ok();
        Self::new(config, api_key)
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request_body(&self, prompt: &str) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                temperature: self.config.temperature,
            },
        }
    }
}

#[async_trait]
impl FeedbackProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> ProviderResult<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            ProviderError::MissingCredential(format!(
                "set {} (or {}) to enable live analysis",
                API_KEY_ENV, API_KEY_FALLBACK_ENV
            ))
        })?;

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&self.build_request_body(prompt))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        match status {
            200 => extract_text(&body),
            401 | 403 => Err(ProviderError::MissingCredential(format!(
                "gemini rejected the API key (HTTP {})",
                status
            ))),
            _ => Err(ProviderError::Http { status, body }),
        }
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(body: &str) -> ProviderResult<String> {
    let envelope: GenerateResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    let text: String = envelope
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    Ok(text)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}
