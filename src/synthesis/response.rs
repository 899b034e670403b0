//! Provider response parsing and validation
//!
//! The response must be a JSON array of issue objects, optionally wrapped in a
//! markdown code fence. Validation is all-or-nothing: one bad element rejects
//! the whole response.

use super::{SynthesisError, SynthesisResult};
use regex_lite::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// One issue as the provider reports it, before canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawIssue {
    pub description: String,
    pub category: String,
    pub sources: Vec<RawSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub url: String,
    pub title: String,
}

/// Remove one surrounding ``` or ```json fence, if present.
pub fn strip_code_fence(text: &str) -> &str {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```(?:json)?\s*\n?(.*?)\n?\s*```\s*$")
            .expect("fence regex compiles")
    });

    match fence.captures(text).and_then(|caps| caps.get(1)) {
        Some(inner) if !inner.as_str().trim().is_empty() => inner.as_str().trim(),
        _ => text.trim(),
    }
}

fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}

fn validate_url(url: &str) -> Result<(), String> {
    let parsed = url::Url::parse(url).map_err(|e| format!("invalid source url '{}': {}", url, e))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(()),
        _ => Err(format!("source url '{}' is not an absolute http(s) url", url)),
    }
}

/// Parse and validate a raw provider response.
pub fn parse_response(text: &str) -> SynthesisResult<Vec<RawIssue>> {
    let body = strip_code_fence(text);

    let issues: Vec<RawIssue> = serde_json::from_str(body).map_err(|e| {
        SynthesisError::ResponseFormat(format!(
            "AI response JSON structure is invalid or incomplete ({}). Content preview: {}...",
            e,
            preview(text)
        ))
    })?;

    for issue in &issues {
        for source in &issue.sources {
            validate_url(&source.url).map_err(SynthesisError::ResponseFormat)?;
        }
    }

    Ok(issues)
}
