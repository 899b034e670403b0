//! Feedback synthesis
//!
//! Turns a product name and plan tier into a list of `Issue` records:
//! build a tier-scoped prompt, call the provider, validate the JSON response,
//! then canonicalize source types and URLs, filter to the tier's vocabulary
//! and synthesize occurrence statistics.

mod classify;
mod occurrence;
mod prompt;
mod response;
mod synthesizer;
mod urls;

pub use classify::{classify_source_type, match_source_type, DEFAULT_SOURCE_TYPE};
pub use occurrence::synthesize_occurrences;
pub use prompt::build_prompt;
pub use response::{parse_response, strip_code_fence, RawIssue, RawSource};
pub use synthesizer::{FeedbackSynthesizer, LAST_DETECTED_SPAN_DAYS};
pub use urls::{canonicalize_url, generate_url, matches_template, product_slug};

use crate::provider::ProviderError;

/// Errors from synthesis. Display strings are the user-facing messages.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("Live analysis unavailable: {0}")]
    Configuration(String),

    #[error("Holmes had trouble understanding the intel (AI response format issue). Please try again. Details: {0}")]
    ResponseFormat(String),

    #[error("Holmes encountered an unexpected snag while investigating \"{product}\". Please try again. If the problem persists, contact support.")]
    Provider {
        product: String,
        #[source]
        source: ProviderError,
    },
}

pub type SynthesisResult<T> = Result<T, SynthesisError>;

impl SynthesisError {
    /// Classify a provider failure for `product`.
    pub fn from_provider(product: &str, error: ProviderError) -> Self {
        match error {
            ProviderError::MissingCredential(detail) => Self::Configuration(detail),
            other => Self::Provider {
                product: product.to_string(),
                source: other,
            },
        }
    }
}
