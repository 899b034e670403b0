use crate::model::InstanceId;
use crate::storage::StorageError;
use crate::synthesis::SynthesisError;
use chrono::{DateTime, Utc};

/// Errors surfaced by [`AnalysisCoordinator`](super::AnalysisCoordinator).
///
/// Display strings are user-facing; the same text is recorded on the
/// instance's error field for the matching analysis kind.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Provider credential absent; retrying cannot help
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    ResponseFormat(String),

    #[error("{message}")]
    QuotaExceeded {
        message: String,
        next_available: Option<DateTime<Utc>>,
    },

    #[error("{0}")]
    Provider(String),

    #[error("Upgrade to Max Tier for competitor analysis.")]
    UpgradeRequired,

    #[error("Please analyze a primary product first.")]
    NoPrimaryInstance,

    #[error("Instance not found: {0}")]
    InstanceNotFound(InstanceId),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

impl From<SynthesisError> for AnalysisError {
    fn from(e: SynthesisError) -> Self {
        let message = e.to_string();
        match e {
            SynthesisError::Configuration(_) => Self::Configuration(message),
            SynthesisError::ResponseFormat(_) => Self::ResponseFormat(message),
            SynthesisError::Provider { .. } => Self::Provider(message),
        }
    }
}
