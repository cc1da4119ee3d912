//! Generative backend abstraction

use async_trait::async_trait;
use thiserror::Error;

/// Instruction shared by every generative backend
pub(crate) const SUMMARY_INSTRUCTION: &str =
    "Please provide a concise summary of the following voice note in 2-3 sentences. \
     Focus on the main points and key information:";

/// Why a generative backend could not produce a summary.
///
/// Never leaves the summarizer: every variant only drives fallthrough
/// to the next tier.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{backend} API key not configured")]
    MissingCredential { backend: &'static str },

    #[error("{backend} request timed out")]
    Timeout { backend: &'static str },

    #[error("{backend} request failed: {source}")]
    Request {
        backend: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{backend} API error {status}: {body}")]
    Status {
        backend: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {backend} API: {message}")]
    MalformedResponse {
        backend: &'static str,
        message: String,
    },
}

impl BackendError {
    /// Classify a transport failure
    pub(crate) fn from_reqwest(backend: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout { backend }
        } else if err.is_decode() {
            BackendError::MalformedResponse {
                backend,
                message: err.to_string(),
            }
        } else {
            BackendError::Request { backend, source: err }
        }
    }

    /// Short label used in metrics
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::MissingCredential { .. } => "missing_credential",
            BackendError::Timeout { .. } => "timeout",
            BackendError::Request { .. } => "request",
            BackendError::Status { .. } => "status",
            BackendError::MalformedResponse { .. } => "malformed_response",
        }
    }
}

/// A hosted generative summarization service
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    /// Stable backend name, used for logs and metrics
    fn name(&self) -> &'static str;

    /// Whether a credential is present
    fn is_configured(&self) -> bool;

    /// Produce a short summary of `text`. Returned text is trimmed and non-empty.
    async fn summarize(&self, text: &str) -> Result<String, BackendError>;
}

/// Build the user prompt for `text`
pub(crate) fn summary_prompt(text: &str) -> String {
    format!("{}\n\n\"{}\"", SUMMARY_INSTRUCTION, text)
}

/// Reject blank completions
pub(crate) fn non_empty(backend: &'static str, text: Option<&str>) -> Result<String, BackendError> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| BackendError::MalformedResponse {
            backend,
            message: "no summary text in response".to_string(),
        })
}
