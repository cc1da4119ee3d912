//! Tiered summarizer
//!
//! Tries each configured generative backend once, in priority order, and
//! falls through to the local extractive summary when all of them fail:
//! 1. Gemini (`generateContent`)
//! 2. Groq (OpenAI-compatible chat completions)
//! 3. Extractive (no network, cannot fail)
//!
//! Backends are never retried and results are never cached. Each call is
//! bounded by the backend's own request timeout.

mod backend;
mod extractive;
mod gemini;
mod groq;

pub use backend::{BackendError, SummaryBackend};
pub use extractive::extractive_summary;
pub use gemini::GeminiBackend;
pub use groq::GroqBackend;

use crate::config::SummarizerConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fixed input used by the health probe
const PROBE_TEXT: &str = "This is a test message to check if AI summarization is working properly.";

/// Which tier produced a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMethod {
    /// A hosted generative backend, by name
    Backend(&'static str),
    /// The local extractive fallback
    Extractive,
}

impl SummaryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryMethod::Backend(name) => *name,
            SummaryMethod::Extractive => "extractive",
        }
    }
}

impl fmt::Display for SummaryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SummaryMethod {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A generated summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub text: String,
    pub method: SummaryMethod,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackendStatus {
    pub name: &'static str,
    pub configured: bool,
}

/// Result of the summarizer health probe
#[derive(Debug, Clone, Serialize)]
pub struct SummarizerHealth {
    pub backends: Vec<BackendStatus>,
    pub working: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<SummaryMethod>,
}

/// Ordered fallback chain ending in the extractive tier
pub struct Summarizer {
    backends: Vec<Arc<dyn SummaryBackend>>,
    min_input_chars: usize,
}

impl Summarizer {
    /// Create a summarizer over `backends`, tried in order
    pub fn new(backends: Vec<Arc<dyn SummaryBackend>>, min_input_chars: usize) -> Self {
        Self {
            backends,
            min_input_chars,
        }
    }

    /// Gemini, then Groq, then extractive
    pub fn from_config(config: &SummarizerConfig) -> Result<Self> {
        let gemini = GeminiBackend::new(config.gemini.clone())?;
        let groq = GroqBackend::new(config.groq.clone())?;

        let backends: Vec<Arc<dyn SummaryBackend>> = vec![Arc::new(gemini), Arc::new(groq)];
        let summarizer = Self::new(backends, config.min_input_chars);

        for status in summarizer.backend_statuses() {
            if !status.configured {
                warn!(backend = status.name, "Summary backend has no API key, it will be skipped at call time");
            }
        }

        Ok(summarizer)
    }

    /// Only the extractive tier
    pub fn extractive_only(min_input_chars: usize) -> Self {
        Self::new(Vec::new(), min_input_chars)
    }

    pub fn min_input_chars(&self) -> usize {
        self.min_input_chars
    }

    /// Reject text that is too short to summarize
    pub fn check_input(&self, text: &str) -> Result<()> {
        let len = text.trim().chars().count();
        if len < self.min_input_chars {
            return Err(AppError::InputTooShort {
                len,
                min: self.min_input_chars,
            });
        }
        Ok(())
    }

    /// Summarize `text`, falling through the chain on any backend failure
    pub async fn summarize(&self, text: &str) -> Result<Summary> {
        self.check_input(text)?;

        for backend in &self.backends {
            let name = backend.name();
            let start = Instant::now();

            match backend.summarize(text).await {
                Ok(summary) => {
                    metrics::record_summary_attempt(name, "success", start.elapsed().as_secs_f64());
                    info!(backend = name, chars = summary.chars().count(), "Summary generated");
                    return Ok(Summary {
                        text: summary,
                        method: SummaryMethod::Backend(name),
                    });
                }
                Err(e) => {
                    metrics::record_summary_attempt(name, e.kind(), start.elapsed().as_secs_f64());
                    warn!(backend = name, error = %e, "Summary backend failed, falling through");
                }
            }
        }

        let start = Instant::now();
        let summary = extractive_summary(text);
        let outcome = if summary.trim().is_empty() { "empty" } else { "success" };
        metrics::record_summary_attempt("extractive", outcome, start.elapsed().as_secs_f64());

        if summary.trim().is_empty() {
            return Err(AppError::SummarizerExhausted);
        }

        debug!(chars = summary.chars().count(), "Using extractive summary");
        Ok(Summary {
            text: summary,
            method: SummaryMethod::Extractive,
        })
    }

    pub fn backend_statuses(&self) -> Vec<BackendStatus> {
        self.backends
            .iter()
            .map(|b| BackendStatus {
                name: b.name(),
                configured: b.is_configured(),
            })
            .collect()
    }

    /// Report configured backends and run one probe summary through the chain
    pub async fn health(&self) -> SummarizerHealth {
        let (working, method) = match self.summarize(PROBE_TEXT).await {
            Ok(summary) => (true, Some(summary.method)),
            Err(e) => {
                warn!(error = %e, "Summarizer health probe failed");
                (false, None)
            }
        };

        SummarizerHealth {
            backends: self.backend_statuses(),
            working,
            method,
        }
    }
}
