//! Summary state machine
//!
//! ```text
//!            create
//!              │
//!              ▼
//!         NoSummary ──summarize──▶ Fresh
//!              │                  │  ▲
//!            edit               edit │
//!              ▼                  ▼  │
//!            Stale ◀──────────────┘  │
//!              └──────summarize──────┘
//! ```
//!
//! Summarizing is refused only from `Fresh`. Any transcript change moves
//! to `Stale` and drops the summary.

use thiserror::Error;

/// Where a note's summary stands relative to its transcript
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SummaryState {
    /// Never summarized
    #[default]
    NoSummary,
    /// Summary generated from the current transcript
    Fresh { summary: String },
    /// Transcript changed since creation or since the last summary
    Stale,
}

/// Stored state/summary combination that cannot occur
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InvalidSummaryState {
    #[error("unknown summary state '{0}'")]
    UnknownTag(String),

    #[error("fresh summary state with empty summary")]
    FreshWithoutSummary,

    #[error("summary text present in '{0}' state")]
    OrphanSummary(&'static str),
}

impl SummaryState {
    pub const NO_SUMMARY: &'static str = "no_summary";
    pub const FRESH: &'static str = "fresh";
    pub const STALE: &'static str = "stale";

    /// Rebuild a state from its stored tag and summary text
    pub fn from_parts(tag: &str, summary: String) -> Result<Self, InvalidSummaryState> {
        match tag {
            Self::FRESH if summary.trim().is_empty() => Err(InvalidSummaryState::FreshWithoutSummary),
            Self::FRESH => Ok(SummaryState::Fresh { summary }),
            Self::NO_SUMMARY if !summary.is_empty() => Err(InvalidSummaryState::OrphanSummary(Self::NO_SUMMARY)),
            Self::NO_SUMMARY => Ok(SummaryState::NoSummary),
            Self::STALE if !summary.is_empty() => Err(InvalidSummaryState::OrphanSummary(Self::STALE)),
            Self::STALE => Ok(SummaryState::Stale),
            other => Err(InvalidSummaryState::UnknownTag(other.to_string())),
        }
    }

    /// Stored tag for this state
    pub fn tag(&self) -> &'static str {
        match self {
            SummaryState::NoSummary => Self::NO_SUMMARY,
            SummaryState::Fresh { .. } => Self::FRESH,
            SummaryState::Stale => Self::STALE,
        }
    }

    pub fn has_summary(&self) -> bool {
        matches!(self, SummaryState::Fresh { .. })
    }

    pub fn is_edited(&self) -> bool {
        matches!(self, SummaryState::Stale)
    }

    /// Current summary text, empty unless fresh
    pub fn summary(&self) -> &str {
        match self {
            SummaryState::Fresh { summary } => summary,
            _ => "",
        }
    }

    /// Whether a new summary may be generated
    pub fn can_summarize(&self) -> bool {
        !self.has_summary()
    }

    /// The transcript changed
    pub fn on_transcript_edit(&mut self) {
        *self = SummaryState::Stale;
    }

    /// A summary was generated from the current transcript.
    ///
    /// Blank summaries are ignored and leave the state untouched.
    pub fn on_summary_generated(&mut self, summary: String) -> bool {
        if summary.trim().is_empty() {
            return false;
        }
        *self = SummaryState::Fresh { summary };
        true
    }
}
