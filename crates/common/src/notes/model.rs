//! Note domain type

use super::state::SummaryState;
use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// A dictated note.
///
/// The transcript is always stored trimmed. Summary fields are only
/// reachable through [`SummaryState`], so `hasSummary`/`isEdited`
/// cannot disagree with `summary`.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    id: Uuid,
    pub title: String,
    transcript: String,
    state: SummaryState,
    pub duration: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Note {
    /// A new note in `NoSummary`. `transcript` must already be normalized.
    pub fn new(title: String, transcript: String, duration: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            transcript,
            state: SummaryState::NoSummary,
            duration,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a stored note
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid,
        title: String,
        transcript: String,
        state: SummaryState,
        duration: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            transcript,
            state,
            duration,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn state(&self) -> &SummaryState {
        &self.state
    }

    pub fn summary(&self) -> &str {
        self.state.summary()
    }

    pub fn has_summary(&self) -> bool {
        self.state.has_summary()
    }

    pub fn is_edited(&self) -> bool {
        self.state.is_edited()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replace the transcript. Returns whether it changed.
    ///
    /// `transcript` must already be normalized; a change invalidates the summary.
    pub fn edit_transcript(&mut self, transcript: String) -> bool {
        if transcript == self.transcript {
            return false;
        }
        self.transcript = transcript;
        self.state.on_transcript_edit();
        true
    }

    /// Fail unless a new summary may be generated
    pub fn ensure_can_summarize(&self) -> Result<()> {
        if !self.state.can_summarize() {
            return Err(AppError::SummaryAlreadyCurrent {
                id: self.id.to_string(),
            });
        }
        Ok(())
    }

    /// Store a summary generated from the current transcript
    pub fn apply_summary(&mut self, summary: String) -> Result<()> {
        self.ensure_can_summarize()?;
        if !self.state.on_summary_generated(summary) {
            return Err(AppError::SummarizerExhausted);
        }
        Ok(())
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NoteWire<'a> {
    id: Uuid,
    title: &'a str,
    transcript: &'a str,
    summary: &'a str,
    has_summary: bool,
    is_edited: bool,
    duration: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Serialize for Note {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        NoteWire {
            id: self.id,
            title: &self.title,
            transcript: &self.transcript,
            summary: self.summary(),
            has_summary: self.has_summary(),
            is_edited: self.is_edited(),
            duration: self.duration,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .serialize(serializer)
    }
}
