//! Note operations
//!
//! Every mutation is one fetch-mutate-persist sequence against a single
//! note. Input is validated before anything is fetched or written, so a
//! rejected request never leaves a partial change behind.

use super::model::Note;
use super::store::NoteStore;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::summarizer::Summarizer;
use crate::MAX_TRANSCRIPT_CHARS;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Input for creating a note
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    #[validate(length(max = 200))]
    pub title: Option<String>,

    pub transcript: String,

    /// Recording length in seconds, as a number or a numeric string
    #[serde(default, deserialize_with = "lenient_duration")]
    pub duration: Option<f64>,
}

/// Accept `12.5`, `"12"` or `"12s"`; text without a leading integer is ignored
fn lenient_duration<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(text)) => leading_integer(&text),
        None => None,
    })
}

fn leading_integer(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let digits_from = usize::from(text.starts_with(['-', '+']));
    let end = text[digits_from..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(text.len(), |i| i + digits_from);

    text[..end].parse::<i64>().ok().map(|n| n as f64)
}

/// Input for editing a note
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdate {
    #[validate(length(max = 200))]
    pub title: Option<String>,

    pub transcript: String,
}

/// Trim and bound-check a transcript
pub fn normalize_transcript(raw: &str) -> Result<String> {
    let transcript = raw.trim();
    if transcript.is_empty() {
        return Err(AppError::Validation {
            message: "Valid transcript is required".to_string(),
            field: Some("transcript".to_string()),
        });
    }

    let len = transcript.chars().count();
    if len > MAX_TRANSCRIPT_CHARS {
        return Err(AppError::InputTooLong {
            len,
            max: MAX_TRANSCRIPT_CHARS,
        });
    }

    Ok(transcript.to_string())
}

/// Trimmed title, or `None` when missing or blank
pub fn normalize_title(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Whole seconds, clamped at zero
pub fn normalize_duration(raw: Option<f64>) -> i64 {
    raw.filter(|d| d.is_finite())
        .map(|d| d.max(0.0).trunc() as i64)
        .unwrap_or(0)
}

/// Placeholder title for notes submitted without one
pub fn default_title(now: DateTime<Utc>) -> String {
    format!("Note {}", now.format("%-m/%-d/%Y"))
}

fn validation_error(e: validator::ValidationErrors) -> AppError {
    let field = e.field_errors().keys().next().map(|k| k.to_string());
    AppError::Validation {
        message: e.to_string(),
        field,
    }
}

/// Note CRUD plus summary generation
pub struct NoteService {
    store: Arc<dyn NoteStore>,
    summarizer: Arc<Summarizer>,
}

impl NoteService {
    pub fn new(store: Arc<dyn NoteStore>, summarizer: Arc<Summarizer>) -> Self {
        Self { store, summarizer }
    }

    pub fn store(&self) -> &Arc<dyn NoteStore> {
        &self.store
    }

    pub fn summarizer(&self) -> &Arc<Summarizer> {
        &self.summarizer
    }

    /// All notes, newest first
    pub async fn list(&self) -> Result<Vec<Note>> {
        self.store.list_recent().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Note> {
        self.store
            .fetch(id)
            .await?
            .ok_or_else(|| AppError::not_found(id))
    }

    /// Create a note in the `NoSummary` state
    pub async fn create(&self, input: NewNote) -> Result<Note> {
        input.validate().map_err(validation_error)?;
        let transcript = normalize_transcript(&input.transcript)?;
        let title = normalize_title(input.title.as_deref());

        let now = Utc::now();
        let note = Note::new(
            title.unwrap_or_else(|| default_title(now)),
            transcript,
            normalize_duration(input.duration),
            now,
        );

        self.store.insert(&note).await?;
        metrics::record_note_operation("create");

        info!(note_id = %note.id(), "Note created");
        Ok(note)
    }

    /// Edit title and transcript. A changed transcript invalidates the summary.
    pub async fn update(&self, id: Uuid, input: NoteUpdate) -> Result<Note> {
        input.validate().map_err(validation_error)?;
        let transcript = normalize_transcript(&input.transcript)?;
        let title = normalize_title(input.title.as_deref());

        let mut note = self.get(id).await?;
        let seen = note.updated_at();

        let edited = note.edit_transcript(transcript);
        if let Some(title) = title {
            note.title = title;
        }
        note.touch(Utc::now());

        self.store.update(&note, seen).await?;
        metrics::record_note_operation("update");

        if edited {
            info!(note_id = %id, "Transcript edited, summary cleared");
        }
        Ok(note)
    }

    /// Delete a note. Returns the deleted id.
    pub async fn delete(&self, id: Uuid) -> Result<Uuid> {
        if !self.store.delete(id).await? {
            return Err(AppError::not_found(id));
        }
        metrics::record_note_operation("delete");

        info!(note_id = %id, "Note deleted");
        Ok(id)
    }

    /// Generate and store a summary for a note without a current one.
    ///
    /// If the note is edited while the summary is being generated, the edit
    /// is kept and this fails with `Conflict`.
    pub async fn request_summary(&self, id: Uuid) -> Result<Note> {
        let mut note = self.get(id).await?;
        let seen = note.updated_at();

        note.ensure_can_summarize()?;
        self.summarizer.check_input(note.transcript())?;

        let summary = self.summarizer.summarize(note.transcript()).await?;

        note.apply_summary(summary.text)?;
        note.touch(Utc::now());

        if let Err(e) = self.store.update(&note, seen).await {
            if matches!(e, AppError::Conflict { .. }) {
                warn!(note_id = %id, "Note changed while summarizing, summary discarded");
            }
            return Err(e);
        }
        metrics::record_note_operation("summarize");

        info!(note_id = %id, method = %summary.method, "Summary generated for note");
        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::state::SummaryState;
    use crate::notes::store::InMemoryNoteStore;
    use crate::summarizer::testing::{all_down, GatedBackend, StaticBackend};
    use crate::summarizer::SummaryBackend;
    use chrono::TimeZone;

    fn service_with(summarizer: Summarizer) -> (NoteService, Arc<InMemoryNoteStore>) {
        let store = Arc::new(InMemoryNoteStore::new());
        let service = NoteService::new(store.clone(), Arc::new(summarizer));
        (service, store)
    }

    fn new_note(transcript: &str) -> NewNote {
        NewNote {
            transcript: transcript.to_string(),
            ..Default::default()
        }
    }

    fn update(transcript: &str) -> NoteUpdate {
        NoteUpdate {
            title: None,
            transcript: transcript.to_string(),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_summary_lifecycle() {
        let (service, _) = service_with(all_down());

        let note = service
            .create(new_note("  Hello world, this is a test note.  "))
            .await
            .unwrap();
        assert_eq!(note.transcript(), "Hello world, this is a test note.");
        assert_eq!(note.state(), &SummaryState::NoSummary);

        let note = service.request_summary(note.id()).await.unwrap();
        assert!(note.has_summary());
        assert!(!note.is_edited());
        assert_eq!(note.summary(), "Hello world, this is a test note.");

        let note = service
            .update(
                note.id(),
                update("Hello world, this is a test note. More content added."),
            )
            .await
            .unwrap();
        assert_eq!(note.state(), &SummaryState::Stale);
        assert_eq!(note.summary(), "");

        let note = service.request_summary(note.id()).await.unwrap();
        assert!(note.has_summary());
        assert!(!note.is_edited());
        assert_eq!(
            note.summary(),
            "Hello world, this is a test note. More content added."
        );
    }

    #[tokio::test]
    async fn test_whitespace_only_edit_keeps_summary() {
        let (service, _) = service_with(all_down());
        let note = service
            .create(new_note("Pick up the dry cleaning on Friday."))
            .await
            .unwrap();
        let summarized = service.request_summary(note.id()).await.unwrap();

        let edited = service
            .update(note.id(), update("\n  Pick up the dry cleaning on Friday.  \t"))
            .await
            .unwrap();
        assert_eq!(edited.state(), summarized.state());
        assert_eq!(edited.summary(), summarized.summary());
    }

    #[tokio::test]
    async fn test_edit_without_summary_marks_edited() {
        let (service, _) = service_with(all_down());
        let note = service
            .create(new_note("First draft of the meeting notes."))
            .await
            .unwrap();

        let note = service
            .update(note.id(), update("Second draft of the meeting notes."))
            .await
            .unwrap();
        assert!(note.is_edited());
        assert!(!note.has_summary());
        assert_eq!(note.summary(), "");
    }

    #[tokio::test]
    async fn test_summary_refused_when_current_and_record_unchanged() {
        let (service, store) = service_with(all_down());
        let note = service
            .create(new_note("Call the dentist to move the appointment."))
            .await
            .unwrap();
        service.request_summary(note.id()).await.unwrap();
        let before = store.fetch(note.id()).await.unwrap().unwrap();

        let err = service.request_summary(note.id()).await.unwrap_err();
        assert!(matches!(err, AppError::SummaryAlreadyCurrent { .. }));

        let after = store.fetch(note.id()).await.unwrap().unwrap();
        assert_eq!(
            serde_json::to_vec(&after).unwrap(),
            serde_json::to_vec(&before).unwrap()
        );
    }

    #[tokio::test]
    async fn test_short_transcript_storable_but_not_summarizable() {
        let (service, store) = service_with(all_down());
        let note = service.create(new_note("Too short")).await.unwrap();

        let err = service.request_summary(note.id()).await.unwrap_err();
        assert!(matches!(err, AppError::InputTooShort { len: 9, min: 20 }));
        assert_eq!(store.fetch(note.id()).await.unwrap().unwrap(), note);
    }

    #[tokio::test]
    async fn test_edit_during_summary_generation_is_kept() {
        let backend = GatedBackend::new("Summary of the original text.");
        let (service, store) =
            service_with(Summarizer::new(vec![backend.clone() as Arc<dyn SummaryBackend>], 20));
        let note = service
            .create(new_note("Original transcript of the note."))
            .await
            .unwrap();

        let summarize = service.request_summary(note.id());
        let edit = async {
            backend.entered.notified().await;
            let edited = service
                .update(note.id(), update("Completely new edited transcript."))
                .await
                .unwrap();
            backend.release.notify_one();
            edited
        };
        let (summarized, edited) = tokio::join!(summarize, edit);

        assert!(matches!(summarized.unwrap_err(), AppError::Conflict { .. }));

        let stored = store.fetch(note.id()).await.unwrap().unwrap();
        assert_eq!(stored, edited);
        assert_eq!(stored.transcript(), "Completely new edited transcript.");
        assert_eq!(stored.state(), &SummaryState::Stale);

        // the edited transcript can still be summarized afterwards
        let retry = service.request_summary(note.id());
        let release = async { backend.release.notify_one() };
        let (summarized, _) = tokio::join!(retry, release);
        let summarized = summarized.unwrap();
        assert!(summarized.has_summary());
        assert_eq!(summarized.transcript(), "Completely new edited transcript.");
    }

    #[tokio::test]
    async fn test_generative_summary_is_stored() {
        let backend = StaticBackend::new("gemini", "Dentist appointment needs moving.");
        let (service, _) = service_with(Summarizer::new(vec![backend as Arc<dyn SummaryBackend>], 20));

        let note = service
            .create(new_note("Call the dentist to move the appointment."))
            .await
            .unwrap();
        let note = service.request_summary(note.id()).await.unwrap();
        assert_eq!(note.summary(), "Dentist appointment needs moving.");
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (service, store) = service_with(all_down());

        let err = service.create(new_note("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let err = service
            .create(new_note(&"x".repeat(MAX_TRANSCRIPT_CHARS + 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InputTooLong { len: 10_001, max: 10_000 }));

        let err = service
            .create(NewNote {
                title: Some("t".repeat(201)),
                transcript: "Valid transcript text.".into(),
                duration: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_transcript_limit_counts_after_trimming() {
        let (service, _) = service_with(all_down());
        let padded = format!("   {}   ", "y".repeat(MAX_TRANSCRIPT_CHARS));
        let note = service.create(new_note(&padded)).await.unwrap();
        assert_eq!(note.transcript().chars().count(), MAX_TRANSCRIPT_CHARS);
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let (service, _) = service_with(all_down());
        let note = service
            .create(NewNote {
                title: Some("   ".into()),
                transcript: "Some transcript text.".into(),
                duration: Some(-4.0),
            })
            .await
            .unwrap();

        assert!(note.title.starts_with("Note "));
        assert_eq!(note.duration, 0);
    }

    #[tokio::test]
    async fn test_update_title_only_when_given() {
        let (service, _) = service_with(all_down());
        let note = service
            .create(NewNote {
                title: Some("Original".into()),
                transcript: "Some transcript text.".into(),
                duration: Some(3.7),
            })
            .await
            .unwrap();
        assert_eq!(note.duration, 3);

        let kept = service
            .update(
                note.id(),
                NoteUpdate {
                    title: Some("  ".into()),
                    transcript: "Some transcript text.".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(kept.title, "Original");
        assert_eq!(kept.state(), &SummaryState::NoSummary);

        let renamed = service
            .update(
                note.id(),
                NoteUpdate {
                    title: Some(" Renamed ".into()),
                    transcript: "Some transcript text.".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.title, "Renamed");
        assert!(renamed.updated_at() >= note.updated_at());
    }

    #[tokio::test]
    async fn test_invalid_update_leaves_note_unchanged() {
        let (service, store) = service_with(all_down());
        let note = service
            .create(new_note("Some transcript text."))
            .await
            .unwrap();

        let err = service.update(note.id(), update("  ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(store.fetch(note.id()).await.unwrap().unwrap(), note);
    }

    #[tokio::test]
    async fn test_missing_note_operations() {
        let (service, _) = service_with(all_down());
        let id = Uuid::new_v4();

        assert!(matches!(service.get(id).await, Err(AppError::NotFound { .. })));
        assert!(matches!(service.delete(id).await, Err(AppError::NotFound { .. })));
        assert!(matches!(
            service.request_summary(id).await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            service.update(id, update("Some transcript text.")).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_from_any_state() {
        let (service, store) = service_with(all_down());
        let note = service
            .create(new_note("Water the plants every morning."))
            .await
            .unwrap();
        service.request_summary(note.id()).await.unwrap();

        assert_eq!(service.delete(note.id()).await.unwrap(), note.id());
        assert_eq!(store.len().await, 0);
    }

    #[test]
    fn test_default_title_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        assert_eq!(default_title(now), "Note 3/7/2024");
    }

    #[test]
    fn test_duration_accepts_numeric_strings() {
        let parse = |body: serde_json::Value| -> Option<f64> {
            serde_json::from_value::<NewNote>(body).unwrap().duration
        };

        assert_eq!(parse(serde_json::json!({"transcript": "t", "duration": "42"})), Some(42.0));
        assert_eq!(parse(serde_json::json!({"transcript": "t", "duration": " 42.9 "})), Some(42.0));
        assert_eq!(parse(serde_json::json!({"transcript": "t", "duration": "17s"})), Some(17.0));
        assert_eq!(parse(serde_json::json!({"transcript": "t", "duration": "abc"})), None);
        assert_eq!(parse(serde_json::json!({"transcript": "t", "duration": 8.5})), Some(8.5));
        assert_eq!(parse(serde_json::json!({"transcript": "t", "duration": null})), None);
        assert_eq!(parse(serde_json::json!({"transcript": "t"})), None);
    }

    #[test]
    fn test_normalize_duration() {
        assert_eq!(normalize_duration(None), 0);
        assert_eq!(normalize_duration(Some(f64::NAN)), 0);
        assert_eq!(normalize_duration(Some(-1.0)), 0);
        assert_eq!(normalize_duration(Some(42.9)), 42);
    }
}
