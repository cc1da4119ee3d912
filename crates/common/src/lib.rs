//! VoiceNotes Common Library
//!
//! Shared code for the VoiceNotes services including:
//! - Note model and summary state machine
//! - Tiered summarizer (Gemini, Groq, local extractive fallback)
//! - Note storage (Postgres via SeaORM, in-memory)
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod notes;
pub mod summarizer;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use notes::{Note, NoteService, NoteStore, SummaryState};
pub use summarizer::{Summarizer, Summary, SummaryMethod};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum transcript length in characters, after trimming
pub const MAX_TRANSCRIPT_CHARS: usize = 10_000;

/// Minimum transcript length in characters for summarization
pub const MIN_SUMMARY_INPUT_CHARS: usize = 20;
