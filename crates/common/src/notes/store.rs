//! Note persistence abstraction

use super::model::Note;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Identified-record storage for notes.
///
/// `update` replaces the whole record and must be atomic per record. It only
/// applies if the stored note still carries the `updated_at` the caller
/// fetched, so a write never clobbers one that landed in between.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Check the store is reachable
    async fn ping(&self) -> Result<()>;

    async fn fetch(&self, id: Uuid) -> Result<Option<Note>>;

    async fn insert(&self, note: &Note) -> Result<()>;

    /// Replace a stored note last seen at `expected_updated_at`.
    ///
    /// Fails with `NotFound` if it no longer exists and `Conflict` if it was
    /// modified since.
    async fn update(&self, note: &Note, expected_updated_at: DateTime<Utc>) -> Result<()>;

    /// Remove a note. Returns whether it existed.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// All notes, newest first
    async fn list_recent(&self) -> Result<Vec<Note>>;
}

/// Process-local store for tests and `storage.backend = "memory"`
#[derive(Default)]
pub struct InMemoryNoteStore {
    notes: RwLock<HashMap<Uuid, Note>>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notes.read().await.is_empty()
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Note>> {
        Ok(self.notes.read().await.get(&id).cloned())
    }

    async fn insert(&self, note: &Note) -> Result<()> {
        self.notes.write().await.insert(note.id(), note.clone());
        Ok(())
    }

    async fn update(&self, note: &Note, expected_updated_at: DateTime<Utc>) -> Result<()> {
        let mut notes = self.notes.write().await;
        match notes.get_mut(&note.id()) {
            Some(stored) if stored.updated_at() != expected_updated_at => Err(AppError::Conflict {
                id: note.id().to_string(),
            }),
            Some(stored) => {
                *stored = note.clone();
                Ok(())
            }
            None => Err(AppError::not_found(note.id())),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.notes.write().await.remove(&id).is_some())
    }

    async fn list_recent(&self) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self.notes.read().await.values().cloned().collect();
        notes.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(notes)
    }
}
