//! Repository pattern for database operations
//!
//! Postgres-backed `NoteStore`. Rows are validated on the way out so a
//! stored state that breaks the summary invariants surfaces as an error.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::notes::{Note, NoteStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

/// Repository for data access operations
#[cfg_attr(not(feature = "mock"), derive(Clone))]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.connection()
    }
}

#[async_trait]
impl NoteStore for Repository {
    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Note>> {
        NoteEntity::find_by_id(id)
            .one(self.conn())
            .await?
            .map(Note::try_from)
            .transpose()
    }

    async fn insert(&self, note: &Note) -> Result<()> {
        NoteEntity::insert(NoteActiveModel::from(note))
            .exec_without_returning(self.conn())
            .await?;
        Ok(())
    }

    async fn update(&self, note: &Note, expected_updated_at: DateTime<Utc>) -> Result<()> {
        let mut active = NoteActiveModel::from(note);
        // id and created_at never change after insert
        active.id = ActiveValue::NotSet;
        active.created_at = ActiveValue::NotSet;

        let result = NoteEntity::update_many()
            .set(active)
            .filter(NoteColumn::Id.eq(note.id()))
            .filter(NoteColumn::UpdatedAt.eq(DateTimeWithTimeZone::from(expected_updated_at)))
            .exec(self.conn())
            .await?;

        if result.rows_affected > 0 {
            return Ok(());
        }

        match NoteEntity::find_by_id(note.id()).one(self.conn()).await? {
            Some(_) => Err(AppError::Conflict {
                id: note.id().to_string(),
            }),
            None => Err(AppError::not_found(note.id())),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = NoteEntity::delete_by_id(id).exec(self.conn()).await?;
        Ok(result.rows_affected > 0)
    }

    async fn list_recent(&self) -> Result<Vec<Note>> {
        NoteEntity::find()
            .order_by_desc(NoteColumn::CreatedAt)
            .all(self.conn())
            .await?
            .into_iter()
            .map(Note::try_from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn record(title: &str, state: &str, summary: &str, offset_secs: i64) -> NoteRecord {
        let at = Utc::now() - Duration::seconds(offset_secs);
        NoteRecord {
            id: Uuid::new_v4(),
            title: title.into(),
            transcript: "Walked through the release plan with the team.".into(),
            summary: summary.into(),
            summary_state: state.into(),
            duration: 12,
            created_at: at.into(),
            updated_at: at.into(),
        }
    }

    fn repo(db: MockDatabase) -> Repository {
        Repository::new(DbPool::from_connection(db.into_connection()))
    }

    #[tokio::test]
    async fn test_fetch_maps_row_to_note() {
        let row = record("Standup", "fresh", "Release plan reviewed.", 0);
        let id = row.id;
        let repo = repo(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![row]]));

        let note = repo.fetch(id).await.unwrap().unwrap();
        assert_eq!(note.id(), id);
        assert_eq!(note.title, "Standup");
        assert_eq!(note.summary(), "Release plan reviewed.");
        assert!(!note.is_edited());
    }

    #[tokio::test]
    async fn test_fetch_missing_returns_none() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([Vec::<NoteRecord>::new()]),
        );

        assert!(repo.fetch(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_corrupt_row_is_error() {
        let row = record("Broken", "no_summary", "should not be here", 0);
        let id = row.id;
        let repo = repo(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![row]]));

        let err = repo.fetch(id).await.unwrap_err();
        assert!(matches!(err, AppError::CorruptRecord { .. }));
    }

    #[tokio::test]
    async fn test_list_recent_keeps_query_order() {
        let rows = vec![
            record("newest", "stale", "", 0),
            record("older", "no_summary", "", 60),
        ];
        let repo = repo(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([rows]));

        let notes = repo.list_recent().await.unwrap();
        let titles: Vec<_> = notes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["newest", "older"]);
        assert!(notes[0].is_edited());
    }

    #[tokio::test]
    async fn test_delete_reports_whether_row_existed() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
                MockExecResult { last_insert_id: 0, rows_affected: 1 },
                MockExecResult { last_insert_id: 0, rows_affected: 0 },
            ]),
        );

        assert!(repo.delete(Uuid::new_v4()).await.unwrap());
        assert!(!repo.delete(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_applies_when_row_unchanged() {
        let note = Note::new("T".into(), "Some transcript text.".into(), 0, Utc::now());
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult { last_insert_id: 0, rows_affected: 1 }]),
        );

        repo.update(&note, note.updated_at()).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_of_changed_row_is_conflict() {
        let note = Note::new("T".into(), "Some transcript text.".into(), 0, Utc::now());
        let mut current = record("T", "stale", "", 0);
        current.id = note.id();
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult { last_insert_id: 0, rows_affected: 0 }])
                .append_query_results([vec![current]]),
        );

        let err = repo.update(&note, note.updated_at()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let note = Note::new("T".into(), "Some transcript text.".into(), 0, Utc::now());
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult { last_insert_id: 0, rows_affected: 0 }])
                .append_query_results([Vec::<NoteRecord>::new()]),
        );

        let err = repo.update(&note, note.updated_at()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
