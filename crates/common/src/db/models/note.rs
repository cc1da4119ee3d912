//! Note entity

use crate::errors::AppError;
use crate::notes::{Note, SummaryState};
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::Set;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub transcript: String,

    /// Empty unless `summary_state` is `fresh`
    #[sea_orm(column_type = "Text")]
    pub summary: String,

    /// One of `no_summary`, `fresh`, `stale`
    #[sea_orm(column_type = "Text")]
    pub summary_state: String,

    pub duration: i64,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Note {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let state = SummaryState::from_parts(&model.summary_state, model.summary).map_err(|e| {
            AppError::CorruptRecord {
                id: model.id.to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(Note::from_parts(
            model.id,
            model.title,
            model.transcript,
            state,
            model.duration,
            model.created_at.with_timezone(&Utc),
            model.updated_at.with_timezone(&Utc),
        ))
    }
}

impl From<&Note> for ActiveModel {
    fn from(note: &Note) -> Self {
        ActiveModel {
            id: Set(note.id()),
            title: Set(note.title.clone()),
            transcript: Set(note.transcript().to_string()),
            summary: Set(note.summary().to_string()),
            summary_state: Set(note.state().tag().to_string()),
            duration: Set(note.duration),
            created_at: Set(note.created_at().into()),
            updated_at: Set(note.updated_at().into()),
        }
    }
}
