//! Note handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use voicenotes_common::{
    errors::{AppError, Result},
    notes::{NewNote, Note, NoteUpdate},
};

/// Success envelope
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self { success: true, data })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub deleted_id: Uuid,
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidFormat {
        message: format!("Invalid note id: {}", raw),
    })
}

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation {
            message: rejection.body_text(),
            field: None,
        })
}

/// List all notes, newest first
pub async fn list_notes(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Note>>>> {
    let notes = state.notes.list().await?;
    Ok(ApiResponse::ok(notes))
}

/// Get a note by ID
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Note>>> {
    let note = state.notes.get(parse_id(&id)?).await?;
    Ok(ApiResponse::ok(note))
}

/// Create a note
pub async fn create_note(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewNote>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Note>>)> {
    let note = state.notes.create(json_body(payload)?).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(note)))
}

/// Edit a note's title and transcript
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<NoteUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<Note>>> {
    let id = parse_id(&id)?;
    let note = state.notes.update(id, json_body(payload)?).await?;
    Ok(ApiResponse::ok(note))
}

/// Delete a note
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let deleted_id = state.notes.delete(parse_id(&id)?).await?;

    Ok(Json(DeleteResponse {
        success: true,
        message: "Note deleted successfully".to_string(),
        deleted_id,
    }))
}

/// Generate a summary for a note that has no current one
pub async fn generate_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Note>>> {
    let note = state.notes.request_summary(parse_id(&id)?).await?;
    Ok(ApiResponse::ok(note))
}
