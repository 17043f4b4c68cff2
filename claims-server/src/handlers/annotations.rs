use crate::error::{api_success, ApiResponse, ApiResult};
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use claims_service::{Flag, NewFlag, NewNote, Note, NoteType};
use logger_redacted::redacted_info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateFlagRequest {
    pub author: String,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub note_type: NoteType,
}

/// Flag a claim for review
pub async fn create_flag(
    State(state): State<AppState>,
    Path(claim_id): Path<String>,
    Json(request): Json<CreateFlagRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Flag>>)> {
    let flag = state
        .store
        .add_flag(NewFlag {
            claim_id,
            author: request.author,
            reason: request.reason,
        })
        .await?;

    redacted_info!("Flag {} raised on claim {}: {}", flag.id, flag.claim_id, flag.reason);
    Ok((StatusCode::CREATED, Json(api_success(flag))))
}

pub async fn resolve_flag(
    State(state): State<AppState>,
    Path(flag_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<Flag>>> {
    let flag = state.store.resolve_flag(flag_id).await?;
    tracing::info!(flag_id = flag.id, claim_id = %flag.claim_id, "Flag resolved");
    Ok(Json(api_success(flag)))
}

/// Add a note to a claim; `note_type` defaults to `user`
pub async fn create_note(
    State(state): State<AppState>,
    Path(claim_id): Path<String>,
    Json(request): Json<CreateNoteRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Note>>)> {
    let note = state
        .store
        .add_note(NewNote {
            claim_id,
            author: request.author,
            content: request.content,
            note_type: request.note_type,
        })
        .await?;

    redacted_info!("{} note {} added to claim {}", note.note_type.as_str(), note.id, note.claim_id);
    Ok((StatusCode::CREATED, Json(api_success(note))))
}
