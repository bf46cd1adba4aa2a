// src/web/note_handlers.rs
use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::note::{AdminNote, CreateNotePayload},
    services::note_service,
};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};

/// GET /api/students/{id}/notes
pub async fn list_notes(
    State(store): State<Store>,
    Path(student_id): Path<String>,
) -> AppResult<Json<Vec<AdminNote>>> {
    Ok(Json(note_service::list_by_student(&store, &student_id).await?))
}

/// POST /api/students/{id}/notes
pub async fn create_note(
    State(store): State<Store>,
    Path(student_id): Path<String>,
    Json(payload): Json<CreateNotePayload>,
) -> AppResult<(StatusCode, Json<AdminNote>)> {
    let note = note_service::create(&store, payload.for_student(student_id)).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// DELETE /api/notes/{id}
pub async fn delete_note(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if note_service::delete(&store, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Nota", id))
    }
}
