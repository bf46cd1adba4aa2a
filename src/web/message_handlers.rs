// src/web/message_handlers.rs
use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::message::{ChatMessage, SendMessagePayload},
    services::message_service,
};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentMessageCount {
    pub student_id: String,
    pub count: i64,
}

/// GET /api/students/{id}/messages
pub async fn list_messages(
    State(store): State<Store>,
    Path(student_id): Path<String>,
) -> AppResult<Json<Vec<ChatMessage>>> {
    Ok(Json(message_service::list_by_student(&store, &student_id).await?))
}

/// POST /api/students/{id}/messages
pub async fn send_message(
    State(store): State<Store>,
    Path(student_id): Path<String>,
    Json(payload): Json<SendMessagePayload>,
) -> AppResult<(StatusCode, Json<ChatMessage>)> {
    let message = message_service::send(&store, payload.for_student(student_id)).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /api/students/{id}/messages/student-count
pub async fn student_message_count(
    State(store): State<Store>,
    Path(student_id): Path<String>,
) -> AppResult<Json<StudentMessageCount>> {
    let count = message_service::count_student_authored(&store, &student_id).await?;
    Ok(Json(StudentMessageCount { student_id, count }))
}

/// DELETE /api/messages/{id}
pub async fn delete_message(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if message_service::delete(&store, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Mensagem", id))
    }
}
