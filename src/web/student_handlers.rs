// src/web/student_handlers.rs
use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::student::{NewStudent, PaymentStatusPayload, Student, StudentPatch},
    services::student_service,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

// Query parameter ?q= (pesquisa)
#[derive(Deserialize, Debug)]
pub struct SearchQuery {
    q: Option<String>,
}

/// GET /api/students?q=...
pub async fn list_students(
    State(store): State<Store>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Student>>> {
    let students = match params.q.as_deref() {
        Some(q) => student_service::search(&store, q).await?,
        None => student_service::list_all(&store).await?,
    };
    Ok(Json(students))
}

/// POST /api/students
pub async fn create_student(
    State(store): State<Store>,
    Json(payload): Json<NewStudent>,
) -> AppResult<(StatusCode, Json<Student>)> {
    let student = student_service::create(&store, payload).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// GET /api/students/{id}
pub async fn get_student(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> AppResult<Json<Student>> {
    student_service::get_by_id(&store, &id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Aluno", id))
}

/// PATCH /api/students/{id}
pub async fn update_student(
    State(store): State<Store>,
    Path(id): Path<String>,
    Json(patch): Json<StudentPatch>,
) -> AppResult<Json<Student>> {
    Ok(Json(student_service::update(&store, &id, patch).await?))
}

/// DELETE /api/students/{id}
pub async fn delete_student(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if student_service::delete(&store, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Aluno", id))
    }
}

/// POST /api/students/{id}/mentor
pub async fn toggle_mentor(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> AppResult<Json<Student>> {
    Ok(Json(student_service::toggle_mentor(&store, &id).await?))
}

/// PUT /api/students/{id}/payment-status
pub async fn set_payment_status(
    State(store): State<Store>,
    Path(id): Path<String>,
    Json(payload): Json<PaymentStatusPayload>,
) -> AppResult<Json<Student>> {
    let student = student_service::set_payment_status(&store, &id, payload.payment_status).await?;
    Ok(Json(student))
}
