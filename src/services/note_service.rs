// src/services/note_service.rs
use crate::{
    db::Store,
    error::AppResult,
    models::{
        format_ts,
        note::{AdminNote, NewAdminNote, NoteRow},
    },
    realtime::{ChangeEvent, ChangeKind, Table},
    services::{logged, logged_for_student},
};
use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// Notas de um aluno, mais recentes primeiro.
pub async fn list_by_student(store: &Store, student_id: &str) -> AppResult<Vec<AdminNote>> {
    tracing::debug!("Buscando notas do aluno {}", student_id);
    let rows: Vec<NoteRow> = sqlx::query_as(
        r#"
        SELECT id, student_id, content, admin_name, timestamp
        FROM admin_notes
        WHERE student_id = ?1
        ORDER BY timestamp DESC, rowid DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(store.pool())
    .await
    .map_err(logged("listar notas"))?;

    rows.into_iter().map(AdminNote::try_from).collect()
}

pub(crate) async fn insert_row(
    conn: &mut SqliteConnection,
    id: &str,
    note: &NewAdminNote,
) -> Result<NoteRow, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
        INSERT INTO admin_notes (id, student_id, content, admin_name, timestamp, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        RETURNING id, student_id, content, admin_name, timestamp
        "#,
    )
    .bind(id)
    .bind(&note.student_id)
    .bind(&note.content)
    .bind(&note.admin_name)
    .bind(format_ts(&note.timestamp.unwrap_or(now)))
    .bind(format_ts(&now))
    .fetch_one(conn)
    .await
}

pub async fn create(store: &Store, note: NewAdminNote) -> AppResult<AdminNote> {
    note.validate()?;
    let id = Uuid::new_v4().to_string();
    tracing::info!("Nova nota ({}) de '{}' para o aluno {}", id, note.admin_name, note.student_id);

    let mut conn = store.pool().acquire().await.map_err(logged("obter conexão"))?;
    let row = insert_row(&mut conn, &id, &note)
        .await
        .map_err(logged_for_student("criar nota", &note.student_id))?;
    drop(conn);

    store.publish(ChangeEvent::new(Table::AdminNotes, ChangeKind::Insert, &note.student_id));
    AdminNote::try_from(row)
}

/// Apaga uma nota. Devolve `false` se não existia.
pub async fn delete(store: &Store, id: &str) -> AppResult<bool> {
    tracing::info!("Apagando nota {}", id);
    let student_id: Option<String> =
        sqlx::query_scalar("DELETE FROM admin_notes WHERE id = ?1 RETURNING student_id")
            .bind(id)
            .fetch_optional(store.pool())
            .await
            .map_err(logged("apagar nota"))?;

    match student_id {
        Some(student_id) => {
            store.publish(ChangeEvent::new(Table::AdminNotes, ChangeKind::Delete, student_id));
            Ok(true)
        }
        None => Ok(false),
    }
}
