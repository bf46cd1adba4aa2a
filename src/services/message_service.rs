// src/services/message_service.rs
use crate::{
    db::Store,
    error::AppResult,
    models::{
        format_ts,
        message::{ChatMessage, MessageRow, NewMessage, Sender},
    },
    realtime::{ChangeEvent, ChangeKind, Table},
    services::{logged, logged_for_student},
};
use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// Conversa de um aluno, da mensagem mais antiga para a mais recente.
pub async fn list_by_student(store: &Store, student_id: &str) -> AppResult<Vec<ChatMessage>> {
    tracing::debug!("Buscando mensagens do aluno {}", student_id);
    let rows: Vec<MessageRow> = sqlx::query_as(
        r#"
        SELECT id, student_id, sender, content, timestamp, is_admin_note
        FROM chat_messages
        WHERE student_id = ?1
        ORDER BY timestamp ASC, rowid ASC
        "#,
    )
    .bind(student_id)
    .fetch_all(store.pool())
    .await
    .map_err(logged("listar mensagens"))?;

    tracing::debug!("{} mensagens para o aluno {}.", rows.len(), student_id);
    rows.into_iter().map(ChatMessage::try_from).collect()
}

/// Insere a mensagem com o id indicado. Partilhado com o seed.
pub(crate) async fn insert_row(
    conn: &mut SqliteConnection,
    id: &str,
    message: &NewMessage,
) -> Result<MessageRow, sqlx::Error> {
    let now = Utc::now();
    let timestamp = message.timestamp.unwrap_or(now);

    sqlx::query_as(
        r#"
        INSERT INTO chat_messages (id, student_id, sender, content, timestamp, is_admin_note, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        RETURNING id, student_id, sender, content, timestamp, is_admin_note
        "#,
    )
    .bind(id)
    .bind(&message.student_id)
    .bind(message.sender.as_str())
    .bind(&message.content)
    .bind(format_ts(&timestamp))
    .bind(message.is_admin_note)
    .bind(format_ts(&now))
    .fetch_one(conn)
    .await
}

/// Envia (grava) uma mensagem e devolve-a com o id atribuído pelo servidor.
pub async fn send(store: &Store, message: NewMessage) -> AppResult<ChatMessage> {
    message.validate()?;
    let id = Uuid::new_v4().to_string();
    tracing::info!(
        "Nova mensagem ({}) de '{}' para o aluno {}",
        id,
        message.sender.as_str(),
        message.student_id
    );

    let mut conn = store.pool().acquire().await.map_err(logged("obter conexão"))?;
    let row = insert_row(&mut conn, &id, &message)
        .await
        .map_err(logged_for_student("enviar mensagem", &message.student_id))?;
    drop(conn);

    store.publish(ChangeEvent::new(Table::ChatMessages, ChangeKind::Insert, &message.student_id));
    ChatMessage::try_from(row)
}

/// Apaga uma mensagem. Devolve `false` se não existia.
pub async fn delete(store: &Store, id: &str) -> AppResult<bool> {
    tracing::info!("Apagando mensagem {}", id);
    // RETURNING dá-nos o aluno para notificar só as subscrições certas
    let student_id: Option<String> =
        sqlx::query_scalar("DELETE FROM chat_messages WHERE id = ?1 RETURNING student_id")
            .bind(id)
            .fetch_optional(store.pool())
            .await
            .map_err(logged("apagar mensagem"))?;

    match student_id {
        Some(student_id) => {
            store.publish(ChangeEvent::new(Table::ChatMessages, ChangeKind::Delete, student_id));
            Ok(true)
        }
        None => {
            tracing::warn!("Mensagem {} não existia.", id);
            Ok(false)
        }
    }
}

/// Número de mensagens escritas pelo aluno.
///
/// Não há estado de leitura no modelo, por isso isto NÃO é um contador de
/// "não lidas"; conta tudo o que o aluno enviou.
pub async fn count_student_authored(store: &Store, student_id: &str) -> AppResult<i64> {
    tracing::debug!("Contando mensagens enviadas pelo aluno {}", student_id);
    sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE student_id = ?1 AND sender = ?2")
        .bind(student_id)
        .bind(Sender::Student.as_str())
        .fetch_one(store.pool())
        .await
        .map_err(logged("contar mensagens do aluno"))
}
