// src/models/message.rs
use super::parse_ts;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Student,
    Admin,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::Student => "student",
            Sender::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "student" => Some(Sender::Student),
            "admin" => Some(Sender::Admin),
            _ => None,
        }
    }
}

/// Linha da tabela `chat_messages`.
#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: String,
    pub student_id: String,
    pub sender: String,
    pub content: String,
    pub timestamp: String,
    pub is_admin_note: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub student_id: String,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_admin_note: bool,
}

impl TryFrom<MessageRow> for ChatMessage {
    type Error = AppError;

    fn try_from(row: MessageRow) -> AppResult<Self> {
        let sender = Sender::parse(&row.sender)
            .ok_or_else(|| AppError::CorruptRow(format!("sender = '{}'", row.sender)))?;
        Ok(ChatMessage {
            timestamp: parse_ts("timestamp", &row.timestamp)?,
            id: row.id,
            student_id: row.student_id,
            sender,
            content: row.content,
            is_admin_note: row.is_admin_note,
        })
    }
}

/// Mensagem a enviar. Sem `timestamp` usa-se a hora atual.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub student_id: String,
    pub sender: Sender,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_admin_note: bool,
}

impl NewMessage {
    pub fn validate(&self) -> AppResult<()> {
        if self.student_id.trim().is_empty() {
            return Err(AppError::validation("studentId não pode ser vazio"));
        }
        if self.content.trim().is_empty() {
            return Err(AppError::validation("content não pode ser vazio"));
        }
        Ok(())
    }
}

/// Corpo de `POST /api/students/{id}/messages` (o aluno vem do path).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    #[serde(default = "default_sender")]
    pub sender: Sender,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_admin_note: bool,
}

// O painel é usado pelo admin, por isso é ele o remetente habitual
fn default_sender() -> Sender {
    Sender::Admin
}

impl SendMessagePayload {
    pub fn for_student(self, student_id: String) -> NewMessage {
        NewMessage {
            student_id,
            sender: self.sender,
            content: self.content,
            timestamp: self.timestamp,
            is_admin_note: self.is_admin_note,
        }
    }
}
