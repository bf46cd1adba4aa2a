// src/models/note.rs
use super::parse_ts;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Linha da tabela `admin_notes`.
#[derive(Debug, Clone, FromRow)]
pub struct NoteRow {
    pub id: String,
    pub student_id: String,
    pub content: String,
    pub admin_name: String,
    pub timestamp: String,
}

/// Nota interna do admin sobre um aluno. Imutável depois de criada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminNote {
    pub id: String,
    pub student_id: String,
    pub content: String,
    pub admin_name: String,
    pub timestamp: DateTime<Utc>,
}

impl TryFrom<NoteRow> for AdminNote {
    type Error = AppError;

    fn try_from(row: NoteRow) -> AppResult<Self> {
        Ok(AdminNote {
            timestamp: parse_ts("timestamp", &row.timestamp)?,
            id: row.id,
            student_id: row.student_id,
            content: row.content,
            admin_name: row.admin_name,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdminNote {
    pub student_id: String,
    pub content: String,
    pub admin_name: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewAdminNote {
    pub fn validate(&self) -> AppResult<()> {
        if self.student_id.trim().is_empty() {
            return Err(AppError::validation("studentId não pode ser vazio"));
        }
        if self.content.trim().is_empty() {
            return Err(AppError::validation("content não pode ser vazio"));
        }
        if self.admin_name.trim().is_empty() {
            return Err(AppError::validation("adminName não pode ser vazio"));
        }
        Ok(())
    }
}

/// Corpo de `POST /api/students/{id}/notes`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotePayload {
    pub content: String,
    pub admin_name: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl CreateNotePayload {
    pub fn for_student(self, student_id: String) -> NewAdminNote {
        NewAdminNote {
            student_id,
            content: self.content,
            admin_name: self.admin_name,
            timestamp: self.timestamp,
        }
    }
}
