// src/services/mod.rs
pub mod message_service;
pub mod note_service;
pub mod seed_service;
pub mod student_service;

use crate::error::AppError;

/// Loga a falha do pedido à DB e converte-a em `AppError::Store`.
/// Uso: `.await.map_err(logged("listar alunos"))?`
pub(crate) fn logged(action: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        tracing::error!("Erro ao {}: {}", action, e);
        AppError::Store(e)
    }
}

/// Como `logged`, mas uma violação de FK (aluno inexistente) vira
/// `AppError::NotFound`: o erro é do cliente, não da DB.
pub(crate) fn logged_for_student<'a>(
    action: &'static str,
    student_id: &'a str,
) -> impl FnOnce(sqlx::Error) -> AppError + 'a {
    move |e| {
        if let sqlx::Error::Database(db) = &e {
            if db.is_foreign_key_violation() {
                tracing::debug!("Falha ao {}: aluno '{}' não existe.", action, student_id);
                return AppError::not_found("Aluno", student_id);
            }
        }
        logged(action)(e)
    }
}
