// src/error.rs
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Falha no pedido à base de dados (rede, constraint, etc.).
    #[error("Erro na base de dados: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Erro de variável de ambiente: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Configuração inválida: {0}")]
    InvalidConfig(String),

    #[error("Dados inválidos: {0}")]
    Validation(String),

    #[error("{resource} '{id}' não encontrado")]
    NotFound { resource: &'static str, id: String },

    // Linha lida da DB que não respeita o formato esperado
    #[error("Registo inválido na base de dados: {0}")]
    CorruptRow(String),

    #[error("Erro nos dados de fixture: {0}")]
    Fixture(#[from] serde_json::Error),
}

impl AppError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound { resource, id: id.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }
}

// Como converter AppError numa resposta HTTP (JSON)
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => {
                tracing::debug!("Pedido rejeitado: {}", msg);
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone())
            }
            AppError::NotFound { .. } => {
                tracing::debug!("{}", self);
                (StatusCode::NOT_FOUND, "not_found", self.to_string())
            }
            _ => {
                // Loga o erro detalhado no servidor, devolve mensagem genérica
                tracing::error!("Erro processado: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;
