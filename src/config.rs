// src/config.rs
use crate::error::{AppError, AppResult};
use std::{env, net::SocketAddr};

/// Configuração lida das variáveis de ambiente (com suporte a `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    /// Corre o seed na arranque (só escreve se a tabela `students` estiver vazia).
    pub seed_on_start: bool,
    /// Se ativo, `/api/dashboard` devolve as fixtures (marcadas como degradadas) quando a DB falha.
    pub fixture_fallback: bool,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok(); // Carrega .env se existir

        let database_url = env::var("DATABASE_URL")?;

        let bind_addr = optional_var("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::InvalidConfig(format!("BIND_ADDR: {}", e)))?;

        let db_max_connections = match optional_var("DB_MAX_CONNECTIONS") {
            Some(v) => v
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| AppError::InvalidConfig(format!("DB_MAX_CONNECTIONS: '{}'", v)))?,
            None => 5,
        };

        Ok(Config {
            database_url,
            bind_addr,
            db_max_connections,
            seed_on_start: bool_var("SEED_ON_START", true)?,
            fixture_fallback: bool_var("FIXTURE_FALLBACK", false)?,
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn bool_var(name: &str, default: bool) -> AppResult<bool> {
    match optional_var(name) {
        Some(v) => parse_bool(&v)
            .ok_or_else(|| AppError::InvalidConfig(format!("{}: valor booleano inválido '{}'", name, v))),
        None => Ok(default),
    }
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_boolean_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" on "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("talvez"), None);
    }
}
