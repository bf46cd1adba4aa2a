// src/main.rs

// --- Declaração dos Módulos ---
mod config;
mod db;
mod error;
mod fixtures;
mod models;
mod realtime;
mod services;
mod state;
mod web;

// --- Imports ---
use crate::{
    config::Config,
    db::Store,
    services::{seed_service, student_service},
    state::AppState,
};
use axum::serve;
use std::env;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuração do Logging (Tracing) ---
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                env::var("RUST_LOG")
                    .unwrap_or_else(|_| "painel_alunos=debug,tower_http=info,sqlx=warn".into())
                    .into()
            }),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Iniciando painel de alunos...");

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("Configuração inválida: {}", e))?;

    // --- Configuração da Base de Dados ---
    let store = match Store::open(&config).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("❌ Falha crítica ao inicializar a base de dados: {}", e);
            return Err(anyhow::anyhow!("Falha ao conectar/migrar DB: {}", e));
        }
    };

    // --- Seed (só escreve se a DB estiver vazia) ---
    if config.seed_on_start {
        match seed_service::seed_database(&store).await {
            Ok(outcome) => tracing::info!("🌱 Seed: {:?}", outcome),
            // O seed é tudo-ou-nada: nada ficou escrito, o servidor arranca na mesma
            Err(e) => tracing::error!("❌ Seed falhou e foi desfeito: {}", e),
        }
    }
    match student_service::count(&store).await {
        Ok(n) => tracing::info!("📋 {} alunos na base de dados.", n),
        Err(e) => tracing::warn!("Não foi possível contar os alunos: {}", e),
    }

    if config.fixture_fallback {
        tracing::warn!("⚠️ FIXTURE_FALLBACK ativo: falhas da DB no painel serão servidas com fixtures (marcadas como degradadas).");
    }

    // --- Criação do Estado da Aplicação ---
    let app_state = AppState {
        store: store.clone(),
        fixture_fallback: config.fixture_fallback,
    };

    // --- Configuração do Endereço e Listener ---
    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Falha ao iniciar listener em {}: {}", config.bind_addr, e);
            return Err(e.into());
        }
    };
    tracing::info!("📡 Servidor escutando em http://{}", config.bind_addr);

    let app = web::routes::create_router(app_state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    // --- Início do Servidor ---
    tracing::info!("👂 Servidor pronto para aceitar conexões...");
    let result = serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    store.close().await;

    if let Err(e) = result {
        tracing::error!("❌ Erro fatal no servidor: {}", e);
        return Err(e.into());
    }
    tracing::info!("👋 Servidor terminado.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao instalar handler de Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::warn!("Ctrl+C recebido, encerrando...");
}
