// src/db.rs
use crate::{
    config::Config,
    error::AppResult,
    realtime::ChangeEvent,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration; // Usar std::time::Duration aqui
use tokio::sync::broadcast;

// Capacidade do canal de alterações; subscritores mais lentos recebem `Lagged`
const CHANGE_FEED_CAPACITY: usize = 256;

/// Ligação explícita à base de dados: pool de conexões + feed de alterações.
/// Clonar é barato (ambos são handles partilhados).
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    feed: broadcast::Sender<ChangeEvent>,
}

impl Store {
    /// Abre a base de dados indicada na configuração e aplica as migrações.
    pub async fn open(config: &Config) -> AppResult<Self> {
        tracing::info!("Ligando à base de dados: {}", config.database_url);

        // Opções de conexão (criar se não existir, timeout)
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Base de dados em memória (uma única conexão que nunca expira).
    #[cfg(test)]
    pub async fn open_in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> AppResult<Self> {
        tracing::info!("Executando migrações da base de dados...");
        // Executa automaticamente os ficheiros SQL em ./migrations
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrações concluídas.");

        let (feed, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Ok(Store { pool, feed })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Publica uma alteração para todos os subscritores.
    /// Sem subscritores o evento é simplesmente descartado.
    pub fn publish(&self, event: ChangeEvent) {
        tracing::trace!("Alteração publicada: {:?}", event);
        let _ = self.feed.send(event);
    }

    pub fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }

    /// Número de subscrições vivas no feed.
    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.feed.receiver_count()
    }

    /// Fecha o pool; pedidos posteriores falham com `PoolClosed`.
    pub async fn close(&self) {
        tracing::info!("Fechando ligação à base de dados...");
        self.pool.close().await;
    }
}
