use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::cafe::CafeCache;
use crate::clock::LocalClock;
use crate::config::{AppConfig, StoreBackend};
use crate::events::EventBus;
use crate::orders::ReadyBoard;
use crate::store::{memory::MemoryStore, postgres::PgStore, DocumentStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub clock: LocalClock,
    pub config: Arc<AppConfig>,
    pub cafe: CafeCache,
    pub board: ReadyBoard,
    pub events: EventBus,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store: Arc<dyn DocumentStore> = match (&config.backend, &config.database) {
            (StoreBackend::Postgres, Some(db)) => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(db.max_connections)
                    .connect(&db.url)
                    .await
                    .context("connecting to postgres")?;
                if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                    tracing::warn!(error = %e, "migrations failed");
                }
                Arc::new(PgStore::new(pool))
            }
            (StoreBackend::Postgres, None) => anyhow::bail!("postgres backend without DATABASE_URL"),
            (StoreBackend::Memory, _) => {
                info!("using in-memory store; nothing survives a restart");
                Arc::new(MemoryStore::new())
            }
        };

        let clock = LocalClock::system(config.utc_offset);
        Ok(Self::from_parts(store, clock, config).await)
    }

    pub async fn from_parts(
        store: Arc<dyn DocumentStore>,
        clock: LocalClock,
        config: Arc<AppConfig>,
    ) -> Self {
        let events = EventBus::new(config.event_capacity);
        let cafe = CafeCache::load(store.clone(), clock.clone(), events.clone()).await;
        let board = ReadyBoard::new(events.clone());
        Self {
            store,
            clock,
            config,
            cafe,
            board,
            events,
        }
    }

    /// Memory-backed state on a hand-driven clock at `hour:00` local on `date`.
    #[cfg(test)]
    pub async fn fake(date: time::Date, hour: u8) -> (Self, Arc<crate::clock::ManualTime>) {
        let config = AppConfig::in_memory();
        let time = Arc::new(crate::clock::ManualTime::local(date, hour, config.utc_offset));
        let clock = LocalClock::with_source(time.clone(), config.utc_offset);
        let state = Self::from_parts(Arc::new(MemoryStore::new()), clock, Arc::new(config)).await;
        (state, time)
    }
}
