use anyhow::{bail, Context};
use serde::Deserialize;
use time::UtcOffset;

use crate::rights::ledger::Locale;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: StoreBackend,
    /// Only read when `backend` is postgres.
    pub database: Option<DatabaseConfig>,
    pub utc_offset: UtcOffset,
    pub event_capacity: usize,
    /// Language of customer-facing rights reasons.
    pub locale: Locale,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".into())
            .to_ascii_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => bail!("unknown STORE_BACKEND {other:?} (expected postgres or memory)"),
        };

        let database = match backend {
            StoreBackend::Postgres => Some(DatabaseConfig {
                url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(10),
            }),
            StoreBackend::Memory => None,
        };

        let offset_hours = std::env::var("CAFE_UTC_OFFSET_HOURS")
            .ok()
            .and_then(|v| v.parse::<i8>().ok())
            .unwrap_or(3);
        let utc_offset = UtcOffset::from_hms(offset_hours, 0, 0)
            .with_context(|| format!("CAFE_UTC_OFFSET_HOURS out of range: {offset_hours}"))?;

        let event_capacity = std::env::var("EVENT_BUFFER")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(256);

        let locale = match std::env::var("CAFE_LOCALE") {
            Ok(raw) => raw.parse::<Locale>().map_err(anyhow::Error::msg)?,
            Err(_) => Locale::default(),
        };

        Ok(Self {
            backend,
            database,
            utc_offset,
            event_capacity,
            locale,
        })
    }

    /// In-memory settings at the default +03:00 offset.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database: None,
            utc_offset: UtcOffset::from_whole_seconds(3 * 3600).unwrap_or(UtcOffset::UTC),
            event_capacity: 256,
            locale: Locale::default(),
        }
    }
}
