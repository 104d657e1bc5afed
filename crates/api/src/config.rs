//! Environment configuration for the API binary.

use anyhow::Context;
use chrono::FixedOffset;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address, `BIND_ADDR` (default `0.0.0.0:8080`).
    pub bind_addr: String,
    /// Postgres connection string, `DATABASE_URL`. Unset means the in-memory
    /// store (dev/test).
    pub database_url: Option<String>,
    /// Zone for calendar-day queries, `TZ_OFFSET_MINUTES` east of UTC
    /// (default 0).
    pub tz_offset_minutes: i32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let database_url = std::env::var("DATABASE_URL").ok();
        let tz_offset_minutes = match std::env::var("TZ_OFFSET_MINUTES") {
            Ok(raw) => raw
                .parse::<i32>()
                .with_context(|| format!("TZ_OFFSET_MINUTES is not an integer: {raw:?}"))?,
            Err(_) => 0,
        };
        let config = Self {
            bind_addr,
            database_url,
            tz_offset_minutes,
        };
        config.zone()?;
        Ok(config)
    }

    pub fn zone(&self) -> anyhow::Result<FixedOffset> {
        FixedOffset::east_opt(self.tz_offset_minutes * 60).ok_or_else(|| {
            anyhow::anyhow!(
                "TZ_OFFSET_MINUTES out of range: {}",
                self.tz_offset_minutes
            )
        })
    }
}
