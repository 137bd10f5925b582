use std::{str::FromStr, time::Duration};

use anyhow::{Context, Result};

const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// When unset the board serves an in-memory workbook.
    pub database_url: Option<String>,
    pub http_addr: String,
    pub cache_ttl: Duration,
    pub db_max_connections: u32,
    /// Sessions idle for longer than this lose their trend.
    pub session_idle: Duration,
}

impl ServiceConfig {
    pub fn from_env(default_http_addr: &str) -> Result<Self> {
        Self::from_lookup(default_http_addr, |key| std::env::var(key).ok())
    }

    pub fn from_lookup(
        default_http_addr: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let http_addr = lookup("HTTP_ADDR").unwrap_or_else(|| default_http_addr.to_string());

        let cache_ttl_secs = parse_or(&lookup, "CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;
        let db_max_connections =
            parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
        if db_max_connections == 0 {
            anyhow::bail!("DB_MAX_CONNECTIONS must be at least 1");
        }
        let session_idle_secs =
            parse_or(&lookup, "SESSION_IDLE_SECS", DEFAULT_SESSION_IDLE_SECS)?;
        if session_idle_secs == 0 {
            anyhow::bail!("SESSION_IDLE_SECS must be at least 1");
        }

        Ok(Self {
            database_url,
            http_addr,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            db_max_connections,
            session_idle: Duration::from_secs(session_idle_secs),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a whole number, got {raw:?}")),
        None => Ok(default),
    }
}
