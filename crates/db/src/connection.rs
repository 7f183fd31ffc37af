//! SQLite pool construction.
//!
//! Every connection is opened with foreign keys on, WAL journaling, and
//! a busy timeout, so concurrent quote writes queue instead of failing
//! with `SQLITE_BUSY`. Pool sizing and timeouts come from
//! [`DatabaseConfig`]; tests use [`connect_with_settings`] for small
//! in-memory pools.

use std::str::FromStr;
use std::time::Duration;

use roofline_core::config::DatabaseConfig;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};

pub type DbPool = sqlx::SqlitePool;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Open a pool sized and tuned from the application configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    open_pool(&config.url, config.max_connections, config.timeout_secs, config.busy_timeout_ms)
        .await
}

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    open_pool(database_url, max_connections, timeout_secs, DEFAULT_BUSY_TIMEOUT_MS).await
}

async fn open_pool(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
    busy_timeout_ms: u64,
) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_millis(busy_timeout_ms.max(1)));

    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .connect_with(options)
        .await
}
