use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::models::{CacheEntry, FilterState};

const FIXTURES_KEY: &str = "fixtures_cache";
const FILTERS_KEY: &str = "view_filters";

/// Durable single-entry fixture cache plus saved filter inputs.
///
/// Backed by one SQLite key/value table. Unreadable or corrupt rows are
/// reported as absent.
pub struct CacheStore {
    pool: Pool<Sqlite>,
    expiry: Duration,
}

impl CacheStore {
    /// Open (or create) the store
    pub async fn new(database_url: &str, expiry: Duration) -> Result<Self> {
        // Create data directory if needed
        if let Some(path) = database_url.strip_prefix("sqlite:") {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .context("Failed to create database directory")?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .create_if_missing(true);

        // An in-memory database lives and dies with its one connection
        let in_memory = database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool, expiry };
        store.init_schema().await?;

        info!("Cache store initialized (expiry: {:?})", expiry);
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create kv_store table")?;

        Ok(())
    }

    /// Last stored fixture batch, if any can be read
    pub async fn get(&self) -> Option<CacheEntry> {
        let raw = match self.read_value(FIXTURES_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read fixture cache, treating as empty: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Corrupt fixture cache, treating as empty: {}", e);
                None
            }
        }
    }

    /// Replace the stored batch
    pub async fn put(&self, entry: &CacheEntry) -> Result<(), SyncError> {
        let json = serde_json::to_string(entry)
            .map_err(|e| SyncError::Store(format!("failed to serialize cache entry: {}", e)))?;
        self.write_value(FIXTURES_KEY, &json).await?;

        debug!(
            "Cached {} {} matches for {}",
            entry.matches.len(),
            entry.provider,
            entry.date
        );
        Ok(())
    }

    /// Whether `entry` is younger than the configured expiry at `now`
    pub fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        is_fresh(entry.fetched_at, now, self.expiry)
    }

    /// Saved filter inputs, defaulting to no filters
    pub async fn load_filters(&self) -> FilterState {
        match self.read_value(FILTERS_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Corrupt saved filters, resetting: {}", e);
                FilterState::default()
            }),
            Ok(None) => FilterState::default(),
            Err(e) => {
                warn!("Failed to read saved filters: {}", e);
                FilterState::default()
            }
        }
    }

    pub async fn save_filters(&self, filters: &FilterState) -> Result<(), SyncError> {
        let json = serde_json::to_string(filters)
            .map_err(|e| SyncError::Store(format!("failed to serialize filters: {}", e)))?;
        self.write_value(FILTERS_KEY, &json).await?;
        Ok(())
    }

    async fn read_value(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.0))
    }

    async fn write_value(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[cfg(test)]
    async fn write_raw(&self, key: &str, value: &str) {
        self.write_value(key, value).await.unwrap();
    }
}

/// Fresh for ages in `[0, expiry)`. A timestamp in the future counts as age zero.
pub fn is_fresh(fetched_at: DateTime<Utc>, now: DateTime<Utc>, expiry: Duration) -> bool {
    let age = now.signed_duration_since(fetched_at);
    match chrono::Duration::from_std(expiry) {
        Ok(expiry) => age < expiry,
        Err(_) => true,
    }
}
