use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{PointsKey, TxId};

/// Key/value world state plus the log of transactions that wrote it.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredState {
    pub key: PointsKey,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct StoredTransaction {
    pub tx_id: TxId,
    pub function: String,
    pub key: PointsKey,
    pub committed_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to an in-memory url opens its own empty database.
        let pool_options = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM world_state")
            .fetch_one(&self.pool)
            .await
            .context("failed to count world state keys")?;
        Ok(count == 0)
    }

    pub async fn get_state(&self, key: &PointsKey) -> Result<Option<Vec<u8>>> {
        let row = sqlx::query("SELECT value FROM world_state WHERE key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read state for key '{key}'"))?;
        Ok(row.map(|r| r.get::<Vec<u8>, _>(0)))
    }

    /// Upserts `value` under `key` and appends the transaction to the log
    /// atomically. Returns the commit time.
    pub async fn put_state(
        &self,
        key: &PointsKey,
        value: &[u8],
        tx_id: &TxId,
        function: &str,
    ) -> Result<DateTime<Utc>> {
        let committed_at = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO world_state (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE
             SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key.as_str())
        .bind(value)
        .bind(committed_at)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to write state for key '{key}'"))?;

        sqlx::query(
            "INSERT INTO transactions (tx_id, function, key, committed_at) VALUES (?, ?, ?, ?)",
        )
        .bind(tx_id.as_str())
        .bind(function)
        .bind(key.as_str())
        .bind(committed_at)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to log transaction '{tx_id}'"))?;

        tx.commit().await?;
        Ok(committed_at)
    }

    /// Keys in `[start, end)`, compared as strings, ascending.
    pub async fn get_state_by_range(&self, start: &str, end: &str) -> Result<Vec<StoredState>> {
        let rows = sqlx::query(
            "SELECT key, value FROM world_state WHERE key >= ? AND key < ? ORDER BY key ASC",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to scan world state range '{start}'..'{end}'"))?;

        Ok(rows
            .into_iter()
            .map(|r| StoredState {
                key: PointsKey(r.get::<String, _>(0)),
                value: r.get::<Vec<u8>, _>(1),
            })
            .collect())
    }

    pub async fn transactions_for_key(
        &self,
        key: &PointsKey,
    ) -> Result<Vec<StoredTransaction>> {
        let rows = sqlx::query(
            "SELECT tx_id, function, key, committed_at FROM transactions
             WHERE key = ? ORDER BY seq ASC",
        )
        .bind(key.as_str())
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to list transactions for key '{key}'"))?;

        Ok(rows
            .into_iter()
            .map(|r| StoredTransaction {
                tx_id: TxId(r.get::<String, _>(0)),
                function: r.get::<String, _>(1),
                key: PointsKey(r.get::<String, _>(2)),
                committed_at: r.get::<DateTime<Utc>, _>(3),
            })
            .collect())
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_in_memory(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
