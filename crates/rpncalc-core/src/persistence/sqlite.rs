// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! SQLite-backed relational store.

use std::path::Path;
use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::CalcError;
use crate::history::{Flavor, OperationRecord};

use super::{OperationRow, RelationalStore, rows_to_records};

/// Embedded SQLite migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/sqlite");

/// SQLite-backed relational store.
#[derive(Clone)]
pub struct SqliteRelationalStore {
    pool: SqlitePool,
}

impl SqliteRelationalStore {
    /// Wrap an existing pool. Migrations are not run.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `url`, creating the database file if missing, and run migrations.
    ///
    /// In-memory URLs are limited to a single long-lived connection, since each
    /// SQLite connection would otherwise open its own empty database.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, CalcError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| CalcError::relational("connect", e))?
            .create_if_missing(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let mut pool_options = SqlitePoolOptions::new().max_connections(if in_memory {
            1
        } else {
            max_connections.max(1)
        });
        if in_memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| CalcError::relational("connect", format!("{}: {}", url, e)))?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| CalcError::relational("migrate", e))?;

        Ok(Self { pool })
    }

    /// Open a database file, creating parent directories as needed.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let store = SqliteRelationalStore::from_path(".data/history.db").await?;
    /// ```
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, CalcError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalcError::relational(
                    "create_dir",
                    format!("Failed to create directory {:?}: {}", parent, e),
                )
            })?;
        }

        let url = format!("sqlite:{}", path.to_string_lossy());
        Self::connect(&url, 5).await
    }

    /// Fresh in-memory database with migrations applied.
    pub async fn in_memory() -> Result<Self, CalcError> {
        Self::connect("sqlite::memory:", 1).await
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl RelationalStore for SqliteRelationalStore {
    async fn max_id(&self) -> Result<i64, CalcError> {
        let max: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(id), 0) FROM operations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CalcError::relational("max_id", e))?;
        Ok(max)
    }

    async fn insert(&self, record: &OperationRecord) -> Result<(), CalcError> {
        sqlx::query(
            r#"
            INSERT INTO operations (id, flavor, operation, result, arguments)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id)
        .bind(record.flavor.as_str())
        .bind(&record.operation)
        .bind(record.result)
        .bind(&record.arguments)
        .execute(&self.pool)
        .await
        .map_err(|e| CalcError::relational("insert", e))?;

        Ok(())
    }

    async fn list_by_flavor(&self, flavor: Flavor) -> Result<Vec<OperationRecord>, CalcError> {
        let rows = sqlx::query_as::<_, OperationRow>(
            r#"
            SELECT id, flavor, operation, result, arguments
            FROM operations
            WHERE flavor = ?
            ORDER BY id ASC
            "#,
        )
        .bind(flavor.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CalcError::relational("list_by_flavor", e))?;

        rows_to_records(rows)
    }

    async fn health_check(&self) -> Result<bool, CalcError> {
        let row: (i64,) = sqlx::query_as("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CalcError::relational("health_check", e))?;
        Ok(row.0 == 1)
    }
}
