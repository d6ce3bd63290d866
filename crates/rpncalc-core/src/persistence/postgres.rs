// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! PostgreSQL-backed relational store.
//!
//! Query functions take the pool directly so they can be reused by embedders
//! that manage their own pool; [`PostgresRelationalStore`] delegates to them.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::CalcError;
use crate::history::{Flavor, OperationRecord};

use super::{OperationRow, RelationalStore, rows_to_records};

/// Embedded PostgreSQL migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/postgresql");

/// PostgreSQL-backed relational store.
#[derive(Clone)]
pub struct PostgresRelationalStore {
    pool: PgPool,
}

impl PostgresRelationalStore {
    /// Wrap an existing pool. Migrations are not run.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `url` and run migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, CalcError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await
            .map_err(|e| CalcError::relational("connect", e))?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| CalcError::relational("migrate", e))?;

        Ok(Self { pool })
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Highest stored id, or 0 for an empty table.
pub async fn max_id(pool: &PgPool) -> Result<i64, CalcError> {
    let max: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(id), 0)::BIGINT FROM operations")
        .fetch_one(pool)
        .await
        .map_err(|e| CalcError::relational("max_id", e))?;
    Ok(max)
}

/// Insert one operation row under its explicit id.
pub async fn insert_operation(pool: &PgPool, record: &OperationRecord) -> Result<(), CalcError> {
    sqlx::query(
        r#"
        INSERT INTO operations (id, flavor, operation, result, arguments)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(record.id)
    .bind(record.flavor.as_str())
    .bind(&record.operation)
    .bind(record.result)
    .bind(&record.arguments)
    .execute(pool)
    .await
    .map_err(|e| CalcError::relational("insert", e))?;

    Ok(())
}

/// All rows of one flavor, ordered by id.
pub async fn list_operations_by_flavor(
    pool: &PgPool,
    flavor: Flavor,
) -> Result<Vec<OperationRecord>, CalcError> {
    let rows = sqlx::query_as::<_, OperationRow>(
        r#"
        SELECT id, flavor, operation, result, arguments
        FROM operations
        WHERE flavor = $1
        ORDER BY id ASC
        "#,
    )
    .bind(flavor.as_str())
    .fetch_all(pool)
    .await
    .map_err(|e| CalcError::relational("list_by_flavor", e))?;

    rows_to_records(rows)
}

/// Check database connectivity.
pub async fn health_check_db(pool: &PgPool) -> Result<bool, CalcError> {
    let row: (i32,) = sqlx::query_as("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| CalcError::relational("health_check", e))?;
    Ok(row.0 == 1)
}

#[async_trait::async_trait]
impl RelationalStore for PostgresRelationalStore {
    async fn max_id(&self) -> Result<i64, CalcError> {
        max_id(&self.pool).await
    }

    async fn insert(&self, record: &OperationRecord) -> Result<(), CalcError> {
        insert_operation(&self.pool, record).await
    }

    async fn list_by_flavor(&self, flavor: Flavor) -> Result<Vec<OperationRecord>, CalcError> {
        list_operations_by_flavor(&self.pool, flavor).await
    }

    async fn health_check(&self) -> Result<bool, CalcError> {
        health_check_db(&self.pool).await
    }
}
