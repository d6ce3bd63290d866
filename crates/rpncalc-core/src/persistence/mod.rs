// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Persistence interfaces and backends for rpncalc-core.
//!
//! This module defines the two store abstractions the history layer writes
//! to, plus their backend implementations:
//!
//! | Trait | Backends |
//! |-------|----------|
//! | [`RelationalStore`] | [`SqliteRelationalStore`], [`PostgresRelationalStore`] |
//! | [`DocumentStore`] | [`RedisDocumentStore`], [`InMemoryDocumentStore`] |

pub mod memory;
pub mod postgres;
pub mod redis;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

pub use self::memory::InMemoryDocumentStore;
pub use self::postgres::PostgresRelationalStore;
pub use self::redis::RedisDocumentStore;
pub use self::sqlite::SqliteRelationalStore;

use crate::error::CalcError;
use crate::history::{Flavor, OperationRecord};

/// SQL store holding the authoritative id sequence.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Highest id stored, or 0 when the table is empty.
    async fn max_id(&self) -> Result<i64, CalcError>;

    /// Insert `record` under its explicit id.
    async fn insert(&self, record: &OperationRecord) -> Result<(), CalcError>;

    /// All records of one flavor, ordered by id.
    async fn list_by_flavor(&self, flavor: Flavor) -> Result<Vec<OperationRecord>, CalcError>;

    /// Check the store is reachable.
    async fn health_check(&self) -> Result<bool, CalcError>;
}

/// Document store mirroring the relational history.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert `record` under its explicit id. Existing ids are rejected.
    async fn insert(&self, record: &OperationRecord) -> Result<(), CalcError>;

    /// All records of one flavor, in insertion order.
    async fn list_by_flavor(&self, flavor: Flavor) -> Result<Vec<OperationRecord>, CalcError>;

    /// Check the store is reachable.
    async fn health_check(&self) -> Result<bool, CalcError>;
}

/// Row shape shared by the SQL backends.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OperationRow {
    pub id: i64,
    pub flavor: String,
    pub operation: String,
    pub result: i64,
    pub arguments: String,
}

impl TryFrom<OperationRow> for OperationRecord {
    type Error = CalcError;

    fn try_from(row: OperationRow) -> Result<Self, Self::Error> {
        let flavor = row
            .flavor
            .parse()
            .map_err(|_| CalcError::relational("decode", format!("bad flavor '{}'", row.flavor)))?;
        Ok(Self {
            id: row.id,
            flavor,
            operation: row.operation,
            result: row.result,
            arguments: row.arguments,
        })
    }
}

pub(crate) fn rows_to_records(rows: Vec<OperationRow>) -> Result<Vec<OperationRecord>, CalcError> {
    rows.into_iter().map(OperationRecord::try_from).collect()
}

/// Connect a relational store by URL scheme and run its migrations.
///
/// `sqlite:` URLs open SQLite, `postgres://` and `postgresql://` open PostgreSQL.
pub async fn connect_relational(
    url: &str,
    max_connections: u32,
) -> Result<Arc<dyn RelationalStore>, CalcError> {
    if url.starts_with("sqlite:") {
        info!("Using SQLite relational store");
        let store = SqliteRelationalStore::connect(url, max_connections).await?;
        Ok(Arc::new(store))
    } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        info!("Using PostgreSQL relational store");
        let store = PostgresRelationalStore::connect(url, max_connections).await?;
        Ok(Arc::new(store))
    } else {
        Err(CalcError::InvalidArgument {
            field: "database_url".to_string(),
            message: "expected a sqlite: or postgres:// URL".to_string(),
        })
    }
}

/// Connect a document store by URL scheme.
///
/// `redis://` and `rediss://` open Redis, `memory:` keeps documents in process.
pub async fn connect_document(url: &str) -> Result<Arc<dyn DocumentStore>, CalcError> {
    if url.starts_with("redis://") || url.starts_with("rediss://") {
        info!("Using Redis document store");
        let store = RedisDocumentStore::connect(url).await?;
        Ok(Arc::new(store))
    } else if url == "memory:" {
        info!("Using in-memory document store");
        Ok(Arc::new(InMemoryDocumentStore::new()))
    } else {
        Err(CalcError::InvalidArgument {
            field: "document_url".to_string(),
            message: "expected a redis://, rediss:// or memory: URL".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion() {
        let row = OperationRow {
            id: 3,
            flavor: "STACK".to_string(),
            operation: "pow".to_string(),
            result: 8,
            arguments: "[2,3]".to_string(),
        };
        let record = OperationRecord::try_from(row).unwrap();
        assert_eq!(record.flavor, Flavor::Stack);
        assert_eq!(record.argument_values().unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_row_conversion_rejects_unknown_flavor() {
        let row = OperationRow {
            id: 3,
            flavor: "BATCH".to_string(),
            operation: "pow".to_string(),
            result: 8,
            arguments: "[2,3]".to_string(),
        };
        assert!(OperationRecord::try_from(row).unwrap_err().is_persistence());
    }

    #[tokio::test]
    async fn test_connect_rejects_unknown_schemes() {
        assert!(matches!(
            connect_relational("mysql://localhost/db", 1).await,
            Err(CalcError::InvalidArgument { .. })
        ));
        assert!(matches!(
            connect_document("mongodb://localhost").await,
            Err(CalcError::InvalidArgument { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_memory_document_store() {
        let store = connect_document("memory:").await.unwrap();
        assert!(store.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_connect_in_memory_sqlite() {
        let store = connect_relational("sqlite::memory:", 1).await.unwrap();
        assert_eq!(store.max_id().await.unwrap(), 0);
    }
}
