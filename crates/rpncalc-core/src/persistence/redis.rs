// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Redis-backed document store.
//!
//! # Key layout
//!
//! | Key | Type | Content |
//! |-----|------|---------|
//! | `{prefix}:operation:{id}` | string | JSON-encoded [`OperationRecord`] |
//! | `{prefix}:operations:{FLAVOR}` | list | ids in insertion order |

use ::redis::AsyncCommands;
use ::redis::aio::ConnectionManager;
use tracing::debug;

use crate::error::CalcError;
use crate::history::{Flavor, OperationRecord};

use super::DocumentStore;

/// Default key prefix.
pub const DEFAULT_KEY_PREFIX: &str = "rpncalc";

/// Redis-backed document store.
#[derive(Clone)]
pub struct RedisDocumentStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisDocumentStore {
    /// Connect to `url` with the default key prefix.
    pub async fn connect(url: &str) -> Result<Self, CalcError> {
        Self::connect_with_prefix(url, DEFAULT_KEY_PREFIX).await
    }

    /// Connect to `url`, namespacing every key under `prefix`.
    pub async fn connect_with_prefix(url: &str, prefix: &str) -> Result<Self, CalcError> {
        let client =
            ::redis::Client::open(url).map_err(|e| CalcError::document("connect", e))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| CalcError::document("connect", e))?;
        Ok(Self {
            conn,
            prefix: prefix.to_string(),
        })
    }

    fn document_key(&self, id: i64) -> String {
        format!("{}:operation:{}", self.prefix, id)
    }

    fn flavor_key(&self, flavor: Flavor) -> String {
        format!("{}:operations:{}", self.prefix, flavor.as_str())
    }
}

#[async_trait::async_trait]
impl DocumentStore for RedisDocumentStore {
    async fn insert(&self, record: &OperationRecord) -> Result<(), CalcError> {
        let mut conn = self.conn.clone();
        let key = self.document_key(record.id);
        let document = serde_json::to_string(record)?;

        let reply: Option<String> = ::redis::cmd("SET")
            .arg(&key)
            .arg(&document)
            .arg("NX")
            .query_async(&mut conn)
            .await
            .map_err(|e| CalcError::document("insert", e))?;
        if reply.is_none() {
            return Err(CalcError::document(
                "insert",
                format!("document with id {} already exists", record.id),
            ));
        }

        let _: i64 = conn
            .rpush(self.flavor_key(record.flavor), record.id)
            .await
            .map_err(|e| CalcError::document("index", e))?;

        debug!(id = record.id, key = %key, "Document stored");
        Ok(())
    }

    async fn list_by_flavor(&self, flavor: Flavor) -> Result<Vec<OperationRecord>, CalcError> {
        let mut conn = self.conn.clone();
        let ids: Vec<i64> = conn
            .lrange(self.flavor_key(flavor), 0, -1)
            .await
            .map_err(|e| CalcError::document("list_by_flavor", e))?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| self.document_key(*id)).collect();
        let documents: Vec<Option<String>> = ::redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await
            .map_err(|e| CalcError::document("list_by_flavor", e))?;

        documents
            .into_iter()
            .flatten()
            .map(|doc| {
                serde_json::from_str::<OperationRecord>(&doc)
                    .map_err(|e| CalcError::document("decode", e))
            })
            .collect()
    }

    async fn health_check(&self) -> Result<bool, CalcError> {
        let mut conn = self.conn.clone();
        let pong: String = ::redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| CalcError::document("health_check", e))?;
        Ok(pong == "PONG")
    }
}
