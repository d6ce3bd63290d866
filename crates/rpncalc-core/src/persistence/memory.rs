// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-process document store.
//!
//! Keeps documents for the lifetime of the process only. Used for embedded
//! deployments without Redis and in tests.

use std::collections::HashSet;

use tokio::sync::RwLock;

use crate::error::CalcError;
use crate::history::{Flavor, OperationRecord};

use super::DocumentStore;

#[derive(Debug, Default)]
struct Documents {
    ids: HashSet<i64>,
    ordered: Vec<OperationRecord>,
}

/// Document store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    inner: RwLock<Documents>,
}

impl InMemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.inner.read().await.ordered.len()
    }

    /// Whether the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, record: &OperationRecord) -> Result<(), CalcError> {
        let mut docs = self.inner.write().await;
        if !docs.ids.insert(record.id) {
            return Err(CalcError::document(
                "insert",
                format!("document with id {} already exists", record.id),
            ));
        }
        docs.ordered.push(record.clone());
        Ok(())
    }

    async fn list_by_flavor(&self, flavor: Flavor) -> Result<Vec<OperationRecord>, CalcError> {
        let docs = self.inner.read().await;
        Ok(docs
            .ordered
            .iter()
            .filter(|r| r.flavor == flavor)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<bool, CalcError> {
        Ok(true)
    }
}
