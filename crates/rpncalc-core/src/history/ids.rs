// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Surrogate key allocation for history records.
//!
//! Two strategies exist and exactly one is configured per process:
//!
//! | Strategy | Behaviour under concurrent writers |
//! |----------|-------------------------------------|
//! | [`MaxPlusOneAllocator`] | Reads `MAX(id)` on every write. Two writers can read the same max; the loser fails on the relational primary key. |
//! | [`CounterAllocator`] | Seeds once from `MAX(id)`, then hands out ids under a lock. No duplicates within one process; ids burned by failed writes leave gaps. |

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::CalcError;
use crate::persistence::RelationalStore;

/// Source of ids for new history records.
#[async_trait]
pub trait IdAllocator: Send + Sync {
    /// Return the id for the next record.
    async fn next_id(&self, relational: &dyn RelationalStore) -> Result<i64, CalcError>;
}

/// Read the relational maximum and add one.
///
/// The read and the later insert are not atomic.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaxPlusOneAllocator;

#[async_trait]
impl IdAllocator for MaxPlusOneAllocator {
    async fn next_id(&self, relational: &dyn RelationalStore) -> Result<i64, CalcError> {
        let max = relational.max_id().await?;
        successor(max)
    }
}

/// In-process counter seeded from the relational maximum on first use.
#[derive(Debug, Default)]
pub struct CounterAllocator {
    last: Mutex<Option<i64>>,
}

impl CounterAllocator {
    /// Create an unseeded counter.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdAllocator for CounterAllocator {
    async fn next_id(&self, relational: &dyn RelationalStore) -> Result<i64, CalcError> {
        let mut last = self.last.lock().await;
        let current = match *last {
            Some(value) => value,
            None => {
                let seed = relational.max_id().await?;
                debug!(seed, "Id counter seeded from relational store");
                seed
            }
        };
        let next = successor(current)?;
        *last = Some(next);
        Ok(next)
    }
}

fn successor(id: i64) -> Result<i64, CalcError> {
    id.checked_add(1).ok_or_else(|| {
        CalcError::relational("allocate_id", format!("id space exhausted after {}", id))
    })
}
