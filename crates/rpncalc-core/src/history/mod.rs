// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Operation history written to a relational and a document store.
//!
//! # Write protocol
//!
//! 1. Allocate an id through the configured [`IdAllocator`].
//! 2. Insert into the relational store. A failure here is returned and the
//!    document store is not touched.
//! 3. Insert the same record, same id, into the document store. A failure
//!    here is returned too, but the relational row is already committed.
//!
//! There is no cross-store transaction. The stores can diverge when step 3
//! fails, and callers see the error.

pub mod ids;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::CalcError;
use crate::operation::Operation;
use crate::persistence::{DocumentStore, RelationalStore};

pub use self::ids::{CounterAllocator, IdAllocator, MaxPlusOneAllocator};

/// Classification of a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Flavor {
    /// Stateless single-call calculation.
    Independent,
    /// Calculation over operands taken from the shared stack.
    Stack,
}

impl Flavor {
    /// Both flavors in read-merge order.
    pub const ALL: [Flavor; 2] = [Flavor::Independent, Flavor::Stack];

    /// Stored representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Flavor::Independent => "INDEPENDENT",
            Flavor::Stack => "STACK",
        }
    }
}

impl FromStr for Flavor {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "independent" => Ok(Flavor::Independent),
            "stack" => Ok(Flavor::Stack),
            _ => Err(CalcError::InvalidArgument {
                field: "flavor".to_string(),
                message: format!("'{}' is not one of independent, stack", s),
            }),
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persistence target selectable at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// The SQL store.
    Relational,
    /// The document store.
    Document,
}

impl FromStr for Backend {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relational" | "sql" | "mysql" => Ok(Backend::Relational),
            "document" | "nosql" | "mongo" => Ok(Backend::Document),
            _ => Err(CalcError::UnknownPersistenceMethod {
                method: s.to_string(),
            }),
        }
    }
}

/// Result of one successful evaluation, before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Which request flow produced the result.
    pub flavor: Flavor,
    /// Evaluated operation.
    pub operation: Operation,
    /// Arguments in evaluation order.
    pub arguments: Vec<i64>,
    /// Evaluation result.
    pub result: i64,
}

/// Persisted form of a [`HistoryEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    /// Surrogate key shared by both stores.
    pub id: i64,
    /// Request flow classification.
    pub flavor: Flavor,
    /// Canonical operation name.
    pub operation: String,
    /// Evaluation result.
    pub result: i64,
    /// Arguments encoded as a JSON array, e.g. `"[10,3]"`.
    pub arguments: String,
}

impl OperationRecord {
    /// Build the record for `entry` under `id`.
    pub fn from_entry(id: i64, entry: &HistoryEntry) -> Result<Self, CalcError> {
        Ok(Self {
            id,
            flavor: entry.flavor,
            operation: entry.operation.name().to_string(),
            result: entry.result,
            arguments: serde_json::to_string(&entry.arguments)?,
        })
    }

    /// Decode the stored argument list.
    pub fn argument_values(&self) -> Result<Vec<i64>, CalcError> {
        Ok(serde_json::from_str(&self.arguments)?)
    }

    /// Whether this record was built from `entry`, ignoring the id.
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        self.flavor == entry.flavor
            && self.operation == entry.operation.name()
            && self.result == entry.result
            && self
                .argument_values()
                .is_ok_and(|args| args == entry.arguments)
    }
}

/// Dual-write, single-read facade over the two stores.
pub struct HistoryStore {
    relational: Arc<dyn RelationalStore>,
    document: Arc<dyn DocumentStore>,
    ids: Arc<dyn IdAllocator>,
}

impl HistoryStore {
    /// Create a history store using [`MaxPlusOneAllocator`].
    pub fn new(relational: Arc<dyn RelationalStore>, document: Arc<dyn DocumentStore>) -> Self {
        Self {
            relational,
            document,
            ids: Arc::new(MaxPlusOneAllocator),
        }
    }

    /// Replace the id allocation strategy.
    pub fn with_id_allocator(mut self, ids: Arc<dyn IdAllocator>) -> Self {
        self.ids = ids;
        self
    }

    /// The relational store.
    pub fn relational(&self) -> &Arc<dyn RelationalStore> {
        &self.relational
    }

    /// The document store.
    pub fn document(&self) -> &Arc<dyn DocumentStore> {
        &self.document
    }

    /// Persist `entry` to the relational store, then the document store.
    #[instrument(skip(self, entry), fields(flavor = %entry.flavor, operation = %entry.operation))]
    pub async fn write(&self, entry: HistoryEntry) -> Result<OperationRecord, CalcError> {
        let id = self.ids.next_id(self.relational.as_ref()).await?;
        let record = OperationRecord::from_entry(id, &entry)?;

        self.relational.insert(&record).await.inspect_err(|e| {
            warn!(id, error = %e, "Relational history write failed");
        })?;
        debug!(id, "Relational history write committed");

        if let Err(e) = self.document.insert(&record).await {
            warn!(
                id,
                error = %e,
                "Document history write failed after relational commit; stores diverge"
            );
            return Err(e);
        }

        info!(id, result = record.result, "Operation recorded");
        Ok(record)
    }

    /// Read history from `backend`.
    ///
    /// Without a filter the result is every INDEPENDENT record followed by
    /// every STACK record, regardless of write order.
    #[instrument(skip(self))]
    pub async fn read(
        &self,
        backend: Backend,
        flavor: Option<Flavor>,
    ) -> Result<Vec<OperationRecord>, CalcError> {
        let flavors = match flavor {
            Some(flavor) => vec![flavor],
            None => Flavor::ALL.to_vec(),
        };

        let mut records = Vec::new();
        for flavor in flavors {
            let group = match backend {
                Backend::Relational => self.relational.list_by_flavor(flavor).await?,
                Backend::Document => self.document.list_by_flavor(flavor).await?,
            };
            records.extend(group);
        }

        debug!(count = records.len(), "History read");
        Ok(records)
    }
}
