// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for rpncalc-core integration tests.
//!
//! Provides TestContext for wiring a service over real stores.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rpncalc_core::history::{HistoryStore, IdAllocator};
use rpncalc_core::persistence::{InMemoryDocumentStore, SqliteRelationalStore};
use rpncalc_core::service::CalculatorService;
use rpncalc_core::stack::OperandStack;
use tempfile::TempDir;

/// Helper macro to skip tests if database URL is not set.
#[macro_export]
macro_rules! skip_if_no_db {
    () => {
        if std::env::var("TEST_DATABASE_URL").is_err() {
            eprintln!("Skipping test: TEST_DATABASE_URL not set");
            return;
        }
    };
}

/// Helper macro to skip tests if Redis URL is not set.
#[macro_export]
macro_rules! skip_if_no_redis {
    () => {
        if std::env::var("TEST_REDIS_URL").is_err() {
            eprintln!("Skipping test: TEST_REDIS_URL not set");
            return;
        }
    };
}

/// Service wired over a file-backed SQLite store and the in-memory document store.
pub struct TestContext {
    pub service: Arc<CalculatorService>,
    pub relational: Arc<SqliteRelationalStore>,
    pub document: Arc<InMemoryDocumentStore>,
    // Keeps the database file alive for the test.
    _dir: TempDir,
}

impl TestContext {
    /// Create a context with the default id allocator.
    pub async fn new() -> Self {
        Self::build(None).await
    }

    /// Create a context with a specific id allocator.
    pub async fn with_allocator(ids: Arc<dyn IdAllocator>) -> Self {
        Self::build(Some(ids)).await
    }

    async fn build(ids: Option<Arc<dyn IdAllocator>>) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let relational = Arc::new(
            SqliteRelationalStore::from_path(dir.path().join("history.db"))
                .await
                .expect("Failed to open SQLite store"),
        );
        let document = Arc::new(InMemoryDocumentStore::new());

        let mut history = HistoryStore::new(relational.clone(), document.clone());
        if let Some(ids) = ids {
            history = history.with_id_allocator(ids);
        }

        let service = Arc::new(CalculatorService::new(
            Arc::new(OperandStack::new()),
            Arc::new(history),
        ));

        Self {
            service,
            relational,
            document,
            _dir: dir,
        }
    }
}

/// Key prefix unique to one test run.
pub fn unique_prefix(test: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("rpncalc-test:{}:{}:{}", test, std::process::id(), nanos)
}
