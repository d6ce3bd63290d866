// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! rpncalc - stateful arithmetic service
//!
//! Serves direct calculations and a shared operand stack over HTTP, recording
//! every successful evaluation in a relational and a document store.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use rpncalc_core::config::Config;
use rpncalc_core::history::HistoryStore;
use rpncalc_core::http;
use rpncalc_core::persistence::{connect_document, connect_relational};
use rpncalc_core::service::CalculatorService;
use rpncalc_core::stack::OperandStack;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (from crate directory or parent directories)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rpncalc_core=info".parse()?),
        )
        .init();

    info!("Starting rpncalc");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    info!(
        http_addr = %config.http_addr,
        id_allocation = ?config.id_allocation,
        max_connections = config.max_connections,
        "Configuration loaded"
    );

    // Connect to both history stores
    info!("Connecting to relational store...");
    let relational = connect_relational(&config.database_url, config.max_connections).await?;
    info!("Connecting to document store...");
    let document = connect_document(&config.document_url).await?;

    let history = HistoryStore::new(relational, document)
        .with_id_allocator(config.id_allocation.allocator());
    let service = Arc::new(CalculatorService::new(
        Arc::new(OperandStack::new()),
        Arc::new(history),
    ));

    let health = service.health().await;
    if health.status == "ok" {
        info!("Store health check passed");
    } else {
        warn!(
            relational = health.relational,
            document = health.document,
            "Store health check degraded"
        );
    }

    info!("rpncalc initialized successfully");

    http::serve(config.http_addr, service, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutting down...");
    })
    .await?;

    info!("Shutdown complete");
    Ok(())
}
