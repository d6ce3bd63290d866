// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use crate::history::{CounterAllocator, IdAllocator, MaxPlusOneAllocator};

/// Id allocation strategy for history records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdAllocation {
    /// Read the relational maximum on every write.
    #[default]
    MaxPlusOne,
    /// Seed an in-process counter once and serialize allocation.
    Counter,
}

impl IdAllocation {
    /// Build the allocator for this strategy.
    pub fn allocator(self) -> Arc<dyn IdAllocator> {
        match self {
            IdAllocation::MaxPlusOne => Arc::new(MaxPlusOneAllocator),
            IdAllocation::Counter => Arc::new(CounterAllocator::new()),
        }
    }
}

impl FromStr for IdAllocation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max-plus-one" => Ok(IdAllocation::MaxPlusOne),
            "counter" => Ok(IdAllocation::Counter),
            _ => Err(ConfigError::Invalid(
                "RPNCALC_ID_ALLOCATION",
                "must be 'max-plus-one' or 'counter'",
            )),
        }
    }
}

/// rpncalc configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite or PostgreSQL connection URL
    pub database_url: String,
    /// Redis URL, or `memory:` for the in-process document store
    pub document_url: String,
    /// HTTP listen address
    pub http_addr: SocketAddr,
    /// History id allocation strategy
    pub id_allocation: IdAllocation,
    /// Relational pool size
    pub max_connections: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `RPNCALC_DATABASE_URL`: SQLite or PostgreSQL connection string
    /// - `RPNCALC_DOCUMENT_URL`: Redis URL or `memory:`
    ///
    /// Optional (with defaults):
    /// - `RPNCALC_HTTP_PORT`: HTTP server port (default: 8080)
    /// - `RPNCALC_ID_ALLOCATION`: `max-plus-one` or `counter` (default: max-plus-one)
    /// - `RPNCALC_MAX_CONNECTIONS`: relational pool size (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("RPNCALC_DATABASE_URL")
            .map_err(|_| ConfigError::Missing("RPNCALC_DATABASE_URL"))?;

        let document_url = std::env::var("RPNCALC_DOCUMENT_URL")
            .map_err(|_| ConfigError::Missing("RPNCALC_DOCUMENT_URL"))?;

        let http_port: u16 = std::env::var("RPNCALC_HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("RPNCALC_HTTP_PORT", "must be a valid port number"))?;

        let id_allocation: IdAllocation = std::env::var("RPNCALC_ID_ALLOCATION")
            .unwrap_or_else(|_| "max-plus-one".to_string())
            .parse()?;

        let max_connections: u32 = std::env::var("RPNCALC_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::Invalid(
                "RPNCALC_MAX_CONNECTIONS",
                "must be a positive integer",
            ))?;

        Ok(Self {
            database_url,
            document_url,
            http_addr: SocketAddr::from(([0, 0, 0, 0], http_port)),
            id_allocation,
            max_connections,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
