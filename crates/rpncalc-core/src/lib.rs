// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! rpncalc Core - Stateful Arithmetic Service
//!
//! This crate evaluates integer arithmetic either directly or through a shared
//! operand stack, and records every successful evaluation in two history stores.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              HTTP Clients                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         CalculatorService                                │
//! │        calculate / push / operate / pop / size / history / health        │
//! └─────────────────────────────────────────────────────────────────────────┘
//!           │                        │                         │
//!           ▼                        ▼                         ▼
//! ┌───────────────────┐   ┌─────────────────────┐   ┌─────────────────────┐
//! │   OperandStack    │   │ Operation registry  │   │    HistoryStore     │
//! │  (mutex-guarded)  │   │    + Evaluator      │   │  (dual write, ids)  │
//! └───────────────────┘   └─────────────────────┘   └─────────────────────┘
//!                                                        │            │
//!                                                        ▼            ▼
//!                                              ┌──────────────┐ ┌──────────────┐
//!                                              │  Relational  │ │   Document   │
//!                                              │ SQLite / PG  │ │ Redis / mem  │
//!                                              └──────────────┘ └──────────────┘
//! ```
//!
//! # Operations
//!
//! | Name | Arity | Result |
//! |------|-------|--------|
//! | `plus` | 2 | `x + y` |
//! | `minus` | 2 | `x - y` |
//! | `times` | 2 | `x * y` |
//! | `divide` | 2 | `x / y`, truncated; fails when `y == 0` |
//! | `pow` | 2 | `x ^ y` through floating point |
//! | `abs` | 1 | `\|x\|` |
//! | `fact` | 1 | `x!`; fails when `x < 0` |
//!
//! Integer arithmetic wraps on overflow.
//!
//! ## Stack Semantics
//!
//! Values pushed as `[10, 3]` leave `3` on top. `operate("minus")` pops both
//! and evaluates `10 - 3`. Popped operands are not restored when evaluation
//! or recording fails.
//!
//! ## History
//!
//! Each successful evaluation is written to the relational store first, then
//! to the document store, under the same id. A failed relational write skips
//! the document write. Reads target one backend and return `INDEPENDENT`
//! records before `STACK` records unless filtered.
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `RPNCALC_DATABASE_URL` | Yes | - | SQLite or PostgreSQL connection string |
//! | `RPNCALC_DOCUMENT_URL` | Yes | - | Redis URL or `memory:` |
//! | `RPNCALC_HTTP_PORT` | No | `8080` | HTTP server port |
//! | `RPNCALC_ID_ALLOCATION` | No | `max-plus-one` | `max-plus-one` or `counter` |
//! | `RPNCALC_MAX_CONNECTIONS` | No | `5` | Relational pool size |
//!
//! # Modules
//!
//! - [`config`]: Server configuration from environment variables
//! - [`error`]: Error types with stable error codes
//! - [`evaluator`]: Pure evaluation of operations
//! - [`history`]: Dual-store history and id allocation
//! - [`operation`]: Operation registry
//! - [`persistence`]: Relational and document store backends
//! - [`service`]: Request orchestration
//! - [`stack`]: Shared operand stack

#![deny(missing_docs)]

/// Server configuration loaded from environment variables.
pub mod config;

/// Error types with stable error codes.
pub mod error;

/// Evaluation of registered operations.
pub mod evaluator;

/// Operation history records and the dual-write store.
pub mod history;

/// HTTP transport (routes, request and response bodies).
#[cfg(feature = "server")]
pub mod http;

/// Operation registry: names and arities.
pub mod operation;

/// Relational and document store backends.
pub mod persistence;

/// Calculator service orchestrating stack, evaluator and history.
pub mod service;

/// Mutex-guarded operand stack.
pub mod stack;
