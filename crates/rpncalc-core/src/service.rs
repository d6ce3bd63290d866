// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Calculator orchestration.
//!
//! [`CalculatorService`] ties the evaluator, the shared operand stack and the
//! history store together for each request flow:
//!
//! | Flow | Steps |
//! |------|-------|
//! | calculate | lookup, arity check, evaluate, write INDEPENDENT history |
//! | push | append arguments to the stack |
//! | operate | lookup, pop arity operands, evaluate, write STACK history |
//! | pop | discard N values |
//! | size | read stack size |
//! | history | parse selectors, read from one backend |
//!
//! Operands popped by `operate` are consumed even when evaluation or the
//! history write fails afterwards; they are not pushed back.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::CalcError;
use crate::evaluator;
use crate::history::{Backend, Flavor, HistoryEntry, HistoryStore, OperationRecord};
use crate::operation::Operation;
use crate::stack::OperandStack;

/// Health report for the service and its stores.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// `ok` when both stores answer, `degraded` otherwise.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Milliseconds since the service was created.
    pub uptime_ms: i64,
    /// Relational store reachable.
    pub relational: bool,
    /// Document store reachable.
    pub document: bool,
    /// Current operand stack size.
    pub stack_size: usize,
}

/// Request orchestration over the shared stack and the history store.
pub struct CalculatorService {
    stack: Arc<OperandStack>,
    history: Arc<HistoryStore>,
    start_time: Instant,
    version: String,
}

impl CalculatorService {
    /// Create a service over an injected stack and history store.
    pub fn new(stack: Arc<OperandStack>, history: Arc<HistoryStore>) -> Self {
        Self {
            stack,
            history,
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// The shared operand stack.
    pub fn stack(&self) -> &Arc<OperandStack> {
        &self.stack
    }

    /// The history store.
    pub fn history_store(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Evaluate `operation` over `arguments` and record it as INDEPENDENT.
    #[instrument(skip(self, arguments), fields(args = arguments.len()))]
    pub async fn calculate(&self, operation: &str, arguments: &[i64]) -> Result<i64, CalcError> {
        let outcome = self.try_calculate(operation, arguments).await;
        log_outcome("calculate", &outcome);
        outcome
    }

    async fn try_calculate(&self, operation: &str, arguments: &[i64]) -> Result<i64, CalcError> {
        let op = Operation::lookup(operation)?;
        op.check_arity(arguments.len())?;
        let result = evaluator::evaluate(op, arguments)?;
        self.record(Flavor::Independent, op, arguments.to_vec(), result)
            .await
    }

    /// Push `arguments` onto the shared stack. Returns the new size.
    #[instrument(skip(self, arguments), fields(args = arguments.len()))]
    pub fn push(&self, arguments: &[i64]) -> usize {
        self.stack.push_all(arguments)
    }

    /// Apply `operation` to operands popped from the stack and record it as STACK.
    ///
    /// The first pushed operand is the first argument, so push `[10, 3]`
    /// followed by `minus` yields `7`.
    #[instrument(skip(self))]
    pub async fn operate(&self, operation: &str) -> Result<i64, CalcError> {
        let outcome = self.try_operate(operation).await;
        log_outcome("operate", &outcome);
        outcome
    }

    async fn try_operate(&self, operation: &str) -> Result<i64, CalcError> {
        let op = Operation::lookup(operation)?;
        let mut operands = self.stack.pop_for_operation(op.arity())?;
        // Popped top-first; evaluate in push order.
        operands.reverse();
        debug!(
            size_after = self.stack.size(),
            ?operands,
            "Operands taken from stack"
        );
        let result = evaluator::evaluate(op, &operands)?;
        self.record(Flavor::Stack, op, operands, result).await
    }

    /// Discard `count` values from the stack. Returns the new size.
    #[instrument(skip(self))]
    pub fn pop(&self, count: i64) -> Result<usize, CalcError> {
        let outcome = self.stack.pop_discard(count);
        if let Err(e) = &outcome {
            warn!(code = e.error_code(), error = %e, "Stack pop rejected");
        }
        outcome
    }

    /// Current stack size.
    pub fn size(&self) -> usize {
        self.stack.size()
    }

    /// Read history from the backend named by `backend`, optionally filtered by flavor.
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        backend: &str,
        flavor: Option<&str>,
    ) -> Result<Vec<OperationRecord>, CalcError> {
        let outcome = self.try_history(backend, flavor).await;
        if let Err(e) = &outcome {
            warn!(code = e.error_code(), error = %e, "History query failed");
        }
        outcome
    }

    async fn try_history(
        &self,
        backend: &str,
        flavor: Option<&str>,
    ) -> Result<Vec<OperationRecord>, CalcError> {
        let backend: Backend = backend.parse()?;
        let flavor = flavor.map(str::parse::<Flavor>).transpose()?;
        self.history.read(backend, flavor).await
    }

    /// Probe both stores.
    pub async fn health(&self) -> HealthReport {
        let relational = self
            .history
            .relational()
            .health_check()
            .await
            .unwrap_or(false);
        let document = self
            .history
            .document()
            .health_check()
            .await
            .unwrap_or(false);

        HealthReport {
            status: if relational && document { "ok" } else { "degraded" }.to_string(),
            version: self.version.clone(),
            uptime_ms: self.start_time.elapsed().as_millis() as i64,
            relational,
            document,
            stack_size: self.stack.size(),
        }
    }

    async fn record(
        &self,
        flavor: Flavor,
        operation: Operation,
        arguments: Vec<i64>,
        result: i64,
    ) -> Result<i64, CalcError> {
        let entry = HistoryEntry {
            flavor,
            operation,
            arguments,
            result,
        };
        let record = self.history.write(entry).await?;
        info!(
            id = record.id,
            flavor = %flavor,
            operation = %operation,
            result,
            "Operation performed"
        );
        Ok(result)
    }
}

fn log_outcome(flow: &str, outcome: &Result<i64, CalcError>) {
    if let Err(e) = outcome {
        warn!(flow, code = e.error_code(), error = %e, "Request failed");
    }
}
