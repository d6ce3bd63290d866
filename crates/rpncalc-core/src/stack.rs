// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared operand stack.
//!
//! One [`OperandStack`] is created per process and shared by every request
//! through an `Arc`. Each public method takes the lock once, so the size
//! check and the mutation of a logical call never interleave with another
//! call.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::CalcError;

/// LIFO sequence of integers guarded by a mutex.
#[derive(Debug, Default)]
pub struct OperandStack {
    values: Mutex<Vec<i64>>,
}

impl OperandStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the Vec half-mutated, so
    // a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Vec<i64>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push `values` in order; the last element ends on top. Returns the new size.
    pub fn push_all(&self, values: &[i64]) -> usize {
        let mut stack = self.lock();
        let before = stack.len();
        stack.extend_from_slice(values);
        debug!(before, after = stack.len(), pushed = values.len(), "stack push");
        stack.len()
    }

    /// Pop `arity` values, top first.
    ///
    /// The topmost value is element 0 of the returned vector. Fails without
    /// touching the stack when fewer than `arity` values are present.
    pub fn pop_for_operation(&self, arity: usize) -> Result<Vec<i64>, CalcError> {
        let mut stack = self.lock();
        let available = stack.len();
        if available < arity {
            return Err(CalcError::InsufficientOperands {
                required: arity,
                available,
            });
        }
        let popped: Vec<i64> = stack.drain(available - arity..).rev().collect();
        debug!(before = available, after = stack.len(), ?popped, "stack pop for operation");
        Ok(popped)
    }

    /// Discard `count` values from the top. Returns the new size.
    ///
    /// `count <= 0` is a no-op. Fails without touching the stack when
    /// `count` exceeds the current size.
    pub fn pop_discard(&self, count: i64) -> Result<usize, CalcError> {
        let mut stack = self.lock();
        let available = stack.len();
        if count <= 0 {
            return Ok(available);
        }
        let required = usize::try_from(count).unwrap_or(usize::MAX);
        if required > available {
            return Err(CalcError::InsufficientOperands {
                required,
                available,
            });
        }
        stack.truncate(available - required);
        debug!(before = available, after = stack.len(), "stack pop discard");
        Ok(stack.len())
    }

    /// Current number of values.
    pub fn size(&self) -> usize {
        self.lock().len()
    }

    /// Copy of the stack contents, bottom first.
    pub fn snapshot(&self) -> Vec<i64> {
        self.lock().clone()
    }
}
