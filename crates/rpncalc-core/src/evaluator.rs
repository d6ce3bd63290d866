// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Pure evaluation of registered operations.
//!
//! Integer arithmetic is 64-bit two's complement and wraps on overflow.
//! `pow` goes through `f64` and truncates back, so large results lose
//! precision and saturate at the `i64` bounds.

use tracing::trace;

use crate::error::CalcError;
use crate::operation::Operation;

type EvalFn = fn(&[i64]) -> Result<i64, CalcError>;

fn eval_fn(op: Operation) -> EvalFn {
    match op {
        Operation::Plus => |a: &[i64]| Ok(a[0].wrapping_add(a[1])),
        Operation::Minus => |a: &[i64]| Ok(a[0].wrapping_sub(a[1])),
        Operation::Times => |a: &[i64]| Ok(a[0].wrapping_mul(a[1])),
        Operation::Divide => divide,
        Operation::Pow => pow,
        Operation::Abs => |a: &[i64]| Ok(a[0].wrapping_abs()),
        Operation::Fact => factorial,
    }
}

/// Evaluate `op` over `args`.
///
/// `args` are in argument order: for two-operand operations `args[0]` is the
/// left-hand side (dividend, minuend, base) and `args[1]` the right-hand side.
pub fn evaluate(op: Operation, args: &[i64]) -> Result<i64, CalcError> {
    op.check_arity(args.len())?;
    let result = eval_fn(op)(args)?;
    trace!(operation = %op, ?args, result, "evaluated");
    Ok(result)
}

/// Look up `name` in the registry, then evaluate.
pub fn evaluate_named(name: &str, args: &[i64]) -> Result<i64, CalcError> {
    evaluate(Operation::lookup(name)?, args)
}

fn divide(args: &[i64]) -> Result<i64, CalcError> {
    let (x, y) = (args[0], args[1]);
    if y == 0 {
        return Err(CalcError::DivisionByZero);
    }
    Ok(x.wrapping_div(y))
}

fn pow(args: &[i64]) -> Result<i64, CalcError> {
    let (x, y) = (args[0] as f64, args[1] as f64);
    Ok(x.powf(y) as i64)
}

fn factorial(args: &[i64]) -> Result<i64, CalcError> {
    let n = args[0];
    if n < 0 {
        return Err(CalcError::NegativeFactorial { value: n });
    }
    let mut acc: i64 = 1;
    for k in 2..=n {
        acc = acc.wrapping_mul(k);
        // Once 2^64 divides the product every further term keeps it at zero.
        if acc == 0 {
            break;
        }
    }
    Ok(acc)
}
