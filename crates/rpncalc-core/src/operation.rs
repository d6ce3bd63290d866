// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Registry of supported operations.
//!
//! The operation set is closed: every name a caller can use maps to one
//! [`Operation`] variant, and every variant has a fixed arity.

use std::fmt;
use std::str::FromStr;

use crate::error::CalcError;

/// A supported arithmetic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `x + y`
    Plus,
    /// `x - y`
    Minus,
    /// `x * y`
    Times,
    /// `x / y`, truncating.
    Divide,
    /// `x ^ y`, computed in floating point and truncated.
    Pow,
    /// `|x|`
    Abs,
    /// `x!`
    Fact,
}

impl Operation {
    /// Every registered operation, in registry order.
    pub const ALL: [Operation; 7] = [
        Operation::Plus,
        Operation::Minus,
        Operation::Times,
        Operation::Divide,
        Operation::Pow,
        Operation::Abs,
        Operation::Fact,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Operation::Plus => "plus",
            Operation::Minus => "minus",
            Operation::Times => "times",
            Operation::Divide => "divide",
            Operation::Pow => "pow",
            Operation::Abs => "abs",
            Operation::Fact => "fact",
        }
    }

    /// Number of operands the operation consumes.
    pub fn arity(self) -> usize {
        match self {
            Operation::Plus
            | Operation::Minus
            | Operation::Times
            | Operation::Divide
            | Operation::Pow => 2,
            Operation::Abs | Operation::Fact => 1,
        }
    }

    /// Look up an operation by name, ignoring ASCII case and surrounding whitespace.
    pub fn lookup(name: &str) -> Result<Self, CalcError> {
        let normalized = name.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| CalcError::UnknownOperation {
                name: name.to_string(),
            })
    }

    /// Check an argument count against the registry arity.
    pub fn check_arity(self, actual: usize) -> Result<(), CalcError> {
        if actual != self.arity() {
            return Err(CalcError::ArityMismatch {
                operation: self.name().to_string(),
                expected: self.arity(),
                actual,
            });
        }
        Ok(())
    }
}

/// Arity of a named operation, or `None` when the name is not registered.
pub fn arity(name: &str) -> Option<usize> {
    Operation::lookup(name).ok().map(Operation::arity)
}

impl FromStr for Operation {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_table() {
        let expected = [
            ("plus", 2),
            ("minus", 2),
            ("times", 2),
            ("divide", 2),
            ("pow", 2),
            ("abs", 1),
            ("fact", 1),
        ];
        for (name, arity_value) in expected {
            assert_eq!(arity(name), Some(arity_value), "arity of {}", name);
        }
        assert_eq!(arity("sqrt"), None);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(Operation::lookup("PLUS").unwrap(), Operation::Plus);
        assert_eq!(Operation::lookup("Divide").unwrap(), Operation::Divide);
        assert_eq!(Operation::lookup(" fact ").unwrap(), Operation::Fact);
    }

    #[test]
    fn test_lookup_unknown_keeps_original_name() {
        let err = Operation::lookup("Bogus").unwrap_err();
        assert_eq!(
            err,
            CalcError::UnknownOperation {
                name: "Bogus".to_string()
            }
        );
    }

    #[test]
    fn test_check_arity() {
        assert!(Operation::Plus.check_arity(2).is_ok());
        assert_eq!(
            Operation::Abs.check_arity(2),
            Err(CalcError::ArityMismatch {
                operation: "abs".to_string(),
                expected: 1,
                actual: 2,
            })
        );
        assert!(Operation::Times.check_arity(0).is_err());
    }

    #[test]
    fn test_names_round_trip_through_from_str() {
        for op in Operation::ALL {
            assert_eq!(op.to_string().parse::<Operation>().unwrap(), op);
        }
    }
}
