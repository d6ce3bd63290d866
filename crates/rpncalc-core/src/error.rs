// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for rpncalc-core.
//!
//! Provides a unified error type that maps to the `errorMessage` failure shape
//! returned to callers.

use serde::Serialize;

/// Errors that can occur while evaluating, stacking, or persisting operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CalcError {
    /// The operation name is not in the registry.
    #[error("Unknown operation '{name}'")]
    UnknownOperation {
        /// The operation name as supplied by the caller.
        name: String,
    },

    /// The operation received the wrong number of arguments.
    #[error("Operation '{operation}' expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        /// The operation name.
        operation: String,
        /// Arity from the registry.
        expected: usize,
        /// Number of arguments supplied.
        actual: usize,
    },

    /// Integer division with a zero divisor.
    #[error("Division by zero")]
    DivisionByZero,

    /// Factorial of a negative number.
    #[error("Factorial of negative number {value} is undefined")]
    NegativeFactorial {
        /// The rejected argument.
        value: i64,
    },

    /// The operand stack holds fewer values than requested.
    #[error("Insufficient operands on stack: required {required}, available {available}")]
    InsufficientOperands {
        /// Number of values the call needed.
        required: usize,
        /// Stack size at the time of the call.
        available: usize,
    },

    /// The history backend selector is not recognised.
    #[error("Unknown persistence method '{method}'")]
    UnknownPersistenceMethod {
        /// The selector as supplied by the caller.
        method: String,
    },

    /// Input validation failed.
    #[error("Invalid value for '{field}': {message}")]
    InvalidArgument {
        /// The field that failed validation.
        field: String,
        /// The validation error message.
        message: String,
    },

    /// A relational or document store operation failed.
    #[error("Persistence error in {backend} store during '{operation}': {details}")]
    PersistenceError {
        /// Which store failed (`relational` or `document`).
        backend: String,
        /// The operation that failed.
        operation: String,
        /// Error details.
        details: String,
    },
}

/// Failure shape exposed to transport layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub error_message: String,
}

impl CalcError {
    /// Build a relational-store persistence error.
    pub fn relational(operation: impl Into<String>, details: impl ToString) -> Self {
        Self::PersistenceError {
            backend: "relational".to_string(),
            operation: operation.into(),
            details: details.to_string(),
        }
    }

    /// Build a document-store persistence error.
    pub fn document(operation: impl Into<String>, details: impl ToString) -> Self {
        Self::PersistenceError {
            backend: "document".to_string(),
            operation: operation.into(),
            details: details.to_string(),
        }
    }

    /// Convert this error to the failure body returned to callers.
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.error_code().to_string(),
            error_message: self.to_string(),
        }
    }

    /// Get the error code string for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownOperation { .. } => "UNKNOWN_OPERATION",
            Self::ArityMismatch { .. } => "ARITY_MISMATCH",
            Self::DivisionByZero => "DIVISION_BY_ZERO",
            Self::NegativeFactorial { .. } => "NEGATIVE_FACTORIAL",
            Self::InsufficientOperands { .. } => "INSUFFICIENT_OPERANDS",
            Self::UnknownPersistenceMethod { .. } => "UNKNOWN_PERSISTENCE_METHOD",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::PersistenceError { .. } => "PERSISTENCE_ERROR",
        }
    }

    /// Whether the error originates from a store rather than from the request.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::PersistenceError { .. })
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::PersistenceError {
            backend: "codec".to_string(),
            operation: "json".to_string(),
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_error_to_error_body_codes() {
        let test_cases = vec![
            (
                CalcError::UnknownOperation {
                    name: "bogus".to_string(),
                },
                "UNKNOWN_OPERATION",
            ),
            (
                CalcError::ArityMismatch {
                    operation: "plus".to_string(),
                    expected: 2,
                    actual: 3,
                },
                "ARITY_MISMATCH",
            ),
            (CalcError::DivisionByZero, "DIVISION_BY_ZERO"),
            (
                CalcError::NegativeFactorial { value: -1 },
                "NEGATIVE_FACTORIAL",
            ),
            (
                CalcError::InsufficientOperands {
                    required: 2,
                    available: 1,
                },
                "INSUFFICIENT_OPERANDS",
            ),
            (
                CalcError::UnknownPersistenceMethod {
                    method: "cassandra".to_string(),
                },
                "UNKNOWN_PERSISTENCE_METHOD",
            ),
            (
                CalcError::InvalidArgument {
                    field: "flavor".to_string(),
                    message: "unknown".to_string(),
                },
                "INVALID_ARGUMENT",
            ),
            (
                CalcError::relational("insert", "connection refused"),
                "PERSISTENCE_ERROR",
            ),
        ];

        for (error, expected_code) in test_cases {
            let body = error.to_error_body();
            assert_eq!(
                body.code, expected_code,
                "Error {:?} should have code {}",
                error, expected_code
            );
            assert!(
                !body.error_message.is_empty(),
                "Message should not be empty"
            );
        }
    }

    #[test]
    fn test_calc_error_display() {
        let err = CalcError::UnknownOperation {
            name: "bogus".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown operation 'bogus'");

        let err = CalcError::ArityMismatch {
            operation: "abs".to_string(),
            expected: 1,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Operation 'abs' expects 1 argument(s), got 2"
        );

        let err = CalcError::InsufficientOperands {
            required: 2,
            available: 0,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient operands on stack: required 2, available 0"
        );

        let err = CalcError::document("insert", "timeout");
        assert_eq!(
            err.to_string(),
            "Persistence error in document store during 'insert': timeout"
        );
    }

    #[test]
    fn test_error_body_serializes_error_message_in_camel_case() {
        let body = CalcError::DivisionByZero.to_error_body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "DIVISION_BY_ZERO");
        assert_eq!(json["errorMessage"], "Division by zero");
    }

    #[test]
    fn test_json_error_converts_through_question_mark() {
        fn decode(raw: &str) -> Result<Vec<i64>, CalcError> {
            Ok(serde_json::from_str(raw)?)
        }

        let err = decode("[1,").unwrap_err();
        assert!(err.is_persistence());
        assert!(matches!(
            err,
            CalcError::PersistenceError { ref backend, .. } if backend == "codec"
        ));
    }

    #[test]
    fn test_is_persistence() {
        assert!(CalcError::relational("max_id", "x").is_persistence());
        assert!(!CalcError::DivisionByZero.is_persistence());
    }
}
