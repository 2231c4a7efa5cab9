//! Error types for the rule engine

#[cfg(feature = "python")]
use pyo3::exceptions::{PyRuntimeError, PyValueError};
#[cfg(feature = "python")]
use pyo3::PyErr;
use thiserror::Error;

use crate::config::AttributeKind;

/// Main error type for the rule engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    #[error("Invalid value: {0}")]
    InvalidLiteral(String),

    #[error("Value for attribute {attribute} must be {expected}")]
    KindMismatch {
        attribute: String,
        expected: AttributeKind,
    },

    #[error("Malformed condition: {0}")]
    MalformedCondition(String),

    #[error("No rules to combine")]
    EmptyRuleSet,

    #[error("Invalid rule syntax, operator, or attribute: {0}")]
    InvalidSyntax(String),

    #[error("Unbalanced parentheses: {0}")]
    UnbalancedParentheses(String),

    #[error("Malformed rule tree: {0}")]
    MalformedTree(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
}

/// Which failure channel an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected by the pre-flight syntax gate
    Validation,
    /// Rejected while building the tree
    Parse,
    /// Structurally broken input that legitimate callers never produce
    Structural,
}

impl RuleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuleError::InvalidSyntax(_) | RuleError::UnbalancedParentheses(_) => {
                ErrorKind::Validation
            }
            RuleError::InvalidAttribute(_)
            | RuleError::InvalidOperator(_)
            | RuleError::InvalidLiteral(_)
            | RuleError::KindMismatch { .. }
            | RuleError::MalformedCondition(_)
            | RuleError::EmptyRuleSet => ErrorKind::Parse,
            RuleError::MalformedTree(_) | RuleError::InvalidSchema(_) => ErrorKind::Structural,
        }
    }

    /// True when the caller supplied a bad rule, as opposed to a broken tree or schema
    pub fn is_client_error(&self) -> bool {
        self.kind() != ErrorKind::Structural
    }
}

impl From<serde_json::Error> for RuleError {
    fn from(err: serde_json::Error) -> RuleError {
        RuleError::MalformedTree(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<RuleError> for PyErr {
    fn from(err: RuleError) -> PyErr {
        if err.is_client_error() {
            PyValueError::new_err(err.to_string())
        } else {
            PyRuntimeError::new_err(err.to_string())
        }
    }
}

/// Result type alias for the rule engine
pub type Result<T> = std::result::Result<T, RuleError>;
