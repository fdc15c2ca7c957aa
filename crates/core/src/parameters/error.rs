//! Parameter error types
//!
//! Provides error types for parameter store operations.

use alloc::string::String;

/// Errors from parameter store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParameterError {
    /// Invalid configuration (e.g., unknown parameter, out-of-range value)
    #[error("invalid parameter configuration: {0}")]
    InvalidConfig(String),
    /// Required parameter was never defined
    #[error("required parameter <{0}> not defined")]
    Missing(String),
    /// Parameter holds a value of the wrong type
    #[error("parameter <{name}> malformed: expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    /// Read-only parameter cannot be modified
    #[error("parameter <{0}> is read-only")]
    ReadOnly(String),
}
