//! Configuration-time failures
//!
//! Per-item processing has no error channel: data anomalies are absorbed by
//! the stage that sees them. Only building or configuring a stage can fail.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for `{key}`: expected {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("value for `{key}` out of range: {value}")]
    OutOfRange { key: String, value: String },

    #[error("conflicting configuration: {0}")]
    Conflict(String),

    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("unknown candidate type: {0}")]
    UnknownCandidateType(String),

    #[error("missing configuration section: {0}")]
    MissingSection(String),
}

impl ConfigError {
    pub(crate) fn wrong_type(key: &str, expected: &'static str) -> Self {
        ConfigError::WrongType {
            key: key.to_string(),
            expected,
        }
    }

    pub(crate) fn out_of_range(key: &str, value: impl ToString) -> Self {
        ConfigError::OutOfRange {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}
