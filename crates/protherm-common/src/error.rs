//! Error types for ProTherm enrichment

use thiserror::Error;

/// Result type alias for enrichment operations
pub type Result<T> = std::result::Result<T, ProthermError>;

/// Main error type for ProTherm enrichment
///
/// Row-level problems (unresolvable identifiers, failed lookups, bad
/// mutation descriptors) are not errors and never reach this type.
#[derive(Error, Debug)]
pub enum ProthermError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Table error: {0}")]
    Table(#[from] csv::Error),

    #[error("Column '{0}' not found in input table")]
    MissingColumn(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No data: {0}")]
    NoData(String),
}

impl ProthermError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a "no data" error
    pub fn no_data(msg: impl Into<String>) -> Self {
        Self::NoData(msg.into())
    }

    /// Whether this is the terminal "nothing to write" outcome
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData(_))
    }
}
