//! Catalog provider error types.

use std::io;
use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors a catalog provider can report.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The environment could not be reached.
    #[error("connection to '{environment}' failed: {message}")]
    Connection { environment: String, message: String },

    /// A statistics or sampling query failed.
    #[error("query against '{environment}' failed: {message}")]
    Query { environment: String, message: String },

    /// No such environment is known to the provider.
    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    /// The environment has no table of that name.
    #[error("unknown table '{table}' in '{environment}'")]
    UnknownTable { environment: String, table: String },

    /// Failed to read an export from disk.
    #[error("failed to read export: {0}")]
    Io(#[from] io::Error),

    /// An export could not be decoded or failed validation.
    #[error("failed to decode export: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn connection(environment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            environment: environment.into(),
            message: message.into(),
        }
    }

    pub fn query(environment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            environment: environment.into(),
            message: message.into(),
        }
    }

    /// Whether retrying later could succeed. The engine itself never retries.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Io(_))
    }
}
