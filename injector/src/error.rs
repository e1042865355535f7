//! Injector-specific error types

use shared::SharedError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InjectorError {
    /// The store handle is unavailable. Fatal at startup; elsewhere the
    /// affected scope is skipped for the current cycle.
    #[error("store is not connected")]
    NotConnected,

    #[error("{operation} failed: {message}")]
    QueryFailed { operation: String, message: String },

    #[error("zip code {zip_code} not found in timezone cache")]
    ZipCodeNotFound { zip_code: String },

    #[error("unknown time zone: {time_zone}")]
    UnknownTimeZone { time_zone: String },

    #[error("invalid configuration: {field}")]
    Configuration { field: String },

    #[error("shared component error")]
    Shared(#[from] SharedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InjectorError {
    /// Transient store failure, tagged with the operation that failed.
    pub fn query(operation: impl Into<String>, error: impl std::fmt::Display) -> Self {
        InjectorError::QueryFailed {
            operation: operation.into(),
            message: error.to_string(),
        }
    }

    pub fn config(field: impl Into<String>) -> Self {
        InjectorError::Configuration { field: field.into() }
    }
}

pub type InjectorResult<T> = Result<T, InjectorError>;
