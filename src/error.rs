//! Error types for idcache.
//!
//! Cache bookkeeping never fails. Errors only come out of configuration
//! loading, and `IdCacheError::Loader` is offered to loaders that have no
//! error type of their own.

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for idcache operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum IdCacheError {
    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// A loader failed to produce a value.
    #[error("loader failed for {key}: {message}")]
    Loader {
        key: String,
        message: String,
    },

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl IdCacheError {
    pub fn loader(
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        IdCacheError::Loader {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl From<IdCacheError> for String {
    fn from(val: IdCacheError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for IdCacheError {
    fn from(error: std::io::Error) -> Self {
        IdCacheError::IoError(error.to_string())
    }
}

impl From<IdCacheError> for std::io::Error {
    fn from(val: IdCacheError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<toml::de::Error> for IdCacheError {
    fn from(error: toml::de::Error) -> Self {
        IdCacheError::Config(error.to_string())
    }
}
