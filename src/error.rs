//! Crate-wide error type.
//!
//! Errors fall into four families:
//! - **Configuration** errors are raised by constructors and never at use time.
//! - **Decode** errors are raised for a malformed record when the reject action is `throw`.
//! - **I/O and storage** errors come from the byte-fetch or send primitives and are
//!   propagated unchanged to the caller.
//! - **Codec** errors come from compression, JSON or CSV encoding.

use crate::io::cloud::StorageError;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or incompatible configuration, detected at construction.
    #[error("invalid configuration for `{field}`: {reason}")]
    Config { field: String, reason: String },

    /// A record could not be decoded and the reject action is `throw`.
    #[error("failed to decode record in {path} at offset {offset}: {reason}")]
    Decode {
        path: String,
        offset: u64,
        reason: String,
    },

    /// Local file system failure, annotated with what was being attempted.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Failure reported by a storage backend (HDFS, object storage).
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{codec} codec failed: {source}")]
    Compression {
        codec: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

/// Attach context to `std::io::Result` values, in the spirit of `anyhow::Context`.
pub trait IoContext<T> {
    /// # Errors
    ///
    /// Returns [`Error::Io`] carrying the lazily built context when `self` is an error.
    fn with_context<F, S>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn with_context<F, S>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| Error::io(context(), e))
    }
}
