//! Handling of records that fail to decode.
//!
//! The reader applies the configured [`RejectAction`] to every malformed record:
//!
//! - `throw` aborts the slice with [`Error::Decode`],
//! - `log` writes a warning through the `log` facade and, when one is attached,
//!   appends a [`RejectedRecord`] to a shared [`RejectCollector`],
//! - `none` drops the record silently.
//!
//! ```
//! use chunkio::reject::RejectCollector;
//! use std::sync::{Arc, Mutex};
//!
//! let collector = Arc::new(Mutex::new(RejectCollector::new()));
//! // hand a clone to ChunkedReader::with_collector, then after reading:
//! assert_eq!(collector.lock().unwrap().reject_count(), 0);
//! ```

use crate::config::RejectAction;
use crate::error::{Error, Result};
use crate::slice::FileSlice;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Shared handle to a collector, as passed to readers.
pub type SharedCollector = Arc<Mutex<RejectCollector>>;

/// A rejected record with the slice it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub path: String,
    pub offset: u64,
    /// Why decoding failed.
    pub reason: String,
    /// The offending raw input.
    pub input: String,
}

impl fmt::Display for RejectedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}: {} (input: {:?})",
            self.path, self.offset, self.reason, self.input
        )
    }
}

/// Collects rejected records for batch reporting.
#[derive(Debug, Clone, Default)]
pub struct RejectCollector {
    rejects: Vec<RejectedRecord>,
}

impl RejectCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a new collector for sharing with a reader.
    #[must_use]
    pub fn shared() -> SharedCollector {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn add(&mut self, reject: RejectedRecord) {
        self.rejects.push(reject);
    }

    #[must_use]
    pub fn reject_count(&self) -> usize {
        self.rejects.len()
    }

    #[must_use]
    pub fn rejects(&self) -> &[RejectedRecord] {
        &self.rejects
    }

    /// Export rejects to JSON format.
    ///
    /// # Errors
    ///
    /// Returns the serializer error.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.rejects)
    }
}

impl fmt::Display for RejectCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RejectCollector({} rejects)", self.reject_count())
    }
}

/// Applies a [`RejectAction`] to decode failures of one reader.
#[derive(Debug, Clone)]
pub struct RejectPolicy {
    action: RejectAction,
    collector: Option<SharedCollector>,
}

impl RejectPolicy {
    #[must_use]
    pub const fn new(action: RejectAction, collector: Option<SharedCollector>) -> Self {
        Self { action, collector }
    }

    #[must_use]
    pub const fn action(&self) -> RejectAction {
        self.action
    }

    /// Returns `Ok(None)` when the record is dropped, so callers can map the
    /// outcome straight into their `Option<Record>` output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] when the action is `throw`.
    pub fn reject<T>(
        &self,
        slice: &FileSlice,
        reason: impl fmt::Display,
        input: &str,
    ) -> Result<Option<T>> {
        match self.action {
            RejectAction::Throw => Err(Error::Decode {
                path: slice.path.clone(),
                offset: slice.offset,
                reason: reason.to_string(),
            }),
            RejectAction::Log => {
                let reject = RejectedRecord {
                    path: slice.path.clone(),
                    offset: slice.offset,
                    reason: reason.to_string(),
                    input: input.to_string(),
                };
                log::warn!("rejected record: {reject}");
                if let Some(collector) = &self.collector {
                    collector
                        .lock()
                        .expect("reject collector mutex poisoned")
                        .add(reject);
                }
                Ok(None)
            }
            RejectAction::None => Ok(None),
        }
    }
}
