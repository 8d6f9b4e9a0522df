//! In-memory [`RangeFetch`] sources.

use crate::error::Result;
use crate::io::cloud::{ErrorKind, StorageError};
use crate::io::reader::RangeFetch;
use crate::slice::FileSlice;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves byte ranges of one in-memory file, whatever the slice's path.
#[derive(Debug, Default)]
pub struct MemoryFetch {
    data: Vec<u8>,
    calls: AtomicUsize,
}

impl MemoryFetch {
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of fetches served so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RangeFetch for MemoryFetch {
    fn fetch(&self, slice: &FileSlice) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let len = self.data.len();
        let start = usize::try_from(slice.offset).unwrap_or(usize::MAX).min(len);
        let end = usize::try_from(slice.offset.saturating_add(slice.length))
            .unwrap_or(usize::MAX)
            .min(len);
        Ok(self.data[start..end].to_vec())
    }
}

/// Replays scripted responses in order, ignoring the requested range.
///
/// Once the script is exhausted every further fetch returns an empty vector, the
/// end-of-source signal. With [`ScriptedFetch::failing_after`] the source fails
/// instead once the given number of fetches has been served.
#[derive(Debug, Default)]
pub struct ScriptedFetch {
    responses: Mutex<Vec<Vec<u8>>>,
    calls: AtomicUsize,
    fail_after: Option<usize>,
}

impl ScriptedFetch {
    #[must_use]
    pub fn new(mut responses: Vec<Vec<u8>>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            calls: AtomicUsize::new(0),
            fail_after: None,
        }
    }

    #[must_use]
    pub const fn failing_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RangeFetch for ScriptedFetch {
    fn fetch(&self, slice: &FileSlice) -> Result<Vec<u8>> {
        let served = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| served >= limit) {
            return Err(StorageError::new(
                ErrorKind::Network,
                format!("scripted failure reading {}@{}", slice.path, slice.offset),
            )
            .into());
        }
        Ok(self
            .responses
            .lock()
            .expect("script mutex poisoned")
            .pop()
            .unwrap_or_default())
    }
}
