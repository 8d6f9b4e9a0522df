//! Records flowing through readers and senders.

use crate::slice::FileSlice;
use serde::Serialize;
use serde_json::Value;

/// Provenance and routing metadata carried next to a record's data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordMeta {
    /// Source path the record was decoded from.
    pub path: Option<String>,
    /// Offset of the slice the record was decoded from.
    pub offset: Option<u64>,
    /// Length of the slice the record was decoded from.
    pub length: Option<u64>,
    /// Destination sub-path used when dynamic routing is enabled.
    pub route: Option<String>,
}

impl RecordMeta {
    #[must_use]
    pub fn from_slice(slice: &FileSlice) -> Self {
        Self {
            path: Some(slice.path.clone()),
            offset: Some(slice.offset),
            length: Some(slice.length),
            route: None,
        }
    }
}

/// A single JSON-shaped record plus its metadata.
///
/// Only `data` is serialized; metadata never leaks into output files.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Value,
    #[serde(skip)]
    pub meta: RecordMeta,
}

impl Record {
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self {
            data,
            meta: RecordMeta::default(),
        }
    }

    #[must_use]
    pub const fn with_meta(data: Value, meta: RecordMeta) -> Self {
        Self { data, meta }
    }

    #[must_use]
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.meta.route = Some(route.into());
        self
    }

    #[must_use]
    pub fn route(&self) -> Option<&str> {
        self.meta.route.as_deref()
    }

    /// Look up a top-level field of an object record.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }
}

impl From<Value> for Record {
    fn from(data: Value) -> Self {
        Self::new(data)
    }
}
