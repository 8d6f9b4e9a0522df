//! Reader and sender configuration.
//!
//! Both configurations deserialize from JSON (every field has a default) and are
//! validated once, when a reader, sender or slicer is constructed. Invalid values
//! and incompatible combinations are reported as [`Error::Config`]; nothing is
//! silently defaulted after validation.
//!
//! ```
//! use chunkio::config::{Compression, Format, ReaderConfig};
//!
//! let config: ReaderConfig = serde_json::from_str(
//!     r#"{ "path": "/data/in", "format": "csv", "fields": ["id", "name"] }"#,
//! ).unwrap();
//! assert_eq!(config.format, Format::Csv);
//! assert_eq!(config.compression, Compression::None);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIB: usize = 1024 * 1024;

/// Smallest chunk accepted by object storage for every part but the last.
pub const MIN_CHUNK_SIZE_BYTES: usize = 5 * MIB;

/// Default upper bound for a single chunk handed to a destination.
pub const DEFAULT_CHUNK_SIZE_BYTES: usize = 100 * MIB;

pub const DEFAULT_SLICE_SIZE: u64 = 10_000_000;

pub const DEFAULT_CONCURRENCY: usize = 10;

/// Supported record formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// A single JSON document; arrays yield one record per element.
    Json,
    /// One JSON value per line.
    #[default]
    Ldjson,
    Csv,
    Tsv,
    /// Opaque lines wrapped as `{"data": "<line>"}`.
    Raw,
}

impl Format {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Ldjson => "ldjson",
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Raw => "raw",
        }
    }

    #[must_use]
    pub const fn is_delimited(self) -> bool {
        matches!(self, Self::Csv | Self::Tsv)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Self::Json),
            "ldjson" => Ok(Self::Ldjson),
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "raw" => Ok(Self::Raw),
            other => Err(Error::config(
                "format",
                format!(
                    "unsupported format {other:?}, expected one of json, ldjson, csv, tsv, raw"
                ),
            )),
        }
    }
}

/// Supported whole-payload compression codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Lz4,
}

impl Compression {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Lz4 => "lz4",
        }
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    /// File name suffix for payloads compressed with this codec.
    #[must_use]
    pub const fn extension(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Gzip => Some(".gz"),
            Self::Lz4 => Some(".lz4"),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "gzip" => Ok(Self::Gzip),
            "lz4" => Ok(Self::Lz4),
            other => Err(Error::config(
                "compression",
                format!("unsupported compression {other:?}, expected one of none, gzip, lz4"),
            )),
        }
    }
}

/// What to do with a record that fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectAction {
    /// Abort the whole slice with [`Error::Decode`].
    #[default]
    Throw,
    /// Log the failure and the offending input, then drop the record.
    Log,
    /// Drop the record silently.
    None,
}

impl FromStr for RejectAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "throw" => Ok(Self::Throw),
            "log" => Ok(Self::Log),
            "none" => Ok(Self::None),
            other => Err(Error::config(
                "on_reject_action",
                format!("unsupported action {other:?}, expected one of throw, log, none"),
            )),
        }
    }
}

/// Configuration shared by slicers and readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Directory, HDFS path, or `bucket/prefix` to read from.
    pub path: String,
    pub format: Format,
    pub compression: Compression,
    /// Target slice size in bytes.
    pub size: u64,
    pub line_delimiter: String,
    /// Defaults to `,` for csv and `\t` for tsv.
    pub field_delimiter: Option<String>,
    /// Column names for csv/tsv rows, in column order.
    pub fields: Vec<String>,
    /// Read every file as one slice.
    pub file_per_slice: bool,
    pub remove_header: bool,
    pub ignore_empty: bool,
    pub on_reject_action: RejectAction,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            format: Format::default(),
            compression: Compression::default(),
            size: DEFAULT_SLICE_SIZE,
            line_delimiter: "\n".to_string(),
            field_delimiter: None,
            fields: Vec::new(),
            file_per_slice: false,
            remove_header: true,
            ignore_empty: true,
            on_reject_action: RejectAction::default(),
        }
    }
}

impl ReaderConfig {
    #[must_use]
    pub fn new(path: impl Into<String>, format: Format) -> Self {
        Self {
            path: path.into(),
            format,
            ..Self::default()
        }
    }

    /// Whether every file is read as one whole slice.
    ///
    /// JSON documents cannot be split, and a compressed stream can only be
    /// decompressed from its first byte.
    #[must_use]
    pub fn whole_file_slices(&self) -> bool {
        self.file_per_slice || self.format == Format::Json || !self.compression.is_none()
    }

    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::config("size", "must be a positive number of bytes"));
        }
        validate_line_delimiter(&self.line_delimiter)?;
        if self.size <= self.line_delimiter.len() as u64 {
            return Err(Error::config("size", "must be longer than the line delimiter"));
        }
        resolve_field_delimiter(self.format, self.field_delimiter.as_deref())?;
        validate_compression(self.compression, self.file_per_slice)
    }

    /// Field delimiter byte in effect for csv/tsv.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configured delimiter is not usable.
    pub fn field_delimiter_byte(&self) -> Result<u8> {
        resolve_field_delimiter(self.format, self.field_delimiter.as_deref())
    }
}

/// Configuration of a chunked sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Base directory, HDFS path, or `bucket/prefix` to write to.
    pub path: String,
    /// Worker or sender id; becomes the file name stem.
    pub id: String,
    pub format: Format,
    pub compression: Compression,
    /// Emit one destination file per `send` call instead of appending.
    pub file_per_slice: bool,
    /// Projection and column order. Empty means every field.
    pub fields: Vec<String>,
    pub include_header: bool,
    pub line_delimiter: String,
    pub field_delimiter: Option<String>,
    /// Override for the derived file suffix; an empty string disables the suffix.
    pub extension: Option<String>,
    /// Route records by their `route` metadata into `<path>/<route>/`.
    pub dynamic_routing: bool,
    /// Upper bound on concurrent destinations and in-flight multipart parts.
    pub concurrency: usize,
    /// Target chunk size in bytes.
    pub chunk_size: usize,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            id: String::new(),
            format: Format::default(),
            compression: Compression::default(),
            file_per_slice: false,
            fields: Vec::new(),
            include_header: false,
            line_delimiter: "\n".to_string(),
            field_delimiter: None,
            extension: None,
            dynamic_routing: false,
            concurrency: DEFAULT_CONCURRENCY,
            chunk_size: DEFAULT_CHUNK_SIZE_BYTES,
        }
    }
}

impl SenderConfig {
    #[must_use]
    pub fn new(path: impl Into<String>, id: impl Into<String>, format: Format) -> Self {
        Self {
            path: path.into(),
            id: id.into(),
            format,
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::config("id", "a sender id is required to name files"));
        }
        if self.concurrency == 0 {
            return Err(Error::config("concurrency", "must be at least 1"));
        }
        if self.chunk_size == 0 {
            return Err(Error::config("chunk_size", "must be a positive number of bytes"));
        }
        validate_line_delimiter(&self.line_delimiter)?;
        resolve_field_delimiter(self.format, self.field_delimiter.as_deref())?;
        if self.format == Format::Json && !self.file_per_slice {
            return Err(Error::config(
                "file_per_slice",
                "json output is a single document and must be written one file per slice",
            ));
        }
        validate_compression(self.compression, self.file_per_slice)
    }

    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configured delimiter is not usable.
    pub fn field_delimiter_byte(&self) -> Result<u8> {
        resolve_field_delimiter(self.format, self.field_delimiter.as_deref())
    }
}

fn validate_line_delimiter(delimiter: &str) -> Result<()> {
    if delimiter.is_empty() {
        return Err(Error::config("line_delimiter", "must be a non-empty string"));
    }
    Ok(())
}

fn resolve_field_delimiter(format: Format, configured: Option<&str>) -> Result<u8> {
    let delimiter = match (format, configured) {
        (Format::Tsv, None | Some("\t")) => return Ok(b'\t'),
        (Format::Tsv, Some(other)) => {
            return Err(Error::config(
                "field_delimiter",
                format!("tsv always uses a tab, got {other:?}"),
            ));
        }
        (_, None) => return Ok(b','),
        (_, Some(d)) => d,
    };
    match delimiter.as_bytes() {
        [byte] => Ok(*byte),
        [] => Err(Error::config("field_delimiter", "must be a non-empty string")),
        _ if format.is_delimited() => Err(Error::config(
            "field_delimiter",
            format!("must be a single byte, got {delimiter:?}"),
        )),
        _ => Ok(b','),
    }
}

fn validate_compression(compression: Compression, file_per_slice: bool) -> Result<()> {
    if !compression.is_none() && !file_per_slice {
        return Err(Error::config(
            "file_per_slice",
            format!(
                "{compression} compression requires file_per_slice, \
                 a compressed file cannot be split"
            ),
        ));
    }
    crate::io::compression::Compressor::new(compression).map(|_| ())
}
