//! Sending record batches to a destination.
//!
//! A backend only provides [`Destination`]; [`ChunkedSender`] does the rest:
//!
//! ```text
//! records -> routes -> (per route, bounded fan-out) name -> format -> compress -> chunk -> destination
//! ```

pub mod chunks;
pub mod format;
pub mod naming;

use crate::config::SenderConfig;
use crate::error::{Error, Result};
use crate::io::compression::Compressor;
use crate::record::Record;
use chunks::{ChunkGenerator, ChunkLimits};
use format::Formatter;
use naming::{destination_name, route_path};
use rayon::prelude::*;
use std::borrow::Cow;
use std::collections::HashMap;

pub use chunks::Chunk;

/// Write primitive implemented by each backend.
pub trait Destination: Send + Sync {
    /// Chunk limits for a configured chunk size.
    ///
    /// Defaults to the multipart minimum; destinations that only append may
    /// take the size as is.
    fn chunk_limits(&self, chunk_size: usize) -> ChunkLimits {
        ChunkLimits::new(chunk_size)
    }

    /// Whether a payload sent to an existing name extends it.
    ///
    /// A destination that replaces the whole file on every payload returns `false`
    /// and only accepts senders with `file_per_slice`.
    fn appends(&self) -> bool {
        true
    }

    /// Write every chunk of one payload to `name`, in order.
    ///
    /// # Errors
    ///
    /// Returns the first chunk generation or storage error.
    fn send_to_destination(&self, name: &str, chunks: ChunkGenerator<'_>) -> Result<()>;

    /// Make sure `path` exists and is writable.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the path cannot be prepared.
    fn verify(&self, path: &str) -> Result<()>;
}

impl<D: Destination + ?Sized> Destination for &D {
    fn chunk_limits(&self, chunk_size: usize) -> ChunkLimits {
        (**self).chunk_limits(chunk_size)
    }

    fn appends(&self) -> bool {
        (**self).appends()
    }

    fn send_to_destination(&self, name: &str, chunks: ChunkGenerator<'_>) -> Result<()> {
        (**self).send_to_destination(name, chunks)
    }

    fn verify(&self, path: &str) -> Result<()> {
        (**self).verify(path)
    }
}

/// Records of one `send` call grouped by destination base path.
#[derive(Debug, Clone, Default)]
pub struct RouteBatch<'a> {
    routes: Vec<(String, Cow<'a, [Record]>)>,
}

impl<'a> RouteBatch<'a> {
    /// Group `records` by route.
    ///
    /// Without dynamic routing every record goes to `base`. With it each record
    /// goes to `<base>/<route>`; records without a route stay in `base`. Routes
    /// keep first-seen order and records keep input order within a route.
    #[must_use]
    pub fn partition(records: &'a [Record], base: &str, dynamic_routing: bool) -> Self {
        if records.is_empty() {
            return Self::default();
        }
        if !dynamic_routing {
            return Self {
                routes: vec![(base.to_string(), Cow::Borrowed(records))],
            };
        }

        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut routes: Vec<(String, Cow<'a, [Record]>)> = Vec::new();
        for record in records {
            let path = record
                .route()
                .map_or_else(|| base.to_string(), |route| route_path(base, route));
            let pos = *positions.entry(path.clone()).or_insert_with(|| {
                routes.push((path, Cow::Owned(Vec::new())));
                routes.len() - 1
            });
            routes[pos].1.to_mut().push(record.clone());
        }
        Self { routes }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// `(base path, records)` pairs in first-seen order.
    #[must_use]
    pub fn routes(&self) -> &[(String, Cow<'a, [Record]>)] {
        &self.routes
    }
}

/// Formats, compresses and chunks record batches for one destination.
#[derive(Debug)]
pub struct ChunkedSender<D> {
    config: SenderConfig,
    destination: D,
    formatter: Formatter,
    compressor: Compressor,
    limits: ChunkLimits,
    slice_count: u64,
    pool: rayon::ThreadPool,
}

impl<D: Destination> ChunkedSender<D> {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` does not validate, or if it appends
    /// to a destination that cannot append.
    pub fn new(config: SenderConfig, destination: D) -> Result<Self> {
        let limits = destination.chunk_limits(config.chunk_size);
        Self::with_limits(config, destination, limits)
    }

    /// Like [`ChunkedSender::new`] with explicit chunk limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` does not validate, or if it appends
    /// to a destination that cannot append.
    pub fn with_limits(config: SenderConfig, destination: D, limits: ChunkLimits) -> Result<Self> {
        config.validate()?;
        if !config.file_per_slice && !destination.appends() {
            return Err(Error::config(
                "file_per_slice",
                "must be set for a destination that replaces files on every write",
            ));
        }
        let formatter = Formatter::new(&config)?;
        let compressor = Compressor::new(config.compression)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.concurrency)
            .thread_name(|i| format!("chunkio-send-{i}"))
            .build()
            .map_err(|e| Error::config("concurrency", e.to_string()))?;
        Ok(Self {
            config,
            destination,
            formatter,
            compressor,
            limits,
            slice_count: 0,
            pool,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &SenderConfig {
        &self.config
    }

    #[must_use]
    pub const fn destination(&self) -> &D {
        &self.destination
    }

    /// Number of `send` calls so far.
    #[must_use]
    pub const fn slice_count(&self) -> u64 {
        self.slice_count
    }

    /// Write one batch.
    ///
    /// Every call is one slice: with `file_per_slice` it produces new files named
    /// after the slice counter, otherwise it appends to the same files, and the
    /// csv/tsv header is only written by the first call.
    ///
    /// # Errors
    ///
    /// Returns the first error of any route. Other routes may have been written.
    pub fn send(&mut self, records: &[Record]) -> Result<()> {
        let slice = self.slice_count;
        self.slice_count += 1;

        let mut formatter = self.formatter.clone();
        if !self.config.file_per_slice && slice > 0 {
            formatter.set_include_header(false);
        }
        let batch = RouteBatch::partition(records, &self.config.path, self.config.dynamic_routing);
        let slice_tag = self.config.file_per_slice.then_some(slice);

        let config = &self.config;
        let destination = &self.destination;
        let compressor = &self.compressor;
        let limits = self.limits;
        let formatter = &formatter;
        self.pool.install(|| {
            batch.routes().par_iter().try_for_each(|(base, records)| {
                let name = destination_name(base, config, slice_tag);
                log::debug!("slice {slice}: sending {} records to {name}", records.len());
                let chunks = ChunkGenerator::new(formatter, compressor, records, limits);
                destination.send_to_destination(&name, chunks)
            })
        })
    }

    /// Prepare the base path, or the path of one route.
    ///
    /// # Errors
    ///
    /// Returns the destination's error.
    pub fn verify(&self, route: Option<&str>) -> Result<()> {
        let path = route.map_or_else(
            || self.config.path.clone(),
            |r| route_path(&self.config.path, r),
        );
        self.destination.verify(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Format;
    use serde_json::json;
    use std::sync::Mutex;

    /// Captures payloads per name.
    #[derive(Debug, Default)]
    struct Capture {
        sent: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl Destination for Capture {
        fn chunk_limits(&self, chunk_size: usize) -> ChunkLimits {
            ChunkLimits::exact(chunk_size)
        }

        fn send_to_destination(&self, name: &str, chunks: ChunkGenerator<'_>) -> Result<()> {
            let mut data = Vec::new();
            for chunk in chunks {
                data.extend(chunk?.data);
            }
            self.sent
                .lock()
                .expect("capture mutex poisoned")
                .push((name.to_string(), data));
            Ok(())
        }

        fn verify(&self, _path: &str) -> Result<()> {
            Ok(())
        }
    }

    fn sent(sender: &ChunkedSender<Capture>) -> Vec<(String, String)> {
        sender
            .destination()
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|(n, d)| (n.clone(), String::from_utf8(d.clone()).unwrap()))
            .collect()
    }

    #[test]
    fn partition_groups_by_route_in_first_seen_order() {
        let records = vec![
            Record::new(json!({"a": 1})).with_route("r2"),
            Record::new(json!({"a": 2})),
            Record::new(json!({"a": 3})).with_route("r1"),
            Record::new(json!({"a": 4})).with_route("r2"),
        ];
        let batch = RouteBatch::partition(&records, "/out", true);
        let names: Vec<&str> = batch.routes().iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(names, vec!["/out/r2", "/out", "/out/r1"]);
        assert_eq!(batch.routes()[0].1.len(), 2);

        let flat = RouteBatch::partition(&records, "/out", false);
        assert_eq!(flat.len(), 1);
        assert!(matches!(flat.routes()[0].1, Cow::Borrowed(_)));
        assert!(RouteBatch::partition(&[], "/out", true).is_empty());
    }

    #[test]
    fn csv_header_only_on_first_append() {
        let mut config = SenderConfig::new("/out", "w", Format::Csv);
        config.include_header = true;
        let mut sender = ChunkedSender::new(config, Capture::default()).unwrap();
        let records = vec![Record::new(json!({"a": 1}))];
        sender.send(&records).unwrap();
        sender.send(&records).unwrap();
        let sent = sent(&sender);
        assert_eq!(sent[0], ("/out/w.csv".to_string(), "a\n1\n".to_string()));
        assert_eq!(sent[1], ("/out/w.csv".to_string(), "1\n".to_string()));
        assert_eq!(sender.slice_count(), 2);
    }

    #[test]
    fn file_per_slice_names_and_headers() {
        let mut config = SenderConfig::new("/out", "w", Format::Csv);
        config.include_header = true;
        config.file_per_slice = true;
        let mut sender = ChunkedSender::new(config, Capture::default()).unwrap();
        let records = vec![Record::new(json!({"a": 1}))];
        sender.send(&records).unwrap();
        sender.send(&records).unwrap();
        let sent = sent(&sender);
        assert_eq!(sent[0], ("/out/w.0.csv".to_string(), "a\n1\n".to_string()));
        assert_eq!(sent[1], ("/out/w.1.csv".to_string(), "a\n1\n".to_string()));
    }

    #[test]
    fn invalid_config_fails_construction() {
        let config = SenderConfig::new("/out", "", Format::Ldjson);
        assert!(ChunkedSender::new(config, Capture::default()).unwrap_err().is_config());
    }
}
