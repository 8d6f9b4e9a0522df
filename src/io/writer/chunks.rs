//! Splitting a formatted batch into transport-sized chunks.
//!
//! [`ChunkGenerator`] is a pull-based iterator with two strategies:
//!
//! - **whole payload**: format the whole batch, compress it, then cut the bytes
//!   into `chunk_size` pieces. Pieces may split a record.
//! - **row optimized** (ldjson without compression): format record by record and
//!   emit a chunk as soon as the next row would overflow `chunk_size`. Chunk
//!   boundaries always fall between records; a single oversized record becomes a
//!   chunk of its own.
//!
//! Either way `has_more` is false exactly on the last chunk, and an empty batch
//! yields no chunks at all.

use super::format::Formatter;
use crate::config::{Format, MIN_CHUNK_SIZE_BYTES};
use crate::error::Result;
use crate::io::compression::Compressor;
use crate::record::Record;

/// One bounded piece of a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position within the payload.
    pub index: u32,
    pub data: Vec<u8>,
    /// False on the last chunk of the payload.
    pub has_more: bool,
}

/// Target chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLimits {
    chunk_size: usize,
}

impl ChunkLimits {
    /// Chunk size raised to the 5 MiB multipart minimum.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(MIN_CHUNK_SIZE_BYTES),
        }
    }

    /// Chunk size taken as is, for destinations without a part-size minimum.
    #[must_use]
    pub fn exact(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

enum State<'a> {
    /// Payload not built yet.
    Pending,
    Whole {
        payload: Vec<u8>,
        offset: usize,
    },
    Rows {
        records: std::slice::Iter<'a, Record>,
        buffer: Vec<u8>,
        carry: Option<Vec<u8>>,
    },
    Done,
}

/// Lazily yields the chunks of one batch.
pub struct ChunkGenerator<'a> {
    formatter: &'a Formatter,
    compressor: &'a Compressor,
    records: &'a [Record],
    chunk_size: usize,
    index: u32,
    state: State<'a>,
}

impl<'a> ChunkGenerator<'a> {
    #[must_use]
    pub fn new(
        formatter: &'a Formatter,
        compressor: &'a Compressor,
        records: &'a [Record],
        limits: ChunkLimits,
    ) -> Self {
        let state = if records.is_empty() {
            State::Done
        } else if formatter.format_kind() == Format::Ldjson && compressor.kind().is_none() {
            State::Rows {
                records: records.iter(),
                buffer: Vec::new(),
                carry: None,
            }
        } else {
            State::Pending
        };
        Self {
            formatter,
            compressor,
            records,
            chunk_size: limits.chunk_size(),
            index: 0,
            state,
        }
    }

    /// Whether chunks are cut on record boundaries.
    #[must_use]
    pub fn is_row_optimized(&self) -> bool {
        matches!(self.state, State::Rows { .. })
    }

    fn emit(&mut self, data: Vec<u8>, has_more: bool) -> Chunk {
        let chunk = Chunk {
            index: self.index,
            data,
            has_more,
        };
        self.index += 1;
        chunk
    }

    fn next_whole(&mut self) -> Option<Result<Chunk>> {
        if matches!(self.state, State::Pending) {
            let payload = self
                .formatter
                .format(self.records)
                .and_then(|text| self.compressor.compress(text.as_bytes()));
            match payload {
                Ok(payload) if payload.is_empty() => self.state = State::Done,
                Ok(payload) => self.state = State::Whole { payload, offset: 0 },
                Err(err) => {
                    self.state = State::Done;
                    return Some(Err(err));
                }
            }
        }

        let State::Whole { payload, offset } = &mut self.state else {
            return None;
        };
        let start = *offset;
        let end = (start + self.chunk_size).min(payload.len());
        let data = payload[start..end].to_vec();
        *offset = end;
        let has_more = end < payload.len();
        if !has_more {
            self.state = State::Done;
        }
        Some(Ok(self.emit(data, has_more)))
    }

    fn next_row(&mut self) -> Option<Result<Chunk>> {
        loop {
            let State::Rows {
                records,
                buffer,
                carry,
            } = &mut self.state
            else {
                return None;
            };

            let row = match carry.take() {
                Some(row) => row,
                None => match records.next() {
                    Some(record) => match self.formatter.format_record(record) {
                        Ok(line) => line.into_bytes(),
                        Err(err) => {
                            self.state = State::Done;
                            return Some(Err(err));
                        }
                    },
                    None => {
                        let data = std::mem::take(buffer);
                        self.state = State::Done;
                        if data.is_empty() {
                            return None;
                        }
                        return Some(Ok(self.emit(data, false)));
                    }
                },
            };

            if !buffer.is_empty() && buffer.len() + row.len() > self.chunk_size {
                let data = std::mem::take(buffer);
                *carry = Some(row);
                return Some(Ok(self.emit(data, true)));
            }
            buffer.extend_from_slice(&row);
        }
    }
}

impl Iterator for ChunkGenerator<'_> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = match self.state {
            State::Done => None,
            State::Rows { .. } => self.next_row(),
            State::Pending | State::Whole { .. } => self.next_whole(),
        };
        if let Some(Ok(chunk)) = &chunk {
            log::debug!(
                "chunk {} ({} bytes, has_more: {})",
                chunk.index,
                chunk.data.len(),
                chunk.has_more
            );
        }
        chunk
    }
}
