//! Per-format decoding of reconstructed slices into records.
//!
//! Every decoder returns one `Option<Record>` per input record; `None` marks a
//! record that was dropped by the reject policy (or a detected csv header) and is
//! filtered out by the reader.

use super::margin::split_records;
use crate::config::{Format, ReaderConfig};
use crate::error::Result;
use crate::record::{Record, RecordMeta};
use crate::reject::RejectPolicy;
use crate::slice::FileSlice;
use serde_json::{Map, Value};

/// Decoder state derived once from a validated [`ReaderConfig`].
#[derive(Debug, Clone)]
pub struct Decoder {
    format: Format,
    line_delimiter: Vec<u8>,
    field_delimiter: u8,
    fields: Vec<String>,
    remove_header: bool,
    ignore_empty: bool,
    policy: RejectPolicy,
}

impl Decoder {
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the field delimiter is unusable.
    pub fn new(config: &ReaderConfig, policy: RejectPolicy) -> Result<Self> {
        Ok(Self {
            format: config.format,
            line_delimiter: config.line_delimiter.as_bytes().to_vec(),
            field_delimiter: config.field_delimiter_byte()?,
            fields: config.fields.clone(),
            remove_header: config.remove_header,
            ignore_empty: config.ignore_empty,
            policy,
        })
    }

    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Decode a reconstructed slice.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Decode`] for the first malformed record when the
    /// reject action is `throw`.
    pub fn decode(&self, data: &[u8], slice: &FileSlice) -> Result<Vec<Option<Record>>> {
        match self.format {
            Format::Json => self.decode_document(data, slice),
            Format::Raw => self.decode_records(data, slice, |text, meta, _| {
                Ok(Some(raw_record(text, meta)))
            }),
            Format::Ldjson => self.decode_records(data, slice, |text, meta, _| {
                self.decode_line(text, slice, meta)
            }),
            Format::Csv | Format::Tsv => {
                self.decode_records(data, slice, |text, meta, found_header| {
                    self.decode_row(text, slice, meta, found_header)
                })
            }
        }
    }

    /// Split a delimited slice and decode each record's text with `decode_one`.
    fn decode_records<D>(
        &self,
        data: &[u8],
        slice: &FileSlice,
        mut decode_one: D,
    ) -> Result<Vec<Option<Record>>>
    where
        D: FnMut(&str, &RecordMeta, &mut bool) -> Result<Option<Record>>,
    {
        let meta = RecordMeta::from_slice(slice);
        let mut found_header = false;
        split_records(data, &self.line_delimiter, slice)
            .into_iter()
            .map(|raw| match std::str::from_utf8(raw) {
                Ok(text) => decode_one(text, &meta, &mut found_header),
                Err(err) => self.policy.reject(slice, err, &String::from_utf8_lossy(raw)),
            })
            .collect()
    }

    fn decode_document(&self, data: &[u8], slice: &FileSlice) -> Result<Vec<Option<Record>>> {
        let meta = RecordMeta::from_slice(slice);
        match serde_json::from_slice::<Value>(data) {
            Ok(Value::Array(items)) => Ok(items
                .into_iter()
                .map(|item| Some(Record::with_meta(item, meta.clone())))
                .collect()),
            Ok(value) => Ok(vec![Some(Record::with_meta(value, meta))]),
            Err(err) => Ok(vec![
                self.policy
                    .reject(slice, err, &String::from_utf8_lossy(data))?,
            ]),
        }
    }

    fn decode_line(
        &self,
        text: &str,
        slice: &FileSlice,
        meta: &RecordMeta,
    ) -> Result<Option<Record>> {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Ok(Some(Record::with_meta(value, meta.clone()))),
            Err(err) => self.policy.reject(slice, err, text),
        }
    }

    fn decode_row(
        &self,
        text: &str,
        slice: &FileSlice,
        meta: &RecordMeta,
        found_header: &mut bool,
    ) -> Result<Option<Record>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .delimiter(self.field_delimiter)
            .from_reader(text.as_bytes());

        let row = match reader.records().next() {
            None => return Ok(None),
            Some(Ok(row)) => row,
            Some(Err(err)) => return self.policy.reject(slice, err, text),
        };

        let mut object = Map::new();
        for (i, value) in row.iter().enumerate() {
            if self.ignore_empty && value.is_empty() {
                continue;
            }
            let name = self
                .fields
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("field{}", i + 1));
            object.insert(name, Value::String(value.to_string()));
        }

        // at most one header row is expected per slice
        if self.remove_header && !*found_header && is_header_row(&object) {
            *found_header = true;
            return Ok(None);
        }
        Ok(Some(Record::with_meta(Value::Object(object), meta.clone())))
    }
}

fn raw_record(text: &str, meta: &RecordMeta) -> Record {
    let mut object = Map::new();
    object.insert("data".to_string(), Value::String(text.to_string()));
    Record::with_meta(Value::Object(object), meta.clone())
}

/// A row whose sorted values equal its sorted field names.
fn is_header_row(row: &Map<String, Value>) -> bool {
    let mut keys: Vec<&str> = row.keys().map(String::as_str).collect();
    let mut values: Vec<&str> = row.values().filter_map(Value::as_str).collect();
    if keys.is_empty() || keys.len() != values.len() {
        return false;
    }
    keys.sort_unstable();
    values.sort_unstable();
    keys == values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RejectAction;
    use crate::reject::RejectCollector;
    use serde_json::json;
    use std::sync::Arc;

    fn decoder(config: &ReaderConfig) -> Decoder {
        Decoder::new(config, RejectPolicy::new(config.on_reject_action, None)).unwrap()
    }

    fn whole(data: &[u8]) -> FileSlice {
        FileSlice::whole("/in/file", data.len() as u64)
    }

    fn values(records: Vec<Option<Record>>) -> Vec<Value> {
        records.into_iter().flatten().map(|r| r.data).collect()
    }

    #[test]
    fn raw_wraps_lines_with_provenance() {
        let config = ReaderConfig::new("/in", Format::Raw);
        let data = b"hello\nworld\n";
        let records = decoder(&config).decode(data, &whole(data)).unwrap();
        let first = records[0].as_ref().unwrap();
        assert_eq!(first.data, json!({"data": "hello"}));
        assert_eq!(first.meta.path.as_deref(), Some("/in/file"));
        assert_eq!(first.meta.offset, Some(0));
        assert_eq!(first.meta.length, Some(12));
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn json_array_yields_one_record_per_element() {
        let config = ReaderConfig::new("/in", Format::Json);
        let data = br#"[{"a":1},{"a":2}]"#;
        let out = values(decoder(&config).decode(data, &whole(data)).unwrap());
        assert_eq!(out, vec![json!({"a": 1}), json!({"a": 2})]);
    }

    #[test]
    fn json_object_is_a_single_record() {
        let config = ReaderConfig::new("/in", Format::Json);
        let data = br#"{"a":1}"#;
        let out = values(decoder(&config).decode(data, &whole(data)).unwrap());
        assert_eq!(out, vec![json!({"a": 1})]);
    }

    #[test]
    fn json_document_ignores_line_delimiters() {
        let config = ReaderConfig::new("/in", Format::Json);
        let data = b"[\n  {\"a\": 1},\n  {\"a\": 2}\n]\n";
        let out = values(decoder(&config).decode(data, &whole(data)).unwrap());
        assert_eq!(out, vec![json!({"a": 1}), json!({"a": 2})]);
    }

    #[test]
    fn csv_header_is_removed_once() {
        let mut config = ReaderConfig::new("/in", Format::Csv);
        config.fields = vec!["data1".into(), "data2".into()];
        let data = b"data1,data2\n1,2\n";
        let out = values(decoder(&config).decode(data, &whole(data)).unwrap());
        assert_eq!(out, vec![json!({"data1": "1", "data2": "2"})]);
    }

    #[test]
    fn csv_header_kept_when_not_removing() {
        let mut config = ReaderConfig::new("/in", Format::Csv);
        config.fields = vec!["a".into(), "b".into()];
        config.remove_header = false;
        let data = b"a,b\n1,2";
        let out = values(decoder(&config).decode(data, &whole(data)).unwrap());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn csv_values_are_trimmed_and_unnamed_columns_numbered() {
        let mut config = ReaderConfig::new("/in", Format::Csv);
        config.fields = vec!["name".into()];
        let data = b" alice , 30 ,\"x, y\"";
        let out = values(decoder(&config).decode(data, &whole(data)).unwrap());
        assert_eq!(
            out,
            vec![json!({"name": "alice", "field2": "30", "field3": "x, y"})]
        );
    }

    #[test]
    fn csv_ignore_empty_drops_blank_values() {
        let mut config = ReaderConfig::new("/in", Format::Csv);
        config.fields = vec!["a".into(), "b".into(), "c".into()];
        let data = b"1,,3";
        let out = values(decoder(&config).decode(data, &whole(data)).unwrap());
        assert_eq!(out, vec![json!({"a": "1", "c": "3"})]);

        config.ignore_empty = false;
        let out = values(decoder(&config).decode(data, &whole(data)).unwrap());
        assert_eq!(out, vec![json!({"a": "1", "b": "", "c": "3"})]);
    }

    #[test]
    fn tsv_uses_tabs() {
        let mut config = ReaderConfig::new("/in", Format::Tsv);
        config.fields = vec!["a".into(), "b".into()];
        let data = b"x y\tz";
        let out = values(decoder(&config).decode(data, &whole(data)).unwrap());
        assert_eq!(out, vec![json!({"a": "x y", "b": "z"})]);
    }

    #[test]
    fn ldjson_rejects_through_policy() {
        let mut config = ReaderConfig::new("/in", Format::Ldjson);
        config.on_reject_action = RejectAction::Log;
        let collector = RejectCollector::shared();
        let decoder = Decoder::new(
            &config,
            RejectPolicy::new(RejectAction::Log, Some(Arc::clone(&collector))),
        )
        .unwrap();
        let data = b"{\"a\":1}\n{oops\n{\"a\":3}\n";
        let records = decoder.decode(data, &whole(data)).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records[1].is_none());
        assert_eq!(collector.lock().unwrap().reject_count(), 1);
    }

    #[test]
    fn ldjson_throw_aborts() {
        let config = ReaderConfig::new("/in", Format::Ldjson);
        let data = b"{\"a\":1}\n{oops\n";
        assert!(decoder(&config).decode(data, &whole(data)).is_err());
    }

    #[test]
    fn header_detection_requires_matching_sets() {
        let row: Map<String, Value> =
            serde_json::from_value(json!({"a": "b", "b": "a"})).unwrap();
        assert!(is_header_row(&row));
        let row: Map<String, Value> =
            serde_json::from_value(json!({"a": "a", "b": "c"})).unwrap();
        assert!(!is_header_row(&row));
    }
}
