//! Serialization of record batches, one encoder per output format.
//!
//! | format | payload |
//! |--------|---------|
//! | json   | one JSON array holding every record |
//! | ldjson | one JSON document per record, each followed by the line delimiter |
//! | csv    | optional header row, then one row per record |
//! | tsv    | csv with a tab field delimiter |
//! | raw    | each record's `data` attribute, each followed by the line delimiter |
//!
//! A non-empty `fields` list projects json and ldjson records to those top-level
//! keys, in list order, and fixes csv/tsv columns. Without it csv/tsv columns are
//! the union of all record keys in first-seen order.

use crate::config::{Format, SenderConfig};
use crate::error::Result;
use crate::record::Record;
use serde_json::{Map, Value};

/// Encoder for one sender configuration.
#[derive(Debug, Clone)]
pub struct Formatter {
    format: Format,
    line_delimiter: String,
    field_delimiter: u8,
    fields: Vec<String>,
    include_header: bool,
}

impl Formatter {
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the field delimiter is unusable.
    pub fn new(config: &SenderConfig) -> Result<Self> {
        Ok(Self {
            format: config.format,
            line_delimiter: config.line_delimiter.clone(),
            field_delimiter: config.field_delimiter_byte()?,
            fields: config.fields.clone(),
            include_header: config.include_header,
        })
    }

    #[must_use]
    pub const fn format_kind(&self) -> Format {
        self.format
    }

    #[must_use]
    pub const fn include_header(&self) -> bool {
        self.include_header
    }

    /// Enable or suppress the csv/tsv header row.
    pub fn set_include_header(&mut self, include_header: bool) {
        self.include_header = include_header;
    }

    /// Serialize a whole batch into one payload.
    ///
    /// # Errors
    ///
    /// Returns a JSON or CSV serialization error.
    pub fn format(&self, records: &[Record]) -> Result<String> {
        match self.format {
            Format::Json => {
                let projected: Vec<Value> = records.iter().map(|r| self.project(r)).collect();
                Ok(serde_json::to_string(&projected)?)
            }
            Format::Csv | Format::Tsv => {
                let columns = self.columns(records);
                self.format_rows(records, &columns, self.include_header)
            }
            Format::Ldjson | Format::Raw => {
                let mut out = String::new();
                for record in records {
                    out.push_str(&self.format_record(record)?);
                }
                Ok(out)
            }
        }
    }

    /// Serialize one record followed by the line delimiter.
    ///
    /// Used by row-incremental chunking; only meaningful for ldjson and raw.
    ///
    /// # Errors
    ///
    /// Returns the JSON serialization error.
    pub fn format_record(&self, record: &Record) -> Result<String> {
        let mut line = match self.format {
            Format::Raw => raw_payload(record),
            _ => serde_json::to_string(&self.project(record))?,
        };
        line.push_str(&self.line_delimiter);
        Ok(line)
    }

    /// Serialize `records` in batches of `batch_size`, yielding `(payload, has_more)`.
    ///
    /// Concatenating the payloads gives the same bytes as [`Formatter::format`] for
    /// every format but json, which is always a single batch.
    pub fn format_iter<'a>(&'a self, records: &'a [Record], batch_size: usize) -> FormatIter<'a> {
        let batch_size = if self.format == Format::Json {
            records.len().max(1)
        } else {
            batch_size.max(1)
        };
        let columns = if self.format.is_delimited() {
            self.columns(records)
        } else {
            Vec::new()
        };
        FormatIter {
            formatter: self,
            batches: records.chunks(batch_size),
            columns,
            first: true,
        }
    }

    fn project(&self, record: &Record) -> Value {
        match &record.data {
            Value::Object(object) if !self.fields.is_empty() => Value::Object(
                self.fields
                    .iter()
                    .filter_map(|f| object.get(f).map(|v| (f.clone(), v.clone())))
                    .collect::<Map<String, Value>>(),
            ),
            other => other.clone(),
        }
    }

    fn columns(&self, records: &[Record]) -> Vec<String> {
        if !self.fields.is_empty() {
            return self.fields.clone();
        }
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            if let Value::Object(object) = &record.data {
                for key in object.keys() {
                    if !columns.contains(key) {
                        columns.push(key.clone());
                    }
                }
            }
        }
        columns
    }

    fn format_rows(&self, records: &[Record], columns: &[String], header: bool) -> Result<String> {
        let mut out = String::new();
        if header && !columns.is_empty() {
            out.push_str(&self.csv_row(columns.iter().map(String::as_str))?);
        }
        for record in records {
            let cells: Vec<String> = columns
                .iter()
                .map(|column| record.get(column).map(cell_text).unwrap_or_default())
                .collect();
            out.push_str(&self.csv_row(cells.iter().map(String::as_str))?);
        }
        Ok(out)
    }

    /// One quoted row terminated by the configured line delimiter.
    fn csv_row<'c>(&self, cells: impl IntoIterator<Item = &'c str>) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.field_delimiter)
            .quote_style(csv::QuoteStyle::Necessary)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record(cells)?;
        let bytes = writer
            .into_inner()
            .map_err(|e| crate::Error::io("flushing csv row", e.into_error()))?;
        let mut row = String::from_utf8_lossy(&bytes).into_owned();
        if row.ends_with('\n') {
            row.pop();
        }
        row.push_str(&self.line_delimiter);
        Ok(row)
    }
}

/// Batches produced by [`Formatter::format_iter`].
pub struct FormatIter<'a> {
    formatter: &'a Formatter,
    batches: std::slice::Chunks<'a, Record>,
    columns: Vec<String>,
    first: bool,
}

impl Iterator for FormatIter<'_> {
    type Item = Result<(String, bool)>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch = self.batches.next()?;
        let header = self.first && self.formatter.include_header;
        self.first = false;
        let payload = if self.formatter.format.is_delimited() {
            self.formatter.format_rows(batch, &self.columns, header)
        } else {
            self.formatter.format(batch)
        };
        let has_more = self.batches.len() > 0;
        Some(payload.map(|p| (p, has_more)))
    }
}

/// The text a raw record contributes: its `data` string, any other `data` value
/// as JSON, or nothing when the attribute is missing.
fn raw_payload(record: &Record) -> String {
    match record.get("data") {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values.into_iter().map(Record::new).collect()
    }

    fn formatter(format: Format) -> Formatter {
        let mut config = SenderConfig::new("/out", "w", format);
        config.file_per_slice = true;
        Formatter::new(&config).unwrap()
    }

    #[test]
    fn ldjson_terminates_every_record() {
        let out = formatter(Format::Ldjson)
            .format(&records(vec![json!({"a": 1}), json!({"a": 2})]))
            .unwrap();
        assert_eq!(out, "{\"a\":1}\n{\"a\":2}\n");
    }

    #[test]
    fn json_is_one_projected_array() {
        let mut config = SenderConfig::new("/out", "w", Format::Json);
        config.file_per_slice = true;
        config.fields = vec!["b".into(), "a".into()];
        let out = Formatter::new(&config)
            .unwrap()
            .format(&records(vec![json!({"a": 1, "b": 2, "c": 3})]))
            .unwrap();
        assert_eq!(out, r#"[{"b":2,"a":1}]"#);
    }

    #[test]
    fn csv_header_and_quoting() {
        let mut config = SenderConfig::new("/out", "w", Format::Csv);
        config.include_header = true;
        let out = Formatter::new(&config)
            .unwrap()
            .format(&records(vec![
                json!({"name": "a, b", "n": 1}),
                json!({"name": "c", "extra": null}),
            ]))
            .unwrap();
        assert_eq!(out, "name,n,extra\n\"a, b\",1,\nc,,\n");
    }

    #[test]
    fn csv_without_header_uses_configured_delimiters() {
        let mut config = SenderConfig::new("/out", "w", Format::Csv);
        config.fields = vec!["x".into(), "y".into()];
        config.field_delimiter = Some(";".into());
        config.line_delimiter = "\r\n".into();
        let out = Formatter::new(&config)
            .unwrap()
            .format(&records(vec![json!({"y": "2", "x": "1"})]))
            .unwrap();
        assert_eq!(out, "1;2\r\n");
    }

    #[test]
    fn tsv_uses_tabs() {
        let out = formatter(Format::Tsv)
            .format(&records(vec![json!({"a": "1", "b": "2"})]))
            .unwrap();
        assert_eq!(out, "1\t2\n");
    }

    #[test]
    fn raw_writes_data_attribute() {
        let out = formatter(Format::Raw)
            .format(&records(vec![json!({"data": "line one"}), json!({"data": 7})]))
            .unwrap();
        assert_eq!(out, "line one\n7\n");
    }

    #[test]
    fn format_iter_concatenates_to_format() {
        let mut config = SenderConfig::new("/out", "w", Format::Csv);
        config.include_header = true;
        let formatter = Formatter::new(&config).unwrap();
        let batch = records((0..5).map(|i| json!({"i": i})).collect());
        let parts: Vec<(String, bool)> = formatter
            .format_iter(&batch, 2)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].1 && parts[1].1 && !parts[2].1);
        let joined: String = parts.into_iter().map(|(p, _)| p).collect();
        assert_eq!(joined, formatter.format(&batch).unwrap());
    }

    #[test]
    fn header_can_be_suppressed() {
        let mut config = SenderConfig::new("/out", "w", Format::Csv);
        config.include_header = true;
        let mut formatter = Formatter::new(&config).unwrap();
        formatter.set_include_header(false);
        let out = formatter.format(&records(vec![json!({"a": 1})])).unwrap();
        assert_eq!(out, "1\n");
    }
}
