use anyhow::Result;
use chunkio::io::cloud::{ErrorKind, FakeObjectStore, ObjectStore};
use chunkio::io::object::{ObjectDestination, ObjectFetcher, ObjectSlicer};
use chunkio::io::writer::chunks::ChunkLimits;
use chunkio::testing::ldjson_source;
use chunkio::*;
use serde_json::json;

fn records(n: usize) -> Vec<Record> {
    (0..n).map(|i| Record::new(json!({"i": i, "pad": "p".repeat(i % 9)}))).collect()
}

type ObjectSender = ChunkedSender<ObjectDestination<FakeObjectStore>>;

fn multipart_sender(store: &FakeObjectStore, config: SenderConfig) -> Result<ObjectSender> {
    let concurrency = config.concurrency;
    Ok(ChunkedSender::with_limits(
        config,
        ObjectDestination::new(store.clone(), concurrency),
        ChunkLimits::exact(100),
    )?)
}

#[test]
fn multipart_upload_round_trips_through_the_reader() -> Result<()> {
    let store = FakeObjectStore::new();
    let mut config = SenderConfig::new("lake/out", "w", Format::Ldjson);
    config.concurrency = 3;
    config.file_per_slice = true;
    let mut sender = multipart_sender(&store, config)?;
    sender.verify(None)?;

    let batch = records(120);
    sender.send(&batch)?;
    assert_eq!(store.completed_uploads(), 1);
    assert_eq!(store.put_count(), 0);
    assert_eq!(store.keys("lake"), vec!["out/w.0.ldjson"]);

    let mut reader_config = ReaderConfig::new("lake/out", Format::Ldjson);
    reader_config.size = 256;
    let slices = ObjectSlicer::new(reader_config.clone(), store.clone())?.slice_all();
    assert!(slices.len() > 1);
    let back = ChunkedReader::new(reader_config, ObjectFetcher::new(store))?.read_all(&slices)?;
    let sent: Vec<_> = batch.iter().map(|r| r.data.clone()).collect();
    let read: Vec<_> = back.iter().map(|r| r.data.clone()).collect();
    assert_eq!(read, sent);
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn compressed_payload_is_uploaded_in_parts() -> Result<()> {
    let store = FakeObjectStore::new();
    store.create_bucket("lake")?;
    let mut config = SenderConfig::new("lake/out", "w", Format::Csv);
    config.compression = Compression::Gzip;
    config.file_per_slice = true;
    config.include_header = true;
    let mut sender = multipart_sender(&store, config)?;
    sender.send(&records(400))?;

    assert_eq!(store.completed_uploads(), 1);
    let packed = store.object("lake", "out/w.0.csv.gz").unwrap();
    let text = chunkio::io::compression::Compressor::new(Compression::Gzip)?.decompress(&packed)?;
    let text = String::from_utf8(text)?;
    assert!(text.starts_with("i,pad\n0,\n1,p\n"));
    assert_eq!(text.lines().count(), 401);
    Ok(())
}

#[test]
fn failed_part_leaves_no_upload_behind() -> Result<()> {
    let store = FakeObjectStore::new().failing_part(4);
    store.create_bucket("lake")?;
    let mut config = SenderConfig::new("lake/out", "w", Format::Ldjson);
    config.concurrency = 2;
    config.file_per_slice = true;
    let mut sender = multipart_sender(&store, config)?;

    let err = sender.send(&records(120)).unwrap_err();
    assert!(matches!(err, Error::Storage(ref e) if e.kind == ErrorKind::Network));
    assert_eq!(store.aborted_uploads(), 1);
    assert_eq!(store.in_flight_uploads(), 0);
    assert!(store.keys("lake").is_empty());
    Ok(())
}

#[test]
fn routes_become_key_prefixes() -> Result<()> {
    let store = FakeObjectStore::new();
    let mut config = SenderConfig::new("lake/out", "w", Format::Ldjson);
    config.dynamic_routing = true;
    config.file_per_slice = true;
    let mut sender = ChunkedSender::new(config, ObjectDestination::new(store.clone(), 4))?;
    sender.verify(Some("r1"))?;
    sender.send(&[
        Record::new(json!({"a": 1})).with_route("r1"),
        Record::new(json!({"a": 2})).with_route("r2"),
    ])?;

    assert_eq!(store.keys("lake"), vec!["out/r1/w.0.ldjson", "out/r2/w.0.ldjson"]);
    assert_eq!(store.object("lake", "out/r2/w.0.ldjson").unwrap(), b"{\"a\":2}\n");
    assert_eq!(store.put_count(), 2);
    Ok(())
}

#[test]
fn repeated_sends_never_replace_earlier_objects() -> Result<()> {
    let store = FakeObjectStore::new();
    let config = SenderConfig::new("lake/out", "w", Format::Ldjson);
    let err = ChunkedSender::new(config.clone(), ObjectDestination::new(store.clone(), 1)).err();
    assert!(err.is_some_and(|e| e.is_config()));

    let mut config = config;
    config.file_per_slice = true;
    let mut sender = ChunkedSender::new(config, ObjectDestination::new(store.clone(), 1))?;
    sender.send(&[Record::new(json!({"a": 1}))])?;
    sender.send(&[Record::new(json!({"a": 2}))])?;

    assert_eq!(store.keys("lake"), vec!["out/w.0.ldjson", "out/w.1.ldjson"]);
    assert_eq!(store.object("lake", "out/w.0.ldjson").unwrap(), b"{\"a\":1}\n");
    assert_eq!(store.object("lake", "out/w.1.ldjson").unwrap(), b"{\"a\":2}\n");
    Ok(())
}

#[test]
fn slicer_walks_every_page() -> Result<()> {
    let store = FakeObjectStore::new().with_page_size(3);
    for i in 0..10 {
        store.insert_object("lake", &format!("in/part-{i:02}"), ldjson_source(i + 1, "\n"));
    }
    store.insert_object("lake", "in/_tmp/", "");
    store.insert_object("lake", "in/.tmp/part", ldjson_source(4, "\n"));

    let config = ReaderConfig::new("lake/in/", Format::Ldjson);
    let mut slicer = ObjectSlicer::new(config.clone(), store.clone())?;
    let mut batches = 0;
    let mut slices = Vec::new();
    while let Some(batch) = slicer.slice() {
        batches += 1;
        slices.extend(batch);
    }
    assert!(slicer.done_slicing());
    assert!(batches >= 4);
    assert_eq!(slices.len(), 10);

    let records = ChunkedReader::new(config, ObjectFetcher::new(store))?.read_all(&slices)?;
    assert_eq!(records.len(), (1..=10).sum::<usize>());
    Ok(())
}

#[test]
fn bucketless_path_is_a_config_error() {
    let err = ObjectSlicer::new(ReaderConfig::new("", Format::Raw), FakeObjectStore::new())
        .err()
        .unwrap();
    assert!(err.is_config());
}
