use anyhow::Result;
use chunkio::io::cloud::{FakeHdfs, HdfsClient};
use chunkio::io::hdfs::{HdfsDestination, HdfsFetcher, HdfsLister};
use chunkio::io::slicer::DirectorySlicer;
use chunkio::testing::ldjson_source;
use chunkio::*;
use serde_json::json;

#[test]
fn write_then_slice_and_read_back() -> Result<()> {
    let hdfs = FakeHdfs::new();
    let mut config = SenderConfig::new("/warehouse/out", "w1", Format::Csv);
    config.include_header = true;
    config.fields = vec!["id".into(), "name".into()];
    config.dynamic_routing = true;
    let mut sender = ChunkedSender::new(config, HdfsDestination::new(hdfs.clone()))?;

    let batch = |start: usize| -> Vec<Record> {
        (start..start + 3)
            .map(|i| {
                let route = if i % 2 == 0 { "even" } else { "odd" };
                Record::new(json!({"id": i, "name": format!("n{i}")})).with_route(route)
            })
            .collect()
    };
    sender.send(&batch(0))?;
    sender.send(&batch(3))?;

    // the header belongs to the first send only, whatever the route
    let even = String::from_utf8(hdfs.read_file("/warehouse/out/even/w1.csv").unwrap())?;
    assert_eq!(even, "id,name\n0,n0\n2,n2\n4,n4\n");
    let odd = String::from_utf8(hdfs.read_file("/warehouse/out/odd/w1.csv").unwrap())?;
    assert_eq!(odd, "id,name\n1,n1\n3,n3\n5,n5\n");

    let mut reader_config = ReaderConfig::new("/warehouse/out", Format::Csv);
    reader_config.fields = vec!["id".into(), "name".into()];
    reader_config.size = 7;
    let slices =
        DirectorySlicer::new(reader_config.clone(), HdfsLister::new(hdfs.clone()))?.slice_all();
    let reader = ChunkedReader::new(reader_config, HdfsFetcher::new(hdfs))?;
    let mut ids: Vec<String> = reader
        .read_all(&slices)?
        .iter()
        .filter_map(|r| r.get("id").and_then(|v| v.as_str()).map(str::to_string))
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["0", "1", "2", "3", "4", "5"]);
    Ok(())
}

#[test]
fn unlistable_directory_is_skipped() -> Result<()> {
    let hdfs = FakeHdfs::new();
    hdfs.put_file("/in/a/part", ldjson_source(4, "\n"));
    hdfs.put_file("/in/b/part", ldjson_source(3, "\n"));
    hdfs.fail_listing("/in/a");

    let config = ReaderConfig::new("/in", Format::Ldjson);
    let mut slicer = DirectorySlicer::new(config.clone(), HdfsLister::new(hdfs.clone()))?;
    let slices = slicer.slice_all();
    assert_eq!(slices, vec![FileSlice::whole("/in/b/part", ldjson_source(3, "\n").len() as u64)]);

    let records = ChunkedReader::new(config, HdfsFetcher::new(hdfs))?.read_all(&slices)?;
    assert_eq!(records.len(), 3);
    Ok(())
}

#[test]
fn missing_root_yields_nothing() -> Result<()> {
    let mut slicer = DirectorySlicer::new(
        ReaderConfig::new("/nowhere", Format::Raw),
        HdfsLister::new(FakeHdfs::new()),
    )?;
    assert!(slicer.slice().is_none());
    Ok(())
}

#[test]
fn verify_creates_the_route_directory() -> Result<()> {
    let hdfs = FakeHdfs::new();
    let sender = ChunkedSender::new(
        SenderConfig::new("/out", "w", Format::Ldjson),
        HdfsDestination::new(hdfs.clone()),
    )?;
    sender.verify(Some("r1"))?;
    assert!(hdfs.status("/out/r1")?.is_dir);
    Ok(())
}
