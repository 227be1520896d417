use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use shardload::config::table::TableSpec;
use shardload::job::{self, JobContext};
use shardload::progress::NoopProgress;
use shardload::router::{Modulo, ShardRouter};
use shardload::sink::mock::MockSink;
use shardload::ShardLoadError;

fn write_temp(contents: &[u8]) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(contents).unwrap();
    f.flush().unwrap();
    f
}

fn table(datapath: PathBuf) -> TableSpec {
    TableSpec {
        tablename: "orders".to_string(),
        columns: "id, val".to_string(),
        datapath,
        partition_field: 1,
        partition_field_type: "int".to_string(),
    }
}

fn ctx(table: TableSpec, readers: usize, shards: usize) -> JobContext {
    JobContext {
        table,
        schema: "public".to_string(),
        csv_header: false,
        encoding: None,
        readers,
        shards,
        io_read_size: 4096,
        basket_tuple_size: 4096,
        high_watermark: 8,
    }
}

fn sorted_records(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut records: Vec<Vec<u8>> = bytes.split_inclusive(|&b| b == b'\n').map(|r| r.to_vec()).collect();
    records.sort();
    records
}

/// S1: single reader, modulo hash, two shards.
#[test]
fn s1_single_reader_routes_by_modulo() {
    let data = b"1,a\n2,b\n3,c\n";
    let tmp = write_temp(data);
    let ctx = ctx(table(tmp.path().to_path_buf()), 1, 2);
    let router: Arc<dyn ShardRouter> = Arc::new(Modulo::new(2).unwrap());

    let sink0 = MockSink::new();
    let sink1 = MockSink::new();
    let rows = job::run(&ctx, router, vec![sink0.clone(), sink1.clone()], Arc::new(NoopProgress)).unwrap();

    assert_eq!(rows, 3);
    assert_eq!(&*sink0.received.lock().unwrap(), b"2,b\n");
    assert_eq!(
        sorted_records(&sink1.received.lock().unwrap()),
        vec![b"1,a\n".to_vec(), b"3,c\n".to_vec()]
    );
}

/// S2: same file and shard layout, but split across three readers —
/// the chunk boundaries land on record boundaries, so every head/tail
/// join is empty and dropped; the delivered shard contents must match
/// S1 exactly (property 3: boundary reassembly agrees with the
/// single-Reader reference run).
#[test]
fn s2_three_readers_matches_single_reader_reference() {
    let data = b"1,a\n2,b\n3,c\n";
    let tmp = write_temp(data);
    let ctx = ctx(table(tmp.path().to_path_buf()), 3, 2);
    let router: Arc<dyn ShardRouter> = Arc::new(Modulo::new(2).unwrap());

    let sink0 = MockSink::new();
    let sink1 = MockSink::new();
    let rows = job::run(&ctx, router, vec![sink0.clone(), sink1.clone()], Arc::new(NoopProgress)).unwrap();

    assert_eq!(rows, 3);
    assert_eq!(&*sink0.received.lock().unwrap(), b"2,b\n");
    assert_eq!(
        sorted_records(&sink1.received.lock().unwrap()),
        vec![b"1,a\n".to_vec(), b"3,c\n".to_vec()]
    );
}

/// S3: a record straddles the chunk boundary; it must be delivered
/// exactly once, reassembled from tail+head.
#[test]
fn s3_boundary_straddling_record_delivered_once() {
    let data = b"10,xx\n20,yy\n";
    let tmp = write_temp(data);
    let ctx = ctx(table(tmp.path().to_path_buf()), 2, 1);
    let router: Arc<dyn ShardRouter> = Arc::new(Modulo::new(1).unwrap());

    let sink0 = MockSink::new();
    let rows = job::run(&ctx, router, vec![sink0.clone()], Arc::new(NoopProgress)).unwrap();

    assert_eq!(rows, 2);
    assert_eq!(
        sorted_records(&sink0.received.lock().unwrap()),
        vec![b"10,xx\n".to_vec(), b"20,yy\n".to_vec()]
    );
}

/// S4: a non-numeric partition key is fatal; no data reaches any shard.
#[test]
fn s4_non_numeric_partition_key_is_fatal() {
    let data = b"a,b\n";
    let tmp = write_temp(data);
    let ctx = ctx(table(tmp.path().to_path_buf()), 1, 1);
    let router: Arc<dyn ShardRouter> = Arc::new(Modulo::new(1).unwrap());

    let sink0 = MockSink::new();
    let err = job::run(&ctx, router, vec![sink0.clone()], Arc::new(NoopProgress)).unwrap_err();
    assert!(matches!(err, ShardLoadError::IntConversion(_)));
    assert!(sink0.received.lock().unwrap().is_empty());
}

/// S5: a file missing its trailing newline is a boundary error.
#[test]
fn s5_missing_trailing_newline_is_a_boundary_error() {
    let data = b"1,a\n2,b";
    let tmp = write_temp(data);
    let ctx = ctx(table(tmp.path().to_path_buf()), 1, 1);
    let router: Arc<dyn ShardRouter> = Arc::new(Modulo::new(1).unwrap());

    let sink0 = MockSink::new();
    let err = job::run(&ctx, router, vec![sink0], Arc::new(NoopProgress)).unwrap_err();
    assert!(matches!(err, ShardLoadError::Boundary { .. }));
}

/// S6: a read buffer too small for the first record fails fast with a
/// parse error rather than silently truncating.
#[test]
fn s6_buffer_smaller_than_longest_record_fails_fast() {
    let long_record = format!("1,{}\n", "a".repeat(20_000));
    let tmp = write_temp(long_record.as_bytes());
    let mut ctx = ctx(table(tmp.path().to_path_buf()), 1, 1);
    ctx.io_read_size = 4096;
    let router: Arc<dyn ShardRouter> = Arc::new(Modulo::new(1).unwrap());

    let sink0 = MockSink::new();
    let err = job::run(&ctx, router, vec![sink0], Arc::new(NoopProgress)).unwrap_err();
    assert!(matches!(err, ShardLoadError::Parse { .. }));
}

/// Conservation property (testable property 1): for a file with no
/// boundary straddling, every record's bytes show up in exactly one
/// shard's sink, and the union across shards equals the input.
#[test]
fn conservation_across_shards_for_many_records() {
    let mut data = String::new();
    for i in 0..200 {
        data.push_str(&format!("{i},row{i}\n"));
    }
    let tmp = write_temp(data.as_bytes());
    let ctx = ctx(table(tmp.path().to_path_buf()), 4, 3);
    let router: Arc<dyn ShardRouter> = Arc::new(Modulo::new(3).unwrap());

    let sinks: Vec<MockSink> = (0..3).map(|_| MockSink::new()).collect();
    let rows = job::run(&ctx, router, sinks.clone(), Arc::new(NoopProgress)).unwrap();
    assert_eq!(rows, 200);

    let mut delivered: Vec<Vec<u8>> = sinks
        .iter()
        .flat_map(|s| s.received.lock().unwrap().split_inclusive(|&b| b == b'\n').map(|r| r.to_vec()).collect::<Vec<_>>())
        .collect();
    delivered.sort();

    let mut expected: Vec<Vec<u8>> = data.as_bytes().split_inclusive(|&b| b == b'\n').map(|r| r.to_vec()).collect();
    expected.sort();

    assert_eq!(delivered, expected);
}
