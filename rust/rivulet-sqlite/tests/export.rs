use std::{fs::File, io::BufReader, sync::Arc};

use rivulet_container::{ContainerReader, Cursor, stream_cursor};
use rivulet_format::{
    LogicalType, NameCollisionPolicy,
    value::{Row, Value},
};
use rivulet_io::{FileWriter, SharedBuffer};
use rivulet_sqlite::{QueryExecutor, QueryOptions, SqliteCursor, executor::QUERY_PROPERTY};
use rivulet_testkit::{
    CrossJoinCursor, Projection, TestTables,
    data_gen::DEFAULT_SEED,
    sqlite::{FULL_CROSS_JOIN_QUERY, PERSONS_CROSS_JOIN_QUERY, as_stored, open_test_database},
};

#[test]
fn test_persons_cross_join_matches_generator() {
    let tables = Arc::new(TestTables::generate(DEFAULT_SEED, 5, 5, 5));
    let conn = open_test_database(&tables).unwrap();

    let buffer = SharedBuffer::new();
    let report = QueryExecutor::new(&conn)
        .execute(
            PERSONS_CROSS_JOIN_QUERY,
            Box::new(buffer.clone()),
            &QueryOptions {
                record_name: "persons".into(),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(report.row_count, 125);
    assert_eq!(report.bytes_written as usize, buffer.len());

    let bytes = buffer.contents();
    let reader = ContainerReader::open(bytes.as_slice()).unwrap();
    assert_eq!(reader.schema().name(), "persons");
    assert_eq!(reader.property(QUERY_PROPERTY), Some(PERSONS_CROSS_JOIN_QUERY));
    let types: Vec<LogicalType> = reader
        .schema()
        .fields()
        .iter()
        .map(|f| f.logical_type)
        .collect();
    assert_eq!(types, [LogicalType::Int64, LogicalType::Utf8, LogicalType::Int64]);
    assert_eq!(reader.schema().fields()[1].precision, 100);

    let reference = CrossJoinCursor::new(tables, Projection::PersonsOnly);
    let mut expected = Row::new();
    let mut count = 0;
    for (index, row) in reader.enumerate() {
        reference.row_at(index as u64, &mut expected);
        assert_eq!(row.unwrap(), as_stored(&expected), "row {index}");
        count += 1;
    }
    assert_eq!(count, 125);
}

#[test]
fn test_full_cross_join_to_file() {
    let tables = TestTables::generate(DEFAULT_SEED, 6, 5, 4);
    let conn = open_test_database(&tables).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cross_join.rvlt");

    let sink = FileWriter::create(&path).unwrap();
    let report = QueryExecutor::new(&conn)
        .execute(
            FULL_CROSS_JOIN_QUERY,
            Box::new(sink),
            &QueryOptions {
                block_size: 512,
                properties: vec![("origin".into(), "test".into())],
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(report.row_count, 120);

    let reader = ContainerReader::open(BufReader::new(File::open(&path).unwrap())).unwrap();
    assert_eq!(
        reader.properties().iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
        [QUERY_PROPERTY, "origin"]
    );
    // `ROW_NUMBER()` has no declared type and falls back to text.
    let rownr = reader.schema().find_field("rownr").unwrap().1;
    assert_eq!(rownr.logical_type, LogicalType::Utf8);

    let rows = reader.collect::<rivulet_common::Result<Vec<_>>>().unwrap();
    assert_eq!(rows.len(), 120);
    assert_eq!(rows[0].get(9), Some(&Value::Utf8("1".into())));
    assert_eq!(rows[119].get(9), Some(&Value::Utf8("120".into())));
    assert_eq!(rows[119].get(7), Some(&Value::Utf8(tables.relationships[3].name.clone())));
}

#[test]
fn test_duplicate_labels() {
    let tables = TestTables::generate(DEFAULT_SEED, 2, 1, 1);
    let conn = open_test_database(&tables).unwrap();
    let sql = "select PER.ID, PRD.ID from persons PER cross join products PRD";

    let err = QueryExecutor::new(&conn)
        .execute(sql, Box::new(SharedBuffer::new()), &Default::default())
        .unwrap_err();
    assert!(err.is_schema());

    let buffer = SharedBuffer::new();
    let options = QueryOptions {
        collision_policy: NameCollisionPolicy::PositionalSuffix,
        ..Default::default()
    };
    let report = QueryExecutor::new(&conn)
        .execute(sql, Box::new(buffer.clone()), &options)
        .unwrap();
    assert_eq!(report.row_count, 2);
    let bytes = buffer.contents();
    let reader = ContainerReader::open(bytes.as_slice()).unwrap();
    assert_eq!(reader.schema().fields()[1].name, "ID_2");
}

#[test]
fn test_out_of_range_integer_is_encode_error() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "create table t (id smallint);\
         insert into t values (1);\
         insert into t values (5000000000);",
    )
    .unwrap();
    let mut stmt = conn.prepare("select id from t").unwrap();
    let mut cursor = SqliteCursor::new(&mut stmt).unwrap();
    let buffer = SharedBuffer::new();
    let err = stream_cursor(&mut cursor, Box::new(buffer.clone()), &Default::default()).unwrap_err();
    assert!(err.is_encode());
    assert!(cursor.is_closed());
    assert!(!buffer.is_sealed());
}

fn export_single_column(create: &str, insert: &str) -> (LogicalType, Vec<Value>) {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("{create}; {insert};")).unwrap();
    let buffer = SharedBuffer::new();
    QueryExecutor::new(&conn)
        .execute("select * from t", Box::new(buffer.clone()), &Default::default())
        .unwrap();
    let bytes = buffer.contents();
    let reader = ContainerReader::open(bytes.as_slice()).unwrap();
    let ty = reader.schema().fields()[0].logical_type;
    let values = reader
        .map(|row| row.unwrap().into_values().remove(0))
        .collect();
    (ty, values)
}

#[test]
fn test_integer_columns_hold_64_bit_values() {
    let (ty, values) = export_single_column(
        "create table t (id integer primary key)",
        "insert into t values (1), (5000000000), (-9223372036854775808)",
    );
    assert_eq!(ty, LogicalType::Int64);
    assert_eq!(
        values,
        [Value::Int64(i64::MIN), Value::Int64(1), Value::Int64(5_000_000_000)]
    );
}

#[test]
fn test_real_columns_keep_double_precision() {
    let (ty, values) = export_single_column("create table t (x real)", "insert into t values (0.1), (1e300)");
    assert_eq!(ty, LogicalType::Float64);
    assert_eq!(values, [Value::Float64(0.1), Value::Float64(1e300)]);

    let (ty, values) = export_single_column("create table t (x float)", "insert into t values (2.5)");
    assert_eq!(ty, LogicalType::Float64);
    assert_eq!(values, [Value::Float64(2.5)]);
}

#[test]
fn test_empty_query_result() {
    let tables = TestTables::generate(DEFAULT_SEED, 3, 3, 3);
    let conn = open_test_database(&tables).unwrap();
    let buffer = SharedBuffer::new();
    let report = QueryExecutor::new(&conn)
        .execute(
            "select * from persons where id < 0",
            Box::new(buffer.clone()),
            &Default::default(),
        )
        .unwrap();
    assert_eq!(report.row_count, 0);

    let bytes = buffer.contents();
    let mut reader = ContainerReader::open(bytes.as_slice()).unwrap();
    assert_eq!(reader.schema().len(), 3);
    assert!(!reader.next_row(&mut Row::new()).unwrap());
}

#[test]
fn test_cursor_columns_before_fetch() {
    let tables = TestTables::generate(DEFAULT_SEED, 1, 1, 1);
    let conn = open_test_database(&tables).unwrap();
    let mut stmt = conn.prepare("select name, code from products").unwrap();
    let mut cursor = SqliteCursor::new(&mut stmt).unwrap();
    let names: Vec<&str> = cursor.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["name", "code"]);
    let mut row = Row::new();
    assert!(cursor.next_row(&mut row).unwrap());
    assert_eq!(row.get(1), Some(&Value::Int64(i64::from(tables.products[0].code))));
}
