use rivulet_common::{Result, error::ErrorKind};
use rivulet_container::{
    ContainerReader, ContainerWriter, Cursor, MemoryCursor, WriterParams, WriterState,
    stream_cursor,
};
use rivulet_format::{
    sql_type::{ColumnDescriptor, SqlType},
    value::{Row, Value},
};
use rivulet_io::SharedBuffer;
use rivulet_testkit::{CrossJoinCursor, FaultySink, Projection};

/// Serves the rows of a memory cursor, then fails the next fetch.
struct FailingCursor {
    inner: MemoryCursor,
    closed: bool,
}

impl Cursor for FailingCursor {
    fn columns(&self) -> &[ColumnDescriptor] {
        self.inner.columns()
    }

    fn next_row(&mut self, row: &mut Row) -> Result<bool> {
        if self.inner.next_row(row)? {
            return Ok(true);
        }
        Err(rivulet_common::error::Error::cursor(
            "fetch",
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
        ))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.inner.close()
    }
}

fn columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id", SqlType::Integer).not_null(),
        ColumnDescriptor::new("name", SqlType::VarChar),
    ]
}

fn rows(n: i32) -> Vec<Row> {
    (0..n)
        .map(|i| vec![Value::Int32(i), Value::Utf8(format!("name {i}"))].into())
        .collect()
}

#[test]
fn test_schema_error_writes_nothing() {
    let buffer = SharedBuffer::new();
    let mut cursor = MemoryCursor::new(vec![], vec![]);
    let err = stream_cursor(&mut cursor, Box::new(buffer.clone()), &Default::default()).unwrap_err();
    assert!(err.is_schema());
    assert!(buffer.is_empty());
    assert!(!buffer.is_sealed());
    assert!(cursor.is_closed());
}

#[test]
fn test_null_in_non_nullable_column_aborts() {
    let mut data = rows(5);
    data[3] = vec![Value::Null, Value::Utf8("x".into())].into();
    let buffer = SharedBuffer::new();
    let mut cursor = MemoryCursor::new(columns(), data);
    let err = stream_cursor(&mut cursor, Box::new(buffer.clone()), &Default::default()).unwrap_err();
    assert!(err.is_encode());
    assert!(cursor.is_closed());
    assert!(!buffer.is_sealed());

    // The partial output is never mistaken for a valid container.
    let bytes = buffer.contents();
    let result = ContainerReader::open(bytes.as_slice())
        .and_then(|reader| reader.collect::<Result<Vec<_>>>());
    assert!(result.is_err());
}

#[test]
fn test_type_mismatch_aborts() {
    let mut data = rows(3);
    data[1] = vec![Value::Int64(1), Value::Utf8("x".into())].into();
    let err = stream_cursor(
        MemoryCursor::new(columns(), data),
        Box::new(SharedBuffer::new()),
        &Default::default(),
    )
    .unwrap_err();
    assert!(err.is_encode());
    assert!(err.to_string().contains("'id'"));
}

#[test]
fn test_cursor_failure_mid_stream() {
    let buffer = SharedBuffer::new();
    let mut cursor = FailingCursor {
        inner: MemoryCursor::new(columns(), rows(100)),
        closed: false,
    };
    let err = stream_cursor(&mut cursor, Box::new(buffer.clone()), &Default::default()).unwrap_err();
    assert!(err.is_io());
    assert!(matches!(err.kind(), ErrorKind::Cursor { .. }));
    assert!(cursor.closed);
    assert!(!buffer.is_sealed());
}

#[test]
fn test_sink_failure_mid_stream() {
    let sink = FaultySink::fail_after(4096);
    let mut cursor = CrossJoinCursor::cube(5, 10, Projection::All);
    let params = rivulet_container::StreamParams {
        writer: WriterParams::default().with_block_size(512),
        ..Default::default()
    };
    let err = stream_cursor(&mut cursor, Box::new(sink.clone()), &params).unwrap_err();
    assert!(err.is_io());
    assert!(matches!(err.kind(), ErrorKind::Io { .. }));
    assert!(cursor.is_closed());
    assert!(sink.bytes_written() <= 4096);
    assert!(!sink.is_sealed());
}

#[test]
fn test_seal_failure() {
    let sink = FaultySink::fail_on_seal();
    let mut writer = ContainerWriter::open(Box::new(sink.clone()), Default::default());
    let schema = rivulet_format::build_schema(&columns()).unwrap();
    writer.write_header(&schema).unwrap();
    writer.write_row(&rows(1)[0]).unwrap();
    assert!(writer.close().unwrap_err().is_io());
    assert_eq!(writer.state(), WriterState::Failed);
    assert!(!writer.close().unwrap_err().is_closed());
}

#[test]
fn test_double_close_and_write_after_close() {
    let schema = rivulet_format::build_schema(&columns()).unwrap();
    let mut writer = ContainerWriter::open(Box::new(Vec::<u8>::new()), Default::default());
    assert!(matches!(
        writer.close().unwrap_err().kind(),
        ErrorKind::InvalidOperation { .. }
    ));
    writer.write_header(&schema).unwrap();
    assert_eq!(writer.close().unwrap(), 0);
    assert!(writer.close().unwrap_err().is_closed());
    assert!(writer.write_row(&rows(1)[0]).unwrap_err().is_closed());
    assert!(writer.write_header(&schema).unwrap_err().is_closed());
}

#[test]
fn test_corrupted_sync_marker_rejected() {
    let buffer = SharedBuffer::new();
    let params = WriterParams::default()
        .with_block_size(64)
        .with_sync_marker([0xAB; 16]);
    let mut writer = ContainerWriter::open(Box::new(buffer.clone()), params);
    let schema = rivulet_format::build_schema(&columns()).unwrap();
    writer.write_header(&schema).unwrap();
    for row in rows(20) {
        writer.write_row(&row).unwrap();
    }
    writer.close().unwrap();

    let mut bytes = buffer.contents();
    let reader = ContainerReader::open(bytes.as_slice()).unwrap();
    assert_eq!(reader.sync_marker(), &[0xAB; 16]);
    assert_eq!(reader.count(), 20);

    // Corrupt the sync marker that follows the last block.
    let sync_positions: Vec<usize> = bytes
        .windows(16)
        .enumerate()
        .filter(|(_, w)| *w == [0xAB; 16])
        .map(|(i, _)| i)
        .collect();
    let last = *sync_positions.last().unwrap();
    bytes[last + 15] = 0;
    let result = ContainerReader::open(bytes.as_slice())
        .and_then(|reader| reader.collect::<Result<Vec<_>>>());
    assert!(result.is_err());
}
