//! Drives a cursor to exhaustion into a container sink.

use rivulet_common::Result;
use rivulet_format::{
    schema_builder::{SchemaBuilder, SchemaBuilderParams},
    value::Row,
};
use rivulet_io::SealingWrite;

use crate::{
    cursor::Cursor,
    write::container_writer::{ContainerWriter, WriterParams},
};

/// Parameters of a [`stream_cursor`] session.
#[derive(Debug, Clone, Default)]
pub struct StreamParams {
    pub schema: SchemaBuilderParams,
    pub writer: WriterParams,
}

/// Summary of a completed [`stream_cursor_with_report`] session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamReport {
    pub row_count: u64,
    pub block_count: u64,
    /// Size of the sealed container in bytes.
    pub bytes_written: u64,
    /// High-water mark of the block buffer capacity, in bytes.
    pub peak_buffer_capacity: usize,
}

/// Encodes every row of `cursor` into a container written to `sink`.
///
/// The schema is derived from the cursor's column descriptors before any
/// byte is written. Returns the number of rows written.
///
/// The cursor is closed on every path. The sink is sealed only when the
/// whole result was written; on failure it is released unsealed, holding an
/// incomplete container that readers reject.
pub fn stream_cursor<C: Cursor>(
    cursor: C,
    sink: Box<dyn SealingWrite>,
    params: &StreamParams,
) -> Result<u64> {
    stream_cursor_with_report(cursor, sink, params).map(|report| report.row_count)
}

/// Same as [`stream_cursor`], returning the session summary.
pub fn stream_cursor_with_report<C: Cursor>(
    mut cursor: C,
    sink: Box<dyn SealingWrite>,
    params: &StreamParams,
) -> Result<StreamReport> {
    let result = encode_cursor(&mut cursor, sink, params);
    let close_result = cursor.close();
    match (result, close_result) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(_), Err(e)) => {
            log::warn!("container sealed, but closing the cursor failed: {e}");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_error)) => {
            log::warn!("closing the cursor after a failed session also failed: {close_error}");
            Err(e)
        }
    }
}

fn encode_cursor<C: Cursor + ?Sized>(
    cursor: &mut C,
    sink: Box<dyn SealingWrite>,
    params: &StreamParams,
) -> Result<StreamReport> {
    let schema = SchemaBuilder::new(params.schema.clone()).build(cursor.columns())?;

    let mut writer = ContainerWriter::open(sink, params.writer.clone());
    writer.write_header(&schema)?;
    let mut row = Row::with_capacity(schema.len());
    while cursor.next_row(&mut row)? {
        writer.write_row(&row)?;
    }
    writer.close()?;

    let report = StreamReport {
        row_count: writer.row_count(),
        block_count: writer.block_count(),
        bytes_written: writer.bytes_written(),
        peak_buffer_capacity: writer.peak_buffer_capacity(),
    };
    log::debug!("{report:?}");
    Ok(report)
}
