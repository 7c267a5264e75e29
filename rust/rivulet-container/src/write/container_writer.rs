//! The container writer: an explicit state machine that frames the header,
//! accumulates encoded rows into bounded blocks and seals the sink once.

use rivulet_common::{Result, error::Error};
use rivulet_format::{
    defs::{
        ContainerTrailer, HeaderProperties, MAX_BLOCK_SIZE, NameValuePair, RIVULET_FOOTER,
        RIVULET_HEADER, SYNC_MARKER_SIZE,
    },
    checksum,
    schema::RecordSchema,
    value::Row,
};
use rivulet_io::SealingWrite;

use super::{artifact_writer::ArtifactWriter, row_encoder::encode_row};

/// Parameters of a [`ContainerWriter`].
#[derive(Debug, Clone)]
pub struct WriterParams {
    /// Target size of an encoded block in bytes. A block is written out as
    /// soon as its encoded rows reach this size. Clamped to
    /// [`MAX_BLOCK_SIZE`].
    pub block_size: usize,

    /// Sync marker written after the header and after every block. A random
    /// marker is generated when `None`.
    pub sync_marker: Option<[u8; SYNC_MARKER_SIZE]>,

    /// Free-form metadata stored in the header, in order.
    pub properties: Vec<(String, String)>,
}

impl WriterParams {
    pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

    pub fn with_block_size(mut self, block_size: usize) -> WriterParams {
        self.block_size = block_size;
        self
    }

    pub fn with_sync_marker(mut self, sync_marker: [u8; SYNC_MARKER_SIZE]) -> WriterParams {
        self.sync_marker = Some(sync_marker);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> WriterParams {
        self.properties.push((name.into(), value.into()));
        self
    }
}

impl Default for WriterParams {
    fn default() -> Self {
        WriterParams {
            block_size: Self::DEFAULT_BLOCK_SIZE,
            sync_marker: None,
            properties: Vec::new(),
        }
    }
}

/// Lifecycle state of a [`ContainerWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriterState {
    /// Opened, nothing written yet.
    Idle,
    /// Header written, no rows yet.
    HeaderWritten,
    /// At least one row accepted.
    Writing,
    /// Terminal marker written and the sink sealed.
    Sealed,
    /// A previous operation failed; the output is incomplete.
    Failed,
}

/// Streams rows of a single record schema into a sink.
///
/// Call order: [`write_header`](Self::write_header) once, then
/// [`write_row`](Self::write_row) zero or more times, then
/// [`close`](Self::close) once. The sink is sealed by a successful `close`
/// only; an output left behind by a failed or abandoned writer is never
/// terminated and is rejected by the reader.
///
/// Rows are encoded into a single block buffer that is flushed whenever it
/// reaches the configured block size, so memory use stays proportional to
/// one block plus one row regardless of the row count.
pub struct ContainerWriter {
    artifact: Option<ArtifactWriter>,
    state: WriterState,
    schema: Option<RecordSchema>,
    block_size: usize,
    max_block_size: usize,
    sync_marker: [u8; SYNC_MARKER_SIZE],
    properties: Vec<(String, String)>,
    block: Vec<u8>,
    block_rows: u32,
    row_count: u64,
    block_count: u64,
    peak_buffer_capacity: usize,
    sealed_size: u64,
}

impl ContainerWriter {
    /// Opens a writer over `sink`. No bytes are written until
    /// [`write_header`](Self::write_header).
    pub fn open(sink: Box<dyn SealingWrite>, params: WriterParams) -> ContainerWriter {
        let block_size = params.block_size.clamp(1, MAX_BLOCK_SIZE);
        let sync_marker = params
            .sync_marker
            .unwrap_or_else(|| fastrand::u128(..).to_le_bytes());
        ContainerWriter {
            artifact: Some(ArtifactWriter::new(sink)),
            state: WriterState::Idle,
            schema: None,
            block_size,
            max_block_size: MAX_BLOCK_SIZE,
            sync_marker,
            properties: params.properties,
            block: Vec::new(),
            block_rows: 0,
            row_count: 0,
            block_count: 0,
            peak_buffer_capacity: 0,
            sealed_size: 0,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn schema(&self) -> Option<&RecordSchema> {
        self.schema.as_ref()
    }

    pub fn sync_marker(&self) -> &[u8; SYNC_MARKER_SIZE] {
        &self.sync_marker
    }

    /// Number of rows accepted so far.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Number of blocks written out so far.
    pub fn block_count(&self) -> u64 {
        self.block_count
    }

    /// Number of bytes handed to the sink so far; the container size once
    /// sealed.
    pub fn bytes_written(&self) -> u64 {
        self.artifact
            .as_ref()
            .map_or(self.sealed_size, ArtifactWriter::position)
    }

    /// High-water mark of the block buffer capacity, in bytes.
    pub fn peak_buffer_capacity(&self) -> usize {
        self.peak_buffer_capacity
    }

    /// Writes the container header: magic, the schema, the header
    /// properties and the sync marker.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if the header was already written, `Closed` after
    /// a successful close, `Io` if the sink fails.
    pub fn write_header(&mut self, schema: &RecordSchema) -> Result<()> {
        match self.state {
            WriterState::Idle => (),
            WriterState::Sealed => return Err(Error::closed("write_header")),
            WriterState::Failed => return Err(Self::aborted("write_header")),
            WriterState::HeaderWritten | WriterState::Writing => {
                return Err(Error::invalid_operation(
                    "write_header: header already written",
                ));
            }
        }

        let properties = HeaderProperties {
            properties: self
                .properties
                .iter()
                .map(|(name, value)| NameValuePair {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect(),
        };
        let sync_marker = self.sync_marker;
        let result = self.artifact_mut().and_then(|artifact| {
            artifact
                .write_all(&RIVULET_HEADER)
                .and_then(|_| artifact.write_message(&schema.to_def()))
                .and_then(|_| artifact.write_message(&properties))
                .and_then(|_| artifact.write_all(&sync_marker))
                .map_err(|e| Error::io("container header", e))
        });
        if let Err(e) = result {
            return Err(self.fail(e));
        }

        log::debug!(
            "container header written: record '{}', {} fields, {} properties",
            schema.name(),
            schema.len(),
            self.properties.len()
        );
        self.schema = Some(schema.clone());
        self.state = WriterState::HeaderWritten;
        Ok(())
    }

    /// Encodes one row into the current block, writing the block out when it
    /// reaches the configured size.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` before the header, `Closed` after a successful
    /// close, `Encode` if the row does not fit the schema, `Io` if the sink
    /// fails. Any error other than the state errors leaves the writer in the
    /// [`WriterState::Failed`] state.
    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        match self.state {
            WriterState::HeaderWritten | WriterState::Writing => (),
            WriterState::Idle => {
                return Err(Error::invalid_operation(
                    "write_row: header not written",
                ));
            }
            WriterState::Sealed => return Err(Error::closed("write_row")),
            WriterState::Failed => return Err(Self::aborted("write_row")),
        }
        let Some(schema) = self.schema.as_ref() else {
            return Err(Error::invalid_operation("write_row: header not written"));
        };

        let row_start = self.block.len();
        if let Err(e) = encode_row(schema, row, &mut self.block) {
            return Err(self.fail(e));
        }
        if self.block.len() > self.max_block_size {
            let row_len = self.block.len() - row_start;
            if row_len > self.max_block_size {
                let e = Error::encode(
                    schema.name(),
                    format!(
                        "encoded row of {row_len} bytes exceeds the maximum block size of {} bytes",
                        self.max_block_size
                    ),
                );
                return Err(self.fail(e));
            }
            // The row starts the next block.
            let pending = self.block.split_off(row_start);
            if let Err(e) = self.flush_block() {
                return Err(self.fail(e));
            }
            self.block.extend_from_slice(&pending);
        }
        self.peak_buffer_capacity = self.peak_buffer_capacity.max(self.block.capacity());
        self.block_rows += 1;
        self.row_count += 1;
        self.state = WriterState::Writing;

        if self.block.len() >= self.block_size || self.block_rows == u32::MAX {
            if let Err(e) = self.flush_block() {
                return Err(self.fail(e));
            }
        }
        Ok(())
    }

    /// Writes out the pending block, the terminal marker, the trailer and
    /// the closing magic, then seals the sink.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// `Closed` if the writer was already closed, `InvalidOperation` before
    /// the header or after a failure, `Io` if the sink fails.
    pub fn close(&mut self) -> Result<u64> {
        match self.state {
            WriterState::HeaderWritten | WriterState::Writing => (),
            WriterState::Idle => {
                return Err(Error::invalid_operation("close: header not written"));
            }
            WriterState::Sealed => return Err(Error::closed("close")),
            WriterState::Failed => return Err(Self::aborted("close")),
        }

        if let Err(e) = self.finish() {
            return Err(self.fail(e));
        }
        self.state = WriterState::Sealed;
        self.block = Vec::new();
        log::info!(
            "container sealed: {} rows in {} blocks, peak block buffer {} bytes",
            self.row_count,
            self.block_count,
            self.peak_buffer_capacity
        );
        Ok(self.row_count)
    }

    fn finish(&mut self) -> Result<()> {
        self.flush_block()?;
        let trailer = ContainerTrailer {
            row_count: self.row_count,
            block_count: self.block_count,
        };
        let artifact = self.artifact_mut()?;
        artifact
            .write_all(&0u32.to_le_bytes())
            .and_then(|_| artifact.write_message(&trailer))
            .and_then(|_| artifact.write_all(&RIVULET_FOOTER))
            .map_err(|e| Error::io("container trailer", e))?;

        let artifact = self
            .artifact
            .take()
            .ok_or_else(|| Error::invalid_operation("close: sink released"))?;
        let total = artifact.seal().map_err(|e| Error::io("seal", e))?;
        log::debug!("sink sealed at {total} bytes");
        self.sealed_size = total;
        Ok(())
    }

    fn flush_block(&mut self) -> Result<()> {
        if self.block_rows == 0 {
            return Ok(());
        }
        let rows = self.block_rows;
        let len = self.block.len() as u32;
        let block_checksum = checksum::compute(&self.block);
        let sync_marker = self.sync_marker;

        let artifact = self
            .artifact
            .as_mut()
            .ok_or_else(|| Error::invalid_operation("flush: sink released"))?;
        artifact
            .write_all(&rows.to_le_bytes())
            .and_then(|_| artifact.write_all(&len.to_le_bytes()))
            .and_then(|_| artifact.write_all(&self.block))
            .and_then(|_| artifact.write_all(&block_checksum.to_le_bytes()))
            .and_then(|_| artifact.write_all(&sync_marker))
            .map_err(|e| Error::io("container block", e))?;

        self.block_count += 1;
        log::trace!(
            "block {} written: {rows} rows, {len} bytes",
            self.block_count
        );
        self.block.clear();
        self.block_rows = 0;
        Ok(())
    }

    #[cfg(test)]
    fn set_max_block_size(&mut self, max_block_size: usize) {
        self.max_block_size = max_block_size;
        self.block_size = self.block_size.min(max_block_size);
    }

    fn artifact_mut(&mut self) -> Result<&mut ArtifactWriter> {
        self.artifact
            .as_mut()
            .ok_or_else(|| Error::invalid_operation("sink released"))
    }

    /// Moves the writer to the failed state and releases the sink without
    /// sealing it.
    fn fail(&mut self, error: Error) -> Error {
        log::warn!(
            "container writer failed after {} rows: {error}",
            self.row_count
        );
        self.state = WriterState::Failed;
        self.artifact = None;
        self.block = Vec::new();
        self.block_rows = 0;
        error
    }

    #[cold]
    fn aborted(operation: &str) -> Error {
        Error::invalid_operation(format!("{operation}: writer failed earlier"))
    }
}

impl Drop for ContainerWriter {
    fn drop(&mut self) {
        if matches!(
            self.state,
            WriterState::HeaderWritten | WriterState::Writing
        ) {
            log::warn!(
                "container writer dropped without close after {} rows; output is incomplete",
                self.row_count
            );
        }
    }
}
