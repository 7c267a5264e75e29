//! Sequential container reader.

use std::io::Read;

use rivulet_common::{Result, error::Error, try_or_ret_some_err, verify_data};
use rivulet_format::{
    checksum::{self, read_exact, read_message},
    defs::{
        BLOCK_PREFIX_SIZE, CHECKSUM_SIZE, ContainerTrailer, HeaderProperties, MAX_BLOCK_SIZE,
        MAX_MESSAGE_SIZE, RIVULET_FOOTER, RIVULET_HEADER_SIZE, RIVULET_MAGIC, RIVULET_VERSION_MAJOR,
        SYNC_MARKER_SIZE, SchemaDef,
    },
    schema::RecordSchema,
    value::Row,
};

use super::row_decoder::decode_row;

/// Reads a container produced by
/// [`ContainerWriter`](crate::write::container_writer::ContainerWriter)
/// block by block, holding at most one block in memory.
///
/// The reader verifies the framing as it goes: message and block checksums,
/// the sync marker after every block, and the trailer row and block counts.
/// A container that ends before its terminal marker is reported as
/// `InvalidFormat`, never as a shorter result.
pub struct ContainerReader<R> {
    source: R,
    schema: RecordSchema,
    properties: Vec<(String, String)>,
    sync_marker: [u8; SYNC_MARKER_SIZE],
    block: Vec<u8>,
    block_pos: usize,
    block_rows_remaining: u32,
    rows_read: u64,
    blocks_read: u64,
    finished: bool,
}

impl<R: Read> ContainerReader<R> {
    /// Reads and validates the container header.
    ///
    /// # Errors
    ///
    /// `InvalidFormat` if the source does not start with a container header
    /// of a supported version, `ChecksumMismatch` for a corrupted header
    /// message, `Io` if the source fails.
    pub fn open(mut source: R) -> Result<ContainerReader<R>> {
        let mut header = [0u8; RIVULET_HEADER_SIZE];
        read_exact(&mut source, &mut header, "header")?;
        if header[..RIVULET_MAGIC.len()] != RIVULET_MAGIC {
            return Err(Error::invalid_format_msg(
                "header",
                "not a rivulet container",
            ));
        }
        let major = header[RIVULET_HEADER_SIZE - 1];
        if major != RIVULET_VERSION_MAJOR {
            return Err(Error::invalid_format_msg(
                "header",
                format!("unsupported container major version {major}"),
            ));
        }

        let schema_def: SchemaDef = read_message(&mut source, MAX_MESSAGE_SIZE, "schema")?;
        let schema = RecordSchema::from_def(schema_def)?;
        let properties: HeaderProperties =
            read_message(&mut source, MAX_MESSAGE_SIZE, "properties")?;
        let mut sync_marker = [0u8; SYNC_MARKER_SIZE];
        read_exact(&mut source, &mut sync_marker, "sync marker")?;

        log::debug!(
            "container opened: record '{}', {} fields",
            schema.name(),
            schema.len()
        );
        Ok(ContainerReader {
            source,
            schema,
            properties: properties
                .properties
                .into_iter()
                .map(|p| (p.name, p.value))
                .collect(),
            sync_marker,
            block: Vec::new(),
            block_pos: 0,
            block_rows_remaining: 0,
            rows_read: 0,
            blocks_read: 0,
            finished: false,
        })
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    /// Returns the value of the first header property with the given name.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn sync_marker(&self) -> &[u8; SYNC_MARKER_SIZE] {
        &self.sync_marker
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    pub fn blocks_read(&self) -> u64 {
        self.blocks_read
    }

    /// Returns `true` once the terminal marker and the trailer were read and
    /// verified, or after an error.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Decodes the next row into `row`.
    ///
    /// Returns `false` at the verified end of the container. After an error
    /// the reader is finished and returns `false` from then on.
    pub fn next_row(&mut self, row: &mut Row) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }
        let result = self.read_row(row);
        if result.is_err() {
            self.finished = true;
        }
        result
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    fn read_row(&mut self, row: &mut Row) -> Result<bool> {
        while self.block_rows_remaining == 0 {
            if !self.load_next_block()? {
                return Ok(false);
            }
        }

        let mut input = &self.block[self.block_pos..];
        let available = input.len();
        decode_row(&self.schema, &mut input, row)?;
        self.block_pos += available - input.len();
        self.block_rows_remaining -= 1;
        self.rows_read += 1;
        if self.block_rows_remaining == 0 {
            verify_data!(block, self.block_pos == self.block.len());
        }
        Ok(true)
    }

    fn load_next_block(&mut self) -> Result<bool> {
        let mut prefix = [0u8; BLOCK_PREFIX_SIZE];
        read_exact(&mut self.source, &mut prefix[..4], "block")?;
        let row_count = checksum::read_u32_le(&prefix[..4]);
        if row_count == 0 {
            self.read_trailer()?;
            return Ok(false);
        }

        read_exact(&mut self.source, &mut prefix[4..], "block")?;
        let len = checksum::read_u32_le(&prefix[4..]) as usize;
        if len > MAX_BLOCK_SIZE {
            return Err(Error::invalid_format_msg(
                "block",
                format!("block length {len} exceeds the limit of {MAX_BLOCK_SIZE}"),
            ));
        }
        self.block.clear();
        let read = (&mut self.source)
            .take(len as u64)
            .read_to_end(&mut self.block)
            .map_err(|e| Error::io("block", e))?;
        if read < len {
            return Err(Error::invalid_format_msg("block", "truncated container"));
        }

        let mut checksum_buf = [0u8; CHECKSUM_SIZE];
        read_exact(&mut self.source, &mut checksum_buf, "block")?;
        checksum::validate_buffer(
            &self.block,
            u32::from_le_bytes(checksum_buf),
            Some("block"),
        )?;

        let mut sync_marker = [0u8; SYNC_MARKER_SIZE];
        read_exact(&mut self.source, &mut sync_marker, "sync marker")?;
        if sync_marker != self.sync_marker {
            return Err(Error::invalid_format_msg(
                "sync marker",
                format!("mismatch after block {}", self.blocks_read + 1),
            ));
        }

        self.blocks_read += 1;
        self.block_pos = 0;
        self.block_rows_remaining = row_count;
        log::trace!("block {} loaded: {row_count} rows, {len} bytes", self.blocks_read);
        Ok(true)
    }

    fn read_trailer(&mut self) -> Result<()> {
        let trailer: ContainerTrailer = read_message(&mut self.source, MAX_MESSAGE_SIZE, "trailer")?;
        let mut footer = [0u8; RIVULET_HEADER_SIZE];
        read_exact(&mut self.source, &mut footer, "footer")?;
        verify_data!(footer, footer == RIVULET_FOOTER);
        if trailer.row_count != self.rows_read || trailer.block_count != self.blocks_read {
            return Err(Error::invalid_format_msg(
                "trailer",
                format!(
                    "trailer reports {} rows in {} blocks, read {} rows in {} blocks",
                    trailer.row_count, trailer.block_count, self.rows_read, self.blocks_read
                ),
            ));
        }
        self.finished = true;
        self.block = Vec::new();
        log::debug!(
            "container read: {} rows in {} blocks",
            self.rows_read,
            self.blocks_read
        );
        Ok(())
    }
}

impl<R: Read> Iterator for ContainerReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Result<Row>> {
        let mut row = Row::with_capacity(self.schema.len());
        let has_row = try_or_ret_some_err!(self.next_row(&mut row));
        has_row.then_some(Ok(row))
    }
}
