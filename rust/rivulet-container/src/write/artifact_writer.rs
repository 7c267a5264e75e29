//! Appending writer over a [`SealingWrite`] sink that tracks the number of
//! bytes committed so far.

use rivulet_format::checksum;
use rivulet_io::SealingWrite;

/// A writer for appending container bytes to a sink, such as a file or an
/// in-memory buffer.
///
/// Thin wrapper over [`SealingWrite`]: it tracks the current write position
/// and encodes protobuf messages in the container's length-prefixed,
/// checksummed form. The output is completed by invoking [`seal`](Self::seal).
pub struct ArtifactWriter {
    inner: Box<dyn SealingWrite>,
    pos: u64,
}

impl ArtifactWriter {
    /// Creates an `ArtifactWriter` positioned at the start of `writer`.
    /// Nothing is written until the first call to `write_all`.
    pub fn new(writer: Box<dyn SealingWrite>) -> ArtifactWriter {
        ArtifactWriter {
            inner: writer,
            pos: 0,
        }
    }

    /// Returns the number of bytes written so far.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Writes (appends) the entire buffer to the sink.
    pub fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.inner.write_all(buf)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    /// Writes the encoded protobuf message: its length, the encoded message
    /// and the checksum of the encoded message.
    ///
    /// Returns the number of bytes the message occupies in the output.
    pub fn write_message<M>(&mut self, message: &M) -> std::io::Result<u64>
    where
        M: prost::Message,
    {
        let buf = checksum::prepare_message(message);
        self.write_all(&buf)?;
        Ok(buf.len() as u64)
    }

    /// Seals the sink, committing everything written so far.
    ///
    /// Returns the total size of the output.
    pub fn seal(mut self) -> std::io::Result<u64> {
        self.inner.seal()?;
        Ok(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use rivulet_format::{checksum::read_message, defs::ContainerTrailer};
    use rivulet_io::SharedBuffer;

    use super::*;

    #[test]
    fn test_artifact_writer_position() {
        let buffer = SharedBuffer::new();
        let mut writer = ArtifactWriter::new(Box::new(buffer.clone()));
        assert_eq!(writer.position(), 0);
        writer.write_all(b"abcde").unwrap();
        assert_eq!(writer.position(), 5);
        assert!(!buffer.is_sealed());
        assert_eq!(writer.seal().unwrap(), 5);
        assert!(buffer.is_sealed());
        assert_eq!(buffer.contents(), b"abcde");
    }

    #[test]
    fn test_artifact_writer_with_protobuf() {
        let buffer = SharedBuffer::new();
        let mut writer = ArtifactWriter::new(Box::new(buffer.clone()));
        let trailer = ContainerTrailer {
            row_count: 125,
            block_count: 2,
        };
        let len = writer.write_message(&trailer).unwrap();
        assert!(len > 8);
        assert_eq!(writer.position(), len);
        writer.seal().unwrap();

        let bytes = buffer.contents();
        let decoded: ContainerTrailer = read_message(&mut bytes.as_slice(), 1024, "trailer").unwrap();
        assert_eq!(decoded, trailer);
    }
}
