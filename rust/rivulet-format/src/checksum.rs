use std::io::Read;

use rivulet_common::{Result, error::Error};

use crate::defs::{CHECKSUM_SIZE, MESSAGE_LEN_SIZE};

/// Validates a buffer by comparing its computed checksum with the provided checksum.
///
/// # Errors
///
/// Returns `ChecksumMismatch` if the computed checksum does not match.
pub fn validate_buffer(buf: &[u8], checksum: u32, name: Option<&str>) -> Result<()> {
    use rivulet_common::error::ErrorKind;

    let actual = compute(buf);
    if actual == checksum {
        Ok(())
    } else {
        Err(ErrorKind::ChecksumMismatch {
            element: name.unwrap_or_default().to_string(),
        }
        .into())
    }
}

/// Computes a checksum for a given buffer using the xxHash algorithm.
pub fn compute(buf: &[u8]) -> u32 {
    let h = xxhash_rust::xxh3::xxh3_64(buf);
    (h as u32) ^ ((h >> 32) as u32)
}

/// Encodes a protobuf message into its length-prefixed and checksummed form.
pub fn prepare_message<M>(message: &M) -> Vec<u8>
where
    M: prost::Message,
{
    let message_len = message.encoded_len();
    assert!(message_len < u32::MAX as usize);
    let mut buf = Vec::<u8>::with_capacity(message_len + MESSAGE_LEN_SIZE + CHECKSUM_SIZE);

    // Reserve space for the length prefix.
    buf.resize(MESSAGE_LEN_SIZE, 0);
    message
        .encode(&mut buf)
        .expect("encode message to vec must succeed");
    let message_len = buf.len() - MESSAGE_LEN_SIZE;
    let checksum = compute(&buf[MESSAGE_LEN_SIZE..]);
    buf[0..MESSAGE_LEN_SIZE].copy_from_slice(&(message_len as u32).to_le_bytes());
    buf.extend_from_slice(&checksum.to_le_bytes());
    buf
}

/// Reads one length-prefixed, checksummed protobuf message from `reader` and
/// decodes it.
///
/// # Errors
///
/// `InvalidFormat` if the stream ends early, the declared length exceeds
/// `max_len` or the payload does not decode; `ChecksumMismatch` if the
/// checksum does not match.
pub fn read_message<M, R>(reader: &mut R, max_len: usize, name: &str) -> Result<M>
where
    M: prost::Message + Default,
    R: Read + ?Sized,
{
    let mut len_buf = [0u8; MESSAGE_LEN_SIZE];
    read_exact(reader, &mut len_buf, name)?;
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > max_len {
        return Err(Error::invalid_format_msg(
            name,
            format!("message length {len} exceeds the limit of {max_len}"),
        ));
    }
    let mut payload = vec![0u8; len];
    read_exact(reader, &mut payload, name)?;
    let mut checksum_buf = [0u8; CHECKSUM_SIZE];
    read_exact(reader, &mut checksum_buf, name)?;
    validate_buffer(&payload, u32::from_le_bytes(checksum_buf), Some(name))?;
    M::decode(payload.as_slice()).map_err(|e| Error::invalid_format_msg(name, e.to_string()))
}

/// Fills `buf` from `reader`, reporting a premature end of stream as a
/// truncated container rather than as an I/O failure.
pub fn read_exact<R>(reader: &mut R, buf: &mut [u8], name: &str) -> Result<()>
where
    R: Read + ?Sized,
{
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::invalid_format_msg(name, "truncated container")
        } else {
            Error::io(name, e)
        }
    })
}

#[inline]
pub fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes(bytes[..4].try_into().expect("u32 bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::ContainerTrailer;
    use rivulet_common::error::ErrorKind;

    #[test]
    fn test_validate_buffer_invalid_checksum() {
        let buf = b"testdata";
        let checksum = compute(buf) ^ 0x1000;

        let err = validate_buffer(buf, checksum, Some("buffer")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_prepared_message_reads_back() {
        let trailer = ContainerTrailer {
            row_count: 125,
            block_count: 2,
        };
        let buf = prepare_message(&trailer);
        let len = read_u32_le(&buf) as usize;
        assert_eq!(buf.len(), MESSAGE_LEN_SIZE + len + CHECKSUM_SIZE);
        assert_eq!(
            read_u32_le(&buf[MESSAGE_LEN_SIZE + len..]),
            compute(&buf[MESSAGE_LEN_SIZE..MESSAGE_LEN_SIZE + len])
        );

        let mut reader = buf.as_slice();
        let decoded: ContainerTrailer = read_message(&mut reader, 1024, "trailer").unwrap();
        assert_eq!(decoded, trailer);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_message_truncated() {
        let buf = prepare_message(&ContainerTrailer {
            row_count: 1,
            block_count: 1,
        });
        let mut reader = &buf[..buf.len() - 1];
        let err = read_message::<ContainerTrailer, _>(&mut reader, 1024, "trailer").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
    }

    #[test]
    fn test_read_message_length_limit() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&64u32.to_le_bytes());
        buf.extend_from_slice(&[0u8; 64]);
        buf.extend_from_slice(&compute(&[0u8; 64]).to_le_bytes());
        let mut reader = buf.as_slice();
        let err = read_message::<ContainerTrailer, _>(&mut reader, 16, "trailer").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
    }
}
