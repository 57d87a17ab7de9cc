//! Response envelope format
//!
//! Binary format: [version(u8)] [field_tag(u8)] [value_len(u32)] [value_bytes] [checksum(u64)]
//!
//! The checksum is xxhash64 of every byte before it. A decoder rejects
//! versions and field tags it does not know.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Content type served with an encoded envelope
pub const CONTENT_TYPE: &str = "application/octet-stream";

const VERSION: u8 = 1;
const TAG_VALUE: u8 = 1;

/// version + tag + length
const HEADER_LEN: usize = 1 + 1 + 4;
const CHECKSUM_LEN: usize = 8;

/// Envelope encoding and decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("envelope truncated: need {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u8),

    #[error("unknown envelope field tag {0}")]
    UnknownField(u8),

    #[error("{0} trailing bytes after envelope")]
    TrailingBytes(usize),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: u64, actual: u64 },

    #[error("value of {0} bytes exceeds the u32 length field")]
    ValueTooLarge(usize),
}

/// Length prefix for a value of `len` bytes
fn value_len(len: usize) -> Result<u32, EnvelopeError> {
    u32::try_from(len).map_err(|_| EnvelopeError::ValueTooLarge(len))
}

/// Response to a peer lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheResponse {
    /// Raw value bytes
    pub value: Bytes,
}

impl CacheResponse {
    /// Wrap a value
    pub fn new(value: impl Into<Bytes>) -> Self {
        CacheResponse { value: value.into() }
    }

    /// Serialize to bytes with checksum
    ///
    /// Values longer than `u32::MAX` bytes cannot be framed and are rejected.
    pub fn encode(&self) -> Result<Bytes, EnvelopeError> {
        let len = value_len(self.value.len())?;
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.value.len() + CHECKSUM_LEN);

        buf.put_u8(VERSION);
        buf.put_u8(TAG_VALUE);
        buf.put_u32_le(len);
        buf.put_slice(&self.value);

        let checksum = xxhash_rust::xxh64::xxh64(&buf, 0);
        buf.put_u64_le(checksum);

        Ok(buf.freeze())
    }

    /// Deserialize from bytes, verifying the checksum
    pub fn decode(data: &[u8]) -> Result<Self, EnvelopeError> {
        if data.len() < HEADER_LEN + CHECKSUM_LEN {
            return Err(EnvelopeError::Truncated {
                needed: HEADER_LEN + CHECKSUM_LEN,
                got: data.len(),
            });
        }

        if data[0] != VERSION {
            return Err(EnvelopeError::UnsupportedVersion(data[0]));
        }

        if data[1] != TAG_VALUE {
            return Err(EnvelopeError::UnknownField(data[1]));
        }

        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&data[2..HEADER_LEN]);
        let value_len = u32::from_le_bytes(len_bytes) as usize;

        let end = HEADER_LEN + value_len;
        let needed = end + CHECKSUM_LEN;
        if data.len() < needed {
            return Err(EnvelopeError::Truncated {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(EnvelopeError::TrailingBytes(data.len() - needed));
        }

        let mut checksum_bytes = [0u8; 8];
        checksum_bytes.copy_from_slice(&data[end..needed]);
        let expected = u64::from_le_bytes(checksum_bytes);
        let actual = xxhash_rust::xxh64::xxh64(&data[..end], 0);
        if expected != actual {
            return Err(EnvelopeError::ChecksumMismatch { expected, actual });
        }

        Ok(CacheResponse {
            value: Bytes::copy_from_slice(&data[HEADER_LEN..end]),
        })
    }
}
