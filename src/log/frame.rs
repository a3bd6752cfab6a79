//! Record Codec
//!
//! Pure framing functions: (type, payload) to on-disk bytes and back.
//!
//! ## Frame Layout (little-endian)
//! ```text
//! ┌──────────┬──────────┬──────────┬─────────────────────┐
//! │ Type (1) │ Len (4)  │ CRC (4)  │  Payload (Len)      │
//! └──────────┴──────────┴──────────┴─────────────────────┘
//! ```
//!
//! The CRC32 covers the type byte, the length bytes and the payload.

use crc32fast::Hasher;

use crate::error::{LogError, Result};

/// Frame header size: 1 byte type + 4 bytes length + 4 bytes CRC
pub const FRAME_HEADER_SIZE: usize = 9;

/// Format ceiling on payload length (64 MB). Longer declared lengths are corrupt.
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024 * 1024;

/// Parsed frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub record_type: u8,
    pub length: u32,
    pub checksum: u32,
}

impl FrameHeader {
    /// Build the header that describes `payload`
    ///
    /// Fails with `LogError::Size` when the length does not fit the u32 field.
    pub fn for_payload(record_type: u8, payload: &[u8]) -> Result<Self> {
        let length = u32::try_from(payload.len()).map_err(|_| LogError::Size {
            len: payload.len(),
            max: u32::MAX as usize,
        })?;
        Ok(Self {
            record_type,
            length,
            checksum: frame_checksum(record_type, length, payload),
        })
    }

    pub fn encode(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut bytes = [0u8; FRAME_HEADER_SIZE];
        bytes[0] = self.record_type;
        bytes[1..5].copy_from_slice(&self.length.to_le_bytes());
        bytes[5..9].copy_from_slice(&self.checksum.to_le_bytes());
        bytes
    }

    /// Parse header bytes. Structural checks happen in `validate_length`.
    pub fn decode(bytes: &[u8; FRAME_HEADER_SIZE]) -> Self {
        Self {
            record_type: bytes[0],
            length: u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
            checksum: u32::from_le_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]),
        }
    }

    pub fn payload_len(&self) -> usize {
        self.length as usize
    }

    /// Header plus payload, in bytes
    pub fn frame_len(&self) -> u64 {
        FRAME_HEADER_SIZE as u64 + self.length as u64
    }

    /// Reject lengths no writer of this format could have produced
    pub fn validate_length(&self, offset: u64) -> Result<()> {
        if self.payload_len() > MAX_PAYLOAD_SIZE {
            return Err(LogError::corruption(
                offset,
                format!(
                    "declared payload length {} exceeds format limit {}",
                    self.length, MAX_PAYLOAD_SIZE
                ),
            ));
        }
        Ok(())
    }

    /// Recompute the checksum over `payload` and compare
    pub fn verify(&self, offset: u64, payload: &[u8]) -> Result<()> {
        if payload.len() != self.payload_len() {
            return Err(LogError::corruption(
                offset,
                format!(
                    "payload is {} bytes, header declares {}",
                    payload.len(),
                    self.length
                ),
            ));
        }

        let actual = frame_checksum(self.record_type, self.length, payload);
        if actual != self.checksum {
            return Err(LogError::corruption(
                offset,
                format!(
                    "checksum mismatch: stored {:#010x}, computed {:#010x}",
                    self.checksum, actual
                ),
            ));
        }
        Ok(())
    }
}

/// CRC32 over type, length and payload
pub fn frame_checksum(record_type: u8, length: u32, payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[record_type]);
    hasher.update(&length.to_le_bytes());
    hasher.update(payload);
    hasher.finalize()
}

/// Encode a complete frame (header followed by payload)
///
/// Callers enforce their own size limit first; this only guards the format ceiling.
pub fn encode_frame(record_type: u8, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(LogError::Size {
            len: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let header = FrameHeader::for_payload(record_type, payload)?;
    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    frame.extend_from_slice(&header.encode());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Decode one frame from the front of `bytes`
///
/// `offset` is only used to label errors. Returns the type, the payload slice
/// and the number of bytes consumed.
pub fn decode_frame(offset: u64, bytes: &[u8]) -> Result<(u8, &[u8], usize)> {
    if bytes.len() < FRAME_HEADER_SIZE {
        return Err(LogError::Truncated {
            offset,
            expected: FRAME_HEADER_SIZE as u64,
            available: bytes.len() as u64,
        });
    }

    let mut header_bytes = [0u8; FRAME_HEADER_SIZE];
    header_bytes.copy_from_slice(&bytes[..FRAME_HEADER_SIZE]);
    let header = FrameHeader::decode(&header_bytes);
    header.validate_length(offset)?;

    let total = header.frame_len() as usize;
    if bytes.len() < total {
        return Err(LogError::Truncated {
            offset,
            expected: total as u64,
            available: bytes.len() as u64,
        });
    }

    let payload = &bytes[FRAME_HEADER_SIZE..total];
    header.verify(offset, payload)?;
    Ok((header.record_type, payload, total))
}
