//! Log file header
//!
//! Written once when a log file is created, validated on every open.

use crate::error::{LogError, Result};

/// Magic marker at offset 0
pub const LOG_MAGIC: [u8; 4] = *b"MLOG";

/// The only frame layout this build understands
pub const LOG_VERSION: u8 = 1;

/// Header size: 4 bytes magic + 1 byte version
pub const HEADER_SIZE: usize = 5;

/// Encode the header for a new log file
pub fn encode_header() -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[..4].copy_from_slice(&LOG_MAGIC);
    header[4] = LOG_VERSION;
    header
}

/// Validate a header and return its version byte
pub fn decode_header(bytes: &[u8]) -> Result<u8> {
    if bytes.len() < HEADER_SIZE {
        return Err(LogError::Format(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    if bytes[..4] != LOG_MAGIC {
        return Err(LogError::Format(format!(
            "Bad magic: expected {:02x?}, found {:02x?}",
            LOG_MAGIC,
            &bytes[..4]
        )));
    }

    let version = bytes[4];
    if version != LOG_VERSION {
        return Err(LogError::Format(format!(
            "Unsupported version {} (this build reads version {})",
            version, LOG_VERSION
        )));
    }

    Ok(version)
}
