//! Log Recovery
//!
//! Opt-in tools for the caller that owns recovery decisions. Nothing here runs
//! implicitly on open.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{info, warn};

use crate::config::LogConfig;
use crate::error::{LogError, Result};

use super::{decode_frame, LogFile, ScanResult, FIRST_FRAME_OFFSET, FRAME_HEADER_SIZE};

/// Result of a verify or repair pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Number of complete, checksum-valid frames
    pub records: u64,

    /// Offset of the last valid frame
    pub last_offset: Option<u64>,

    /// End of the last valid frame
    pub valid_end: u64,

    /// File length before any repair
    pub file_len: u64,

    /// Whether a partial frame trails the valid frames
    pub torn_tail: bool,

    /// Whether the torn tail was cut off
    pub was_truncated: bool,
}

/// Replay a log read-only and report its shape
///
/// A torn tail is reported, not returned as an error. A checksum failure on a
/// fully present frame is returned as `LogError::Corruption`.
///
/// Only the last append can be torn. When a complete, checksum-valid frame
/// follows the point where replay stopped, the stopping frame's length field
/// is damaged and the log is reported as `LogError::Corruption`.
pub fn verify(path: &Path) -> Result<RecoveryReport> {
    let config = LogConfig::builder().read_only(true).build();
    let mut log = LogFile::with_config(config);
    log.open(path)?;

    let file_len = log.end_offset().unwrap_or(FIRST_FRAME_OFFSET);
    let mut records = 0u64;
    let mut last_offset = None;
    let mut valid_end = FIRST_FRAME_OFFSET;

    let mut track = |offset: u64, _record_type: u8, payload: &[u8]| -> ScanResult {
        records += 1;
        last_offset = Some(offset);
        valid_end = offset + FRAME_HEADER_SIZE as u64 + payload.len() as u64;
        Ok(())
    };

    let torn_tail = match log.scan_all_records(&mut track) {
        Ok(_) => false,
        Err(LogError::Truncated { .. }) => true,
        Err(e) => return Err(e),
    };

    log.close();

    if torn_tail {
        if let Some(found) = find_complete_frame(path, valid_end, file_len)? {
            warn!(
                path = %path.display(),
                valid_end,
                found,
                "complete frame follows a frame cut short by end-of-file"
            );
            return Err(LogError::corruption(
                valid_end,
                format!(
                    "declared length overruns the file but a complete frame starts at offset {}",
                    found
                ),
            ));
        }
    }

    Ok(RecoveryReport {
        records,
        last_offset,
        valid_end,
        file_len,
        torn_tail,
        was_truncated: false,
    })
}

/// Verify, then cut off a torn tail if one exists
///
/// Never removes a fully present frame, corrupt or not. A damaged length field
/// that hides later frames fails in `verify` before anything is truncated.
pub fn repair(path: &Path) -> Result<RecoveryReport> {
    let mut report = verify(path)?;

    if report.torn_tail {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| LogError::io("open", e))?;
        file.set_len(report.valid_end)
            .map_err(|e| LogError::io("truncate", e))?;
        file.sync_all().map_err(|e| LogError::io("sync", e))?;

        info!(
            path = %path.display(),
            removed = report.file_len - report.valid_end,
            valid_end = report.valid_end,
            "truncated torn tail"
        );
        report.was_truncated = true;
    }

    Ok(report)
}

/// Search `start..end` for a checksum-valid frame beginning after `start`
///
/// The frame at `start` itself is the one replay could not finish.
fn find_complete_frame(path: &Path, start: u64, end: u64) -> Result<Option<u64>> {
    let mut file = File::open(path).map_err(|e| LogError::io("open", e))?;
    file.seek(SeekFrom::Start(start))
        .map_err(|e| LogError::io("seek", e))?;

    let mut tail = Vec::new();
    file.take(end - start)
        .read_to_end(&mut tail)
        .map_err(|e| LogError::io("read", e))?;

    for skip in 1..tail.len().saturating_sub(FRAME_HEADER_SIZE - 1) {
        let offset = start + skip as u64;
        if decode_frame(offset, &tail[skip..]).is_ok() {
            return Ok(Some(offset));
        }
    }

    Ok(None)
}
