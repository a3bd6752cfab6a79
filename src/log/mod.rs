//! Log Module
//!
//! Append-only record log for namespace metadata mutations.
//!
//! ## Responsibilities
//! - Append typed, opaque records and hand back stable byte offsets
//! - CRC32 checksums on every frame
//! - Random reads by offset
//! - Full replay through a caller-supplied scanner after restart
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Header                                  │
//! │ ┌────────────┬─────────────┐            │
//! │ │ Magic (4)  │ Version (1) │            │
//! │ └────────────┴─────────────┘            │
//! ├─────────────────────────────────────────┤
//! │ Frame 1                                 │
//! │ ┌──────────┬─────────┬─────────┬──────┐ │
//! │ │ Type (1) │ Len (4) │ CRC (4) │ Data │ │
//! │ └──────────┴─────────┴─────────┴──────┘ │
//! ├─────────────────────────────────────────┤
//! │ Frame 2                                 │
//! │ ┌──────────┬─────────┬─────────┬──────┐ │
//! │ │ Type (1) │ Len (4) │ CRC (4) │ Data │ │
//! │ └──────────┴─────────┴─────────┴──────┘ │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Torn Tails
//! A crash mid-append leaves a partial frame at end-of-file. Replay delivers
//! every complete frame and then fails with `LogError::Truncated`. Zero
//! trailing bytes is a clean end. See [`recovery`] for an explicit repair.

mod frame;
mod header;
mod scanner;
mod store;
pub mod recovery;

pub use frame::{
    decode_frame, encode_frame, frame_checksum, FrameHeader, FRAME_HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use header::{decode_header, encode_header, HEADER_SIZE, LOG_MAGIC, LOG_VERSION};
pub use recovery::RecoveryReport;
pub use scanner::{RecordCollector, RecordScanner, ScanResult, ScannedRecord};
pub use store::{LogFile, FIRST_FRAME_OFFSET};
