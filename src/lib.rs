//! # metalog
//!
//! An append-only, crash-recoverable record log for namespace metadata
//! mutations:
//! - Self-describing binary frames with CRC32 checksums
//! - Stable byte offsets as record addresses
//! - Random reads by offset
//! - Full replay through a caller-supplied scanner after restart
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Namespace Layer                          │
//! │        (owns the lock, interprets payloads, recovers)        │
//! └───────────┬───────────────────────────────────▲─────────────┘
//!             │ store_record / read_record / sync │ process_record
//! ┌───────────▼───────────────────────────────────┴─────────────┐
//! │                        LogFile                               │
//! │             (single writer, one file handle)                 │
//! └───────────┬─────────────────────────────────────────────────┘
//!             │
//!      ┌──────┴───────┐
//!      ▼              ▼
//! ┌──────────┐  ┌────────────┐
//! │  Frame   │  │ ByteBuffer │
//! │  Codec   │  │ (payloads) │
//! └──────────┘  └────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod buffer;
pub mod log;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use buffer::ByteBuffer;
pub use config::LogConfig;
pub use error::{ErrorKind, LogError, Result};
pub use log::{LogFile, RecordCollector, RecordScanner, ScanResult};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of metalog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
