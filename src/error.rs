//! Error types for metalog
//!
//! Provides a unified error type for all log operations.

use std::io;

use thiserror::Error;

/// Result type alias using LogError
pub type Result<T> = std::result::Result<T, LogError>;

/// Error raised by a [`RecordScanner`](crate::log::RecordScanner) to abort a replay
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for metalog operations
#[derive(Debug, Error)]
pub enum LogError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error during {op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    // -------------------------------------------------------------------------
    // Lifecycle / Format Errors
    // -------------------------------------------------------------------------
    #[error("Invalid log header: {0}")]
    Format(String),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Payload too large: {len} bytes (max {max})")]
    Size { len: usize, max: usize },

    #[error("Corrupt frame at offset {offset}: {reason}")]
    Corruption { offset: u64, reason: String },

    #[error("Truncated frame at offset {offset}: need {expected} bytes, {available} present")]
    Truncated {
        offset: u64,
        expected: u64,
        available: u64,
    },

    #[error("Offset {offset} is not a frame start in {start}..{end}")]
    OutOfRange { offset: u64, start: u64, end: u64 },

    // -------------------------------------------------------------------------
    // Replay Errors
    // -------------------------------------------------------------------------
    #[error("Scanner aborted replay at offset {offset}: {source}")]
    Scanner {
        offset: u64,
        #[source]
        source: BoxError,
    },
}

/// Coarse classification of a [`LogError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Format,
    State,
    Config,
    Size,
    /// Checksum mismatch, malformed frame, or truncated tail
    Corruption,
    OutOfRange,
    Scanner,
}

impl LogError {
    pub(crate) fn io(op: &'static str, source: io::Error) -> Self {
        LogError::Io { op, source }
    }

    pub(crate) fn corruption(offset: u64, reason: impl Into<String>) -> Self {
        LogError::Corruption {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn not_open(op: &str) -> Self {
        LogError::State(format!("{} requires an open log", op))
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LogError::Io { .. } => ErrorKind::Io,
            LogError::Format(_) => ErrorKind::Format,
            LogError::State(_) => ErrorKind::State,
            LogError::Config(_) => ErrorKind::Config,
            LogError::Size { .. } => ErrorKind::Size,
            LogError::Corruption { .. } | LogError::Truncated { .. } => ErrorKind::Corruption,
            LogError::OutOfRange { .. } => ErrorKind::OutOfRange,
            LogError::Scanner { .. } => ErrorKind::Scanner,
        }
    }

    /// True for checksum failures, malformed frames and torn tails
    pub fn is_corruption(&self) -> bool {
        self.kind() == ErrorKind::Corruption
    }

    /// True only for a frame cut short by end-of-file
    pub fn is_truncation(&self) -> bool {
        matches!(self, LogError::Truncated { .. })
    }

    /// Offset of the offending frame, when the error concerns one
    pub fn offset(&self) -> Option<u64> {
        match self {
            LogError::Corruption { offset, .. }
            | LogError::Truncated { offset, .. }
            | LogError::OutOfRange { offset, .. }
            | LogError::Scanner { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}
