//! Configuration for metalog
//!
//! Centralized configuration with sensible defaults.

use crate::error::{LogError, Result};
use crate::log::MAX_PAYLOAD_SIZE;

/// Configuration for a [`LogFile`](crate::log::LogFile) handle
#[derive(Debug, Clone)]
pub struct LogConfig {
    // -------------------------------------------------------------------------
    // Record Configuration
    // -------------------------------------------------------------------------
    /// Largest payload `store_record` accepts (in bytes).
    /// Never larger than the format ceiling, `MAX_PAYLOAD_SIZE`.
    pub max_payload_size: usize,

    // -------------------------------------------------------------------------
    // Open Configuration
    // -------------------------------------------------------------------------
    /// Create the file (and write its header) when it does not exist
    pub create_if_missing: bool,

    /// Open without write access. Appends fail, sync is a no-op.
    pub read_only: bool,

    /// fsync the header and parent directory after creating a new file
    pub sync_on_create: bool,

    // -------------------------------------------------------------------------
    // Read Configuration
    // -------------------------------------------------------------------------
    /// Read-ahead buffer used by replay and the open-time index walk (bytes)
    pub scan_buffer_size: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_payload_size: 16 * 1024 * 1024, // 16 MB
            create_if_missing: true,
            read_only: false,
            sync_on_create: true,
            scan_buffer_size: 64 * 1024, // 64 KB
        }
    }
}

impl LogConfig {
    /// Create a new config builder
    pub fn builder() -> LogConfigBuilder {
        LogConfigBuilder::default()
    }

    /// Check limits before a handle is opened with this config
    pub fn validate(&self) -> Result<()> {
        if self.max_payload_size > MAX_PAYLOAD_SIZE {
            return Err(LogError::Config(format!(
                "max_payload_size {} exceeds format limit {}",
                self.max_payload_size, MAX_PAYLOAD_SIZE
            )));
        }
        if self.scan_buffer_size == 0 {
            return Err(LogError::Config("scan_buffer_size must be non-zero".to_string()));
        }
        if self.read_only && self.create_if_missing {
            // A read-only handle can never write a header
            return Err(LogError::Config(
                "read_only handles cannot create_if_missing".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for LogConfig
#[derive(Default)]
pub struct LogConfigBuilder {
    config: LogConfig,
}

impl LogConfigBuilder {
    /// Set the maximum accepted payload size (in bytes)
    pub fn max_payload_size(mut self, size: usize) -> Self {
        self.config.max_payload_size = size;
        self
    }

    /// Create missing files on open
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    /// Open as a reader-only handle. Also disables `create_if_missing`.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.config.read_only = read_only;
        if read_only {
            self.config.create_if_missing = false;
        }
        self
    }

    /// fsync after creating a new log file
    pub fn sync_on_create(mut self, sync: bool) -> Self {
        self.config.sync_on_create = sync;
        self
    }

    /// Set the replay read-ahead buffer size (in bytes)
    pub fn scan_buffer_size(mut self, size: usize) -> Self {
        self.config.scan_buffer_size = size;
        self
    }

    pub fn build(self) -> LogConfig {
        self.config
    }
}
