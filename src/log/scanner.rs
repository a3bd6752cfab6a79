//! Record Scanner
//!
//! The consumer side of replay. The namespace layer implements
//! [`RecordScanner`] (or passes a closure) and receives every frame once,
//! in ascending offset order.

use crate::buffer::ByteBuffer;
use crate::error::BoxError;

/// Outcome of processing one record. `Err` aborts the replay.
pub type ScanResult = std::result::Result<(), BoxError>;

/// Receives `(offset, type, payload)` for each frame during replay
pub trait RecordScanner {
    fn process_record(&mut self, offset: u64, record_type: u8, payload: &[u8]) -> ScanResult;
}

impl<F> RecordScanner for F
where
    F: FnMut(u64, u8, &[u8]) -> ScanResult,
{
    fn process_record(&mut self, offset: u64, record_type: u8, payload: &[u8]) -> ScanResult {
        self(offset, record_type, payload)
    }
}

/// A record as seen during replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedRecord {
    pub offset: u64,
    pub record_type: u8,
    pub payload: ByteBuffer,
}

/// Scanner that keeps a copy of every record it is handed
#[derive(Debug, Default)]
pub struct RecordCollector {
    records: Vec<ScannedRecord>,
}

impl RecordCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ScannedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<ScannedRecord> {
        self.records
    }
}

impl RecordScanner for RecordCollector {
    fn process_record(&mut self, offset: u64, record_type: u8, payload: &[u8]) -> ScanResult {
        self.records.push(ScannedRecord {
            offset,
            record_type,
            payload: ByteBuffer::from(payload),
        });
        Ok(())
    }
}
