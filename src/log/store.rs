//! Log File Store
//!
//! Owns one open log file and provides append, random read by offset, and
//! full replay.
//!
//! ## Lifecycle
//! ```text
//!   Closed ──open(ok)──▶ Open ──close()/drop──▶ Closed
//!     ▲
//!     └──── open(err) stays Closed
//! ```
//!
//! ## Concurrency
//! Not internally synchronized. All operations take `&mut self`; callers that
//! share a handle wrap it in their own lock. Separate read-only handles may
//! replay the same file while no writer is active.
//!
//! ## Durability
//! `store_record` never fsyncs. Call `sync` after a batch of appends to
//! establish a durability barrier.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, trace, warn};

use crate::buffer::ByteBuffer;
use crate::config::LogConfig;
use crate::error::{LogError, Result};

use super::frame::{self, FrameHeader, FRAME_HEADER_SIZE};
use super::header::{self, HEADER_SIZE};
use super::RecordScanner;

/// Offset of the first frame in every log file
pub const FIRST_FRAME_OFFSET: u64 = HEADER_SIZE as u64;

/// Handle to one append-only log file
///
/// Created closed. The file descriptor is released by `close` or when the
/// handle is dropped.
///
/// An open handle keeps the start offset of every frame in memory, 8 bytes
/// per record, and `open` reads every frame header once to build it. Both
/// costs are linear in the number of records.
#[derive(Debug, Default)]
pub struct LogFile {
    config: LogConfig,

    /// `Some` while open
    state: Option<OpenLog>,
}

/// State that only exists while a file is open
#[derive(Debug)]
struct OpenLog {
    path: PathBuf,
    file: File,

    /// Version byte from the file header
    version: u8,

    /// Physical end-of-file; the next frame starts here
    end: u64,

    /// End of the last complete frame. Differs from `end` only with a torn tail.
    valid_end: u64,

    /// Start offsets of every complete frame, ascending
    frames: Vec<u64>,

    /// Known position of the file cursor, `None` when unknown
    cursor: Option<u64>,

    writable: bool,
}

impl LogFile {
    /// Create a closed handle with the default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a closed handle with the given config
    pub fn with_config(config: LogConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Open `path` with the default config (convenience method)
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut log = Self::new();
        log.open(path)?;
        Ok(log)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Open or create the log at `path`
    ///
    /// 1. Fail if this handle is already open
    /// 2. Create the file and write the header, or validate an existing header
    /// 3. Walk frame headers to index every complete frame
    ///
    /// A failed open leaves the handle closed.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(open) = &self.state {
            return Err(LogError::State(format!(
                "log already open at {}",
                open.path.display()
            )));
        }

        self.config.validate()?;

        let log = OpenLog::open(path, &self.config)?;
        info!(
            path = %path.display(),
            frames = log.frames.len(),
            end = log.end,
            read_only = !log.writable,
            "opened log"
        );

        self.state = Some(log);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    /// Release the file descriptor. Closing a closed handle is a no-op.
    ///
    /// Does not fsync; call `sync` first when durability matters.
    pub fn close(&mut self) {
        if let Some(log) = self.state.take() {
            debug!(path = %log.path.display(), end = log.end, "closed log");
        }
    }

    /// Force every preceding append to stable storage
    pub fn sync(&mut self) -> Result<()> {
        let log = self.open_state("sync")?;

        if !log.writable {
            return Ok(());
        }

        log.file
            .sync_data()
            .map_err(|e| LogError::io("sync", e))?;
        debug!(path = %log.path.display(), end = log.end, "synced log");
        Ok(())
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Append one frame and return its starting offset
    ///
    /// Offsets are strictly increasing across calls on one handle.
    pub fn store_record(&mut self, record_type: u8, payload: &[u8]) -> Result<u64> {
        let max = self.config.max_payload_size;
        let log = self.open_state("store_record")?;

        if !log.writable {
            return Err(LogError::State(
                "store_record on a read-only handle".to_string(),
            ));
        }

        if log.valid_end != log.end {
            return Err(LogError::State(format!(
                "log has a torn tail at offset {}; repair it before appending",
                log.valid_end
            )));
        }

        if payload.len() > max {
            return Err(LogError::Size {
                len: payload.len(),
                max,
            });
        }

        let bytes = frame::encode_frame(record_type, payload)?;
        let offset = log.end;

        if log.cursor != Some(offset) {
            log.cursor = None;
            log.file
                .seek(SeekFrom::Start(offset))
                .map_err(|e| LogError::io("seek", e))?;
        }

        if let Err(e) = log.file.write_all(&bytes) {
            log.rollback(offset);
            return Err(LogError::io("write", e));
        }

        log.end += bytes.len() as u64;
        log.valid_end = log.end;
        log.cursor = Some(log.end);
        log.frames.push(offset);

        trace!(offset, record_type, len = payload.len(), "appended frame");
        Ok(offset)
    }

    /// Read the frame starting at `offset` into `out` and return its type
    ///
    /// With `seek == false` the read trusts the file cursor when it already
    /// sits on `offset` (sequential reads). It still seeks when it does not.
    pub fn read_record(&mut self, offset: u64, out: &mut ByteBuffer, seek: bool) -> Result<u8> {
        let log = self.open_state("read_record")?;

        if log.frames.binary_search(&offset).is_err() {
            return Err(LogError::OutOfRange {
                offset,
                start: FIRST_FRAME_OFFSET,
                end: log.end,
            });
        }

        let position = if seek { None } else { log.cursor };
        log.cursor = None;

        let mut file = &log.file;
        let result = read_frame(&mut file, position, offset, log.end - offset, out);

        match result {
            Ok(record_type) => {
                log.cursor = Some(offset + FRAME_HEADER_SIZE as u64 + out.len() as u64);
                Ok(record_type)
            }
            // Random reads report an overrunning length as a bounds failure
            Err(LogError::Truncated { .. }) => Err(LogError::OutOfRange {
                offset,
                start: FIRST_FRAME_OFFSET,
                end: log.end,
            }),
            Err(e) => Err(e),
        }
    }

    /// Replay every frame, in offset order, through `scanner`
    ///
    /// Returns the number of frames replayed. A frame cut short by
    /// end-of-file stops the replay with `LogError::Truncated` after every
    /// earlier frame was delivered. Checksum failures and scanner errors stop
    /// it with `Corruption` and `Scanner` respectively.
    pub fn scan_all_records<S>(&mut self, scanner: &mut S) -> Result<u64>
    where
        S: RecordScanner + ?Sized,
    {
        let capacity = self.config.scan_buffer_size;
        let log = self.open_state("scan_all_records")?;

        // The buffered reader moves the shared cursor
        log.cursor = None;

        let end = log.end;
        let mut reader = BufReader::with_capacity(capacity, &log.file);
        let mut payload = ByteBuffer::new();
        let mut offset = FIRST_FRAME_OFFSET;
        let mut position = None;
        let mut count = 0u64;

        while offset < end {
            let record_type =
                match read_frame(&mut reader, position, offset, end - offset, &mut payload) {
                    Ok(record_type) => record_type,
                    Err(e) => {
                        if e.is_truncation() {
                            warn!(
                                path = %log.path.display(),
                                offset,
                                replayed = count,
                                "replay stopped at torn tail"
                            );
                        }
                        return Err(e);
                    }
                };

            scanner
                .process_record(offset, record_type, &payload)
                .map_err(|source| LogError::Scanner { offset, source })?;

            offset += FRAME_HEADER_SIZE as u64 + payload.len() as u64;
            position = Some(offset);
            count += 1;
        }

        info!(path = %log.path.display(), frames = count, "replayed log");
        Ok(count)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    pub fn path(&self) -> Option<&Path> {
        self.state.as_ref().map(|log| log.path.as_path())
    }

    /// Header version of the open file
    pub fn version(&self) -> Option<u8> {
        self.state.as_ref().map(|log| log.version)
    }

    /// Current end-of-file offset
    pub fn end_offset(&self) -> Option<u64> {
        self.state.as_ref().map(|log| log.end)
    }

    /// End of the last complete frame
    pub fn valid_end(&self) -> Option<u64> {
        self.state.as_ref().map(|log| log.valid_end)
    }

    /// True when bytes of an incomplete frame trail the last complete one
    pub fn has_torn_tail(&self) -> bool {
        self.state
            .as_ref()
            .map_or(false, |log| log.valid_end != log.end)
    }

    /// Start offsets of every complete frame
    pub fn frame_offsets(&self) -> &[u64] {
        match &self.state {
            Some(log) => &log.frames,
            None => &[],
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frame_offsets().len()
    }

    fn open_state(&mut self, op: &str) -> Result<&mut OpenLog> {
        self.state.as_mut().ok_or_else(|| LogError::not_open(op))
    }
}

impl OpenLog {
    fn open(path: &Path, config: &LogConfig) -> Result<Self> {
        let writable = !config.read_only;

        let mut file = match OpenOptions::new().read(true).write(writable).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound && config.create_if_missing => {
                return Self::create(path, config);
            }
            Err(e) => return Err(LogError::io("open", e)),
        };

        let len = file
            .metadata()
            .map_err(|e| LogError::io("metadata", e))?
            .len();

        if len == 0 && writable {
            // Crash between create and header write
            debug!(path = %path.display(), "initialising empty log file");
            write_header(&mut file, path, config)?;
            return Ok(Self::fresh(path, file, writable));
        }

        if len < HEADER_SIZE as u64 {
            return Err(LogError::Format(format!(
                "file is {} bytes, shorter than the {} byte header",
                len, HEADER_SIZE
            )));
        }

        let mut header_bytes = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_bytes)
            .map_err(|e| LogError::io("read", e))?;
        let version = header::decode_header(&header_bytes)?;

        let (frames, valid_end) = index_frames(&file, len, config.scan_buffer_size)?;
        if valid_end != len {
            warn!(
                path = %path.display(),
                valid_end,
                file_len = len,
                "log has a torn tail"
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            version,
            end: len,
            valid_end,
            frames,
            cursor: None,
            writable,
        })
    }

    fn create(path: &Path, config: &LogConfig) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| LogError::io("create", e))?;

        write_header(&mut file, path, config)?;

        if config.sync_on_create {
            sync_parent_dir(path)?;
        }

        debug!(path = %path.display(), "created log");
        Ok(Self::fresh(path, file, true))
    }

    fn fresh(path: &Path, file: File, writable: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            file,
            version: header::LOG_VERSION,
            end: FIRST_FRAME_OFFSET,
            valid_end: FIRST_FRAME_OFFSET,
            frames: Vec::new(),
            cursor: Some(FIRST_FRAME_OFFSET),
            writable,
        }
    }

    /// Cut the file back to `good_end` after a failed append
    fn rollback(&mut self, good_end: u64) {
        self.cursor = None;
        match self.file.set_len(good_end) {
            Ok(()) => warn!(
                path = %self.path.display(),
                good_end,
                "append failed; truncated partial frame"
            ),
            Err(e) => error!(
                path = %self.path.display(),
                good_end,
                error = %e,
                "append failed and partial frame could not be truncated"
            ),
        }
    }
}

fn write_header(file: &mut File, path: &Path, config: &LogConfig) -> Result<()> {
    file.seek(SeekFrom::Start(0))
        .map_err(|e| LogError::io("seek", e))?;
    file.write_all(&header::encode_header())
        .map_err(|e| LogError::io("write", e))?;

    if config.sync_on_create {
        file.sync_all().map_err(|e| LogError::io("sync", e))?;
    }

    trace!(path = %path.display(), "wrote log header");
    Ok(())
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    File::open(parent)
        .and_then(|dir| dir.sync_all())
        .map_err(|e| LogError::io("sync", e))
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}

/// Walk frame headers from the first frame, skipping payloads
///
/// Returns the start of every complete frame and the end of the last one.
fn index_frames(file: &File, len: u64, capacity: usize) -> Result<(Vec<u64>, u64)> {
    let mut reader = BufReader::with_capacity(capacity, file);
    reader
        .seek(SeekFrom::Start(FIRST_FRAME_OFFSET))
        .map_err(|e| LogError::io("seek", e))?;

    let mut frames = Vec::new();
    let mut offset = FIRST_FRAME_OFFSET;

    while len - offset >= FRAME_HEADER_SIZE as u64 {
        let mut header_bytes = [0u8; FRAME_HEADER_SIZE];
        reader
            .read_exact(&mut header_bytes)
            .map_err(|e| LogError::io("read", e))?;

        let header = FrameHeader::decode(&header_bytes);
        if header.validate_length(offset).is_err() || header.frame_len() > len - offset {
            break;
        }

        frames.push(offset);
        reader
            .seek_relative(header.payload_len() as i64)
            .map_err(|e| LogError::io("seek", e))?;
        offset += header.frame_len();
    }

    Ok((frames, offset))
}

/// Read and verify one frame from `reader`
///
/// `position` is where the reader currently sits, if known; the reader seeks
/// to `offset` unless they agree. `available` is the byte count from
/// `offset` to end-of-file.
fn read_frame<R: Read + Seek>(
    reader: &mut R,
    position: Option<u64>,
    offset: u64,
    available: u64,
    out: &mut ByteBuffer,
) -> Result<u8> {
    if position != Some(offset) {
        reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| LogError::io("seek", e))?;
    }

    if available < FRAME_HEADER_SIZE as u64 {
        return Err(LogError::Truncated {
            offset,
            expected: FRAME_HEADER_SIZE as u64,
            available,
        });
    }

    let mut header_bytes = [0u8; FRAME_HEADER_SIZE];
    reader
        .read_exact(&mut header_bytes)
        .map_err(|e| LogError::io("read", e))?;

    let header = FrameHeader::decode(&header_bytes);
    header.validate_length(offset)?;

    if header.frame_len() > available {
        return Err(LogError::Truncated {
            offset,
            expected: header.frame_len(),
            available,
        });
    }

    out.resize(header.payload_len());
    reader
        .read_exact(out.as_mut_slice())
        .map_err(|e| LogError::io("read", e))?;

    header.verify(offset, out.as_slice())?;
    trace!(offset, record_type = header.record_type, len = header.length, "read frame");
    Ok(header.record_type)
}
