//! Tests for LogFile
//!
//! These tests verify:
//! - Open / close / sync lifecycle and state errors
//! - Header creation and validation
//! - Append and random read round trips
//! - Offset monotonicity and stability across reopen
//! - Out-of-range and oversized requests
//! - Read-only handles

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use metalog::log::{FIRST_FRAME_OFFSET, FRAME_HEADER_SIZE, HEADER_SIZE, LOG_MAGIC, LOG_VERSION};
use metalog::{ByteBuffer, ErrorKind, LogConfig, LogError, LogFile};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("log.dat");
    (temp_dir, log_path)
}

fn read_only() -> LogConfig {
    LogConfig::builder().read_only(true).build()
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_new_handle_is_closed() {
    let log = LogFile::new();
    assert!(!log.is_open());
    assert!(log.path().is_none());
    assert_eq!(log.frame_count(), 0);
}

#[test]
fn test_open_creates_file_with_header() {
    let (_temp, log_path) = setup_temp_log();

    let mut log = LogFile::new();
    log.open(&log_path).unwrap();

    assert!(log.is_open());
    assert_eq!(log.version(), Some(LOG_VERSION));
    assert_eq!(log.end_offset(), Some(HEADER_SIZE as u64));

    let bytes = fs::read(&log_path).unwrap();
    assert_eq!(bytes.len(), HEADER_SIZE);
    assert_eq!(&bytes[..4], &LOG_MAGIC);
    assert_eq!(bytes[4], LOG_VERSION);
}

#[test]
fn test_double_open_is_state_error() {
    let (_temp, log_path) = setup_temp_log();

    let mut log = LogFile::open_path(&log_path).unwrap();
    let err = log.open(&log_path).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::State);
    assert!(log.is_open());
}

#[test]
fn test_close_is_idempotent() {
    let (_temp, log_path) = setup_temp_log();

    let mut log = LogFile::open_path(&log_path).unwrap();
    log.close();
    assert!(!log.is_open());
    log.close();
    assert!(!log.is_open());
}

#[test]
fn test_operations_after_close_are_state_errors() {
    let (_temp, log_path) = setup_temp_log();

    let mut log = LogFile::open_path(&log_path).unwrap();
    let offset = log.store_record(b'A', b"hello").unwrap();
    log.close();

    let mut buf = ByteBuffer::new();
    let mut collector = metalog::RecordCollector::new();

    assert_eq!(log.store_record(b'B', b"x").unwrap_err().kind(), ErrorKind::State);
    assert_eq!(log.read_record(offset, &mut buf, true).unwrap_err().kind(), ErrorKind::State);
    assert_eq!(log.sync().unwrap_err().kind(), ErrorKind::State);
    assert_eq!(log.scan_all_records(&mut collector).unwrap_err().kind(), ErrorKind::State);
}

#[test]
fn test_handle_can_reopen_after_close() {
    let (_temp, log_path) = setup_temp_log();

    let mut log = LogFile::open_path(&log_path).unwrap();
    let offset = log.store_record(b'A', b"persisted").unwrap();
    log.close();

    log.open(&log_path).unwrap();
    let mut buf = ByteBuffer::new();
    assert_eq!(log.read_record(offset, &mut buf, true).unwrap(), b'A');
    assert_eq!(buf, b"persisted");
}

#[test]
fn test_sync_while_open() {
    let (_temp, log_path) = setup_temp_log();

    let mut log = LogFile::open_path(&log_path).unwrap();
    log.store_record(b'A', b"durable").unwrap();
    log.sync().unwrap();
}

#[test]
fn test_open_missing_without_create_is_io_error() {
    let (_temp, log_path) = setup_temp_log();

    let config = LogConfig::builder().create_if_missing(false).build();
    let mut log = LogFile::with_config(config);
    let err = log.open(&log_path).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!log.is_open());
    assert!(!log_path.exists());
}

#[test]
fn test_open_in_missing_directory_is_io_error() {
    let (temp, _) = setup_temp_log();
    let log_path = temp.path().join("no_such_dir").join("log.dat");

    let mut log = LogFile::new();
    assert!(matches!(log.open(&log_path), Err(LogError::Io { .. })));
    assert!(!log.is_open());
}

// =============================================================================
// Header Validation Tests
// =============================================================================

#[test]
fn test_open_rejects_bad_magic() {
    let (_temp, log_path) = setup_temp_log();
    fs::write(&log_path, b"JUNK\x01").unwrap();

    let mut log = LogFile::new();
    let err = log.open(&log_path).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(!log.is_open());
}

#[test]
fn test_open_rejects_unsupported_version() {
    let (_temp, log_path) = setup_temp_log();
    let mut bytes = LOG_MAGIC.to_vec();
    bytes.push(LOG_VERSION + 1);
    fs::write(&log_path, &bytes).unwrap();

    let err = LogFile::open_path(&log_path).unwrap_err();
    assert!(matches!(err, LogError::Format(_)));
}

#[test]
fn test_open_rejects_short_header() {
    let (_temp, log_path) = setup_temp_log();
    fs::write(&log_path, b"ML").unwrap();

    assert_eq!(LogFile::open_path(&log_path).unwrap_err().kind(), ErrorKind::Format);
}

#[test]
fn test_empty_existing_file_is_initialised() {
    let (_temp, log_path) = setup_temp_log();
    fs::write(&log_path, b"").unwrap();

    let mut log = LogFile::open_path(&log_path).unwrap();
    assert_eq!(log.end_offset(), Some(HEADER_SIZE as u64));
    log.store_record(b'A', b"first").unwrap();
    log.close();

    let bytes = fs::read(&log_path).unwrap();
    assert_eq!(&bytes[..4], &LOG_MAGIC);
}

#[test]
fn test_empty_existing_file_read_only_is_format_error() {
    let (_temp, log_path) = setup_temp_log();
    fs::write(&log_path, b"").unwrap();

    let mut log = LogFile::with_config(read_only());
    assert_eq!(log.open(&log_path).unwrap_err().kind(), ErrorKind::Format);
}

#[test]
fn test_invalid_config_rejected_on_open() {
    let (_temp, log_path) = setup_temp_log();
    let config = LogConfig::builder()
        .max_payload_size(metalog::log::MAX_PAYLOAD_SIZE + 1)
        .build();

    let mut log = LogFile::with_config(config);
    assert_eq!(log.open(&log_path).unwrap_err().kind(), ErrorKind::Config);
    assert!(!log_path.exists());
}

// =============================================================================
// Append / Read Tests
// =============================================================================

#[test]
fn test_store_and_read_scenario() {
    let (_temp, log_path) = setup_temp_log();

    let mut log = LogFile::open_path(&log_path).unwrap();
    assert!(log.is_open());

    let o0 = log.store_record(b'A', b"hello").unwrap();
    let o1 = log.store_record(b'B', b"world!!").unwrap();
    assert!(o1 > o0);

    let mut buf = ByteBuffer::new();
    assert_eq!(log.read_record(o0, &mut buf, true).unwrap(), b'A');
    assert_eq!(buf, b"hello");

    assert_eq!(log.read_record(o1, &mut buf, true).unwrap(), b'B');
    assert_eq!(buf, b"world!!");
}

#[test]
fn test_first_offset_follows_header() {
    let (_temp, log_path) = setup_temp_log();

    let mut log = LogFile::open_path(&log_path).unwrap();
    let offset = log.store_record(1, b"abc").unwrap();

    assert_eq!(offset, FIRST_FRAME_OFFSET);
    assert_eq!(
        log.end_offset(),
        Some(FIRST_FRAME_OFFSET + FRAME_HEADER_SIZE as u64 + 3)
    );
}

#[test]
fn test_offsets_strictly_increase_without_gaps() {
    let (_temp, log_path) = setup_temp_log();

    let mut log = LogFile::open_path(&log_path).unwrap();
    let mut expected = FIRST_FRAME_OFFSET;

    for i in 0..100u32 {
        let payload = format!("record-{}", i).into_bytes();
        let offset = log.store_record((i % 7) as u8, &payload).unwrap();
        assert_eq!(offset, expected);
        expected += (FRAME_HEADER_SIZE + payload.len()) as u64;
    }

    assert_eq!(log.end_offset(), Some(expected));
    assert_eq!(fs::metadata(&log_path).unwrap().len(), expected);
}

#[test]
fn test_round_trip_for_varied_payloads() {
    let (_temp, log_path) = setup_temp_log();
    let mut log = LogFile::open_path(&log_path).unwrap();

    let payloads: Vec<Vec<u8>> = vec![
        vec![],
        vec![0],
        (0..=255u8).collect(),
        vec![0xab; 70_000],
        b"/dir/sub/file.txt".to_vec(),
    ];

    let offsets: Vec<u64> = payloads
        .iter()
        .enumerate()
        .map(|(i, p)| log.store_record(i as u8, p).unwrap())
        .collect();

    let mut buf = ByteBuffer::new();
    for (i, (offset, payload)) in offsets.iter().zip(&payloads).enumerate().rev() {
        assert_eq!(log.read_record(*offset, &mut buf, true).unwrap(), i as u8);
        assert_eq!(buf.as_slice(), payload.as_slice());
    }
}

#[test]
fn test_buffer_payload_accepted() {
    let (_temp, log_path) = setup_temp_log();
    let mut log = LogFile::open_path(&log_path).unwrap();

    let payload = ByteBuffer::from("from a ByteBuffer");
    let offset = log.store_record(b'Z', &payload).unwrap();

    let mut out = ByteBuffer::new();
    log.read_record(offset, &mut out, true).unwrap();
    assert_eq!(out, payload);
}

#[test]
fn test_sequential_reads_without_seek() {
    let (_temp, log_path) = setup_temp_log();
    let mut log = LogFile::open_path(&log_path).unwrap();

    let offsets: Vec<u64> = (0..5u8)
        .map(|i| log.store_record(i, &[i; 3]).unwrap())
        .collect();

    let mut buf = ByteBuffer::new();
    assert_eq!(log.read_record(offsets[0], &mut buf, true).unwrap(), 0);
    for (i, offset) in offsets.iter().enumerate().skip(1) {
        assert_eq!(log.read_record(*offset, &mut buf, false).unwrap(), i as u8);
        assert_eq!(buf, [i as u8; 3].as_slice());
    }
}

#[test]
fn test_read_without_seek_after_append_still_correct() {
    let (_temp, log_path) = setup_temp_log();
    let mut log = LogFile::open_path(&log_path).unwrap();

    let first = log.store_record(b'A', b"first").unwrap();
    log.store_record(b'B', b"second").unwrap();

    // The cursor sits at end-of-file, not at `first`
    let mut buf = ByteBuffer::new();
    assert_eq!(log.read_record(first, &mut buf, false).unwrap(), b'A');
    assert_eq!(buf, b"first");
}

#[test]
fn test_append_after_read_lands_at_end() {
    let (_temp, log_path) = setup_temp_log();
    let mut log = LogFile::open_path(&log_path).unwrap();

    let first = log.store_record(b'A', b"first").unwrap();
    let mut buf = ByteBuffer::new();
    log.read_record(first, &mut buf, true).unwrap();

    let second = log.store_record(b'B', b"second").unwrap();
    assert_eq!(second, first + (FRAME_HEADER_SIZE + 5) as u64);

    log.read_record(first, &mut buf, true).unwrap();
    assert_eq!(buf, b"first");
    log.read_record(second, &mut buf, true).unwrap();
    assert_eq!(buf, b"second");
}

#[test]
fn test_offsets_stable_across_reopen() {
    let (_temp, log_path) = setup_temp_log();

    let offsets: Vec<u64> = {
        let mut log = LogFile::open_path(&log_path).unwrap();
        let offsets = (0..10u8)
            .map(|i| log.store_record(i, format!("v{}", i).as_bytes()).unwrap())
            .collect();
        log.sync().unwrap();
        offsets
    };

    let mut log = LogFile::open_path(&log_path).unwrap();
    assert_eq!(log.frame_offsets(), offsets.as_slice());

    let next = log.store_record(99, b"after reopen").unwrap();
    assert!(next > *offsets.last().unwrap());

    let mut buf = ByteBuffer::new();
    for (i, offset) in offsets.iter().enumerate() {
        assert_eq!(log.read_record(*offset, &mut buf, true).unwrap(), i as u8);
        assert_eq!(buf.as_slice(), format!("v{}", i).as_bytes());
    }
}

// =============================================================================
// Size / Range Tests
// =============================================================================

#[test]
fn test_oversized_payload_is_size_error() {
    let (_temp, log_path) = setup_temp_log();
    let config = LogConfig::builder().max_payload_size(16).build();
    let mut log = LogFile::with_config(config);
    log.open(&log_path).unwrap();

    log.store_record(1, &[0u8; 16]).unwrap();
    let end = log.end_offset();

    let err = log.store_record(1, &[0u8; 17]).unwrap_err();
    assert!(matches!(err, LogError::Size { len: 17, max: 16 }));
    assert_eq!(log.end_offset(), end);
    assert!(log.is_open());
}

#[test]
fn test_read_before_first_frame_is_out_of_range() {
    let (_temp, log_path) = setup_temp_log();
    let mut log = LogFile::open_path(&log_path).unwrap();
    log.store_record(b'A', b"hello").unwrap();

    let mut buf = ByteBuffer::new();
    for offset in 0..FIRST_FRAME_OFFSET {
        let err = log.read_record(offset, &mut buf, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange, "offset {}", offset);
    }
}

#[test]
fn test_read_at_or_past_end_is_out_of_range() {
    let (_temp, log_path) = setup_temp_log();
    let mut log = LogFile::open_path(&log_path).unwrap();
    log.store_record(b'A', b"hello").unwrap();
    let end = log.end_offset().unwrap();

    let mut buf = ByteBuffer::new();
    assert_eq!(log.read_record(end, &mut buf, true).unwrap_err().kind(), ErrorKind::OutOfRange);
    assert_eq!(
        log.read_record(end + 1000, &mut buf, true).unwrap_err().kind(),
        ErrorKind::OutOfRange
    );
}

#[test]
fn test_read_in_empty_log_is_out_of_range() {
    let (_temp, log_path) = setup_temp_log();
    let mut log = LogFile::open_path(&log_path).unwrap();

    let mut buf = ByteBuffer::new();
    let err = log.read_record(FIRST_FRAME_OFFSET, &mut buf, true).unwrap_err();
    assert!(matches!(err, LogError::OutOfRange { .. }));
}

#[test]
fn test_read_unaligned_offset_is_out_of_range() {
    let (_temp, log_path) = setup_temp_log();
    let mut log = LogFile::open_path(&log_path).unwrap();

    let o0 = log.store_record(b'A', b"hello").unwrap();
    let o1 = log.store_record(b'B', b"world!!").unwrap();

    let mut buf = ByteBuffer::new();
    for offset in (o0 + 1)..o1 {
        let err = log.read_record(offset, &mut buf, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange, "offset {}", offset);
    }
    // Aligned reads are unaffected
    assert_eq!(log.read_record(o1, &mut buf, true).unwrap(), b'B');
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_flipped_payload_byte_is_corruption_on_read() {
    let (_temp, log_path) = setup_temp_log();
    let mut log = LogFile::open_path(&log_path).unwrap();

    let o0 = log.store_record(b'A', b"hello").unwrap();
    let o1 = log.store_record(b'B', b"world!!").unwrap();
    log.sync().unwrap();

    // Rewrite one payload byte of the first frame behind the handle's back
    {
        let mut file = OpenOptions::new().write(true).open(&log_path).unwrap();
        file.seek(SeekFrom::Start(o0 + FRAME_HEADER_SIZE as u64 + 2)).unwrap();
        file.write_all(b"X").unwrap();
    }

    let mut buf = ByteBuffer::new();
    let err = log.read_record(o0, &mut buf, true).unwrap_err();
    assert!(matches!(err, LogError::Corruption { offset, .. } if offset == o0));

    // Neighbouring frame still reads
    assert_eq!(log.read_record(o1, &mut buf, true).unwrap(), b'B');
}

// =============================================================================
// Read-only Handle Tests
// =============================================================================

#[test]
fn test_read_only_handle_reads_but_refuses_appends() {
    let (_temp, log_path) = setup_temp_log();
    let offset = {
        let mut log = LogFile::open_path(&log_path).unwrap();
        log.store_record(b'A', b"hello").unwrap()
    };

    let mut reader = LogFile::with_config(read_only());
    reader.open(&log_path).unwrap();

    let mut buf = ByteBuffer::new();
    assert_eq!(reader.read_record(offset, &mut buf, true).unwrap(), b'A');
    assert_eq!(reader.store_record(b'B', b"nope").unwrap_err().kind(), ErrorKind::State);
    reader.sync().unwrap();
}

#[test]
fn test_read_only_handle_does_not_create() {
    let (_temp, log_path) = setup_temp_log();

    let mut reader = LogFile::with_config(read_only());
    assert_eq!(reader.open(&log_path).unwrap_err().kind(), ErrorKind::Io);
    assert!(!log_path.exists());
}

#[test]
fn test_independent_readers_share_file() {
    let (_temp, log_path) = setup_temp_log();
    let offsets: Vec<u64> = {
        let mut log = LogFile::open_path(&log_path).unwrap();
        (0..3u8).map(|i| log.store_record(i, &[i]).unwrap()).collect()
    };

    let mut a = LogFile::with_config(read_only());
    let mut b = LogFile::with_config(read_only());
    a.open(&log_path).unwrap();
    b.open(&log_path).unwrap();

    let mut buf_a = ByteBuffer::new();
    let mut buf_b = ByteBuffer::new();
    for offset in offsets.iter().rev() {
        assert_eq!(
            a.read_record(*offset, &mut buf_a, true).unwrap(),
            b.read_record(*offset, &mut buf_b, true).unwrap()
        );
        assert_eq!(buf_a, buf_b);
    }
}
