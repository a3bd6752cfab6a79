//! metalog inspection tool
//!
//! Dump, read, verify and repair log files from the command line.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use metalog::log::recovery;
use metalog::{ByteBuffer, LogConfig, LogFile, ScanResult};
use tracing_subscriber::{fmt, EnvFilter};

/// metalog inspector
#[derive(Parser, Debug)]
#[command(name = "metalog-inspect")]
#[command(about = "Inspect and repair metalog record logs")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every frame: offset, type and payload length
    Dump {
        /// Log file
        path: PathBuf,

        /// Stop after this many frames
        #[arg(short, long)]
        limit: Option<u64>,
    },

    /// Print the payload of the frame at an offset
    Read {
        /// Log file
        path: PathBuf,

        /// Frame offset
        offset: u64,
    },

    /// Check every checksum and report a torn tail
    Verify {
        /// Log file
        path: PathBuf,
    },

    /// Cut off a torn tail left by a crash mid-append
    Repair {
        /// Log file
        path: PathBuf,
    },

    /// Append one record and sync
    Append {
        /// Log file (created if missing)
        path: PathBuf,

        /// Record type, a single ASCII character
        record_type: char,

        /// Payload text
        text: String,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,metalog=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> metalog::Result<()> {
    match command {
        Commands::Dump { path, limit } => {
            let mut log = open_read_only(&path)?;
            let mut shown = 0u64;
            let mut print = |offset: u64, record_type: u8, payload: &[u8]| -> ScanResult {
                if limit.map_or(true, |limit| shown < limit) {
                    println!(
                        "{:>12}  {}  {:>8}  {}",
                        offset,
                        type_label(record_type),
                        payload.len(),
                        preview(payload)
                    );
                    shown += 1;
                }
                Ok(())
            };
            let frames = log.scan_all_records(&mut print)?;
            println!("{} frames", frames);
        }

        Commands::Read { path, offset } => {
            let mut log = open_read_only(&path)?;
            let mut payload = ByteBuffer::new();
            let record_type = log.read_record(offset, &mut payload, true)?;
            println!("type {} ({} bytes)", type_label(record_type), payload.len());
            println!("{}", String::from_utf8_lossy(&payload));
        }

        Commands::Verify { path } => {
            let report = recovery::verify(&path)?;
            println!("{:#?}", report);
        }

        Commands::Repair { path } => {
            let report = recovery::repair(&path)?;
            println!("{:#?}", report);
        }

        Commands::Append {
            path,
            record_type,
            text,
        } => {
            if !record_type.is_ascii() {
                return Err(metalog::LogError::Config(format!(
                    "record type must be ASCII, got {:?}",
                    record_type
                )));
            }
            let mut log = LogFile::open_path(&path)?;
            let offset = log.store_record(record_type as u8, text.as_bytes())?;
            log.sync()?;
            println!("{}", offset);
        }
    }

    Ok(())
}

fn open_read_only(path: &Path) -> metalog::Result<LogFile> {
    let mut log = LogFile::with_config(LogConfig::builder().read_only(true).build());
    log.open(path)?;
    Ok(log)
}

fn type_label(record_type: u8) -> String {
    if record_type.is_ascii_graphic() {
        format!("'{}'", record_type as char)
    } else {
        format!("{:#04x}", record_type)
    }
}

fn preview(payload: &[u8]) -> String {
    const WIDTH: usize = 32;
    let shown = &payload[..payload.len().min(WIDTH)];
    let mut text: String = shown
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
        .collect();
    if payload.len() > WIDTH {
        text.push_str("...");
    }
    text
}
