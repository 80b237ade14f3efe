//! File logging for the CLI.
//!
//! Nothing is logged unless `-v` is given or `RUST_LOG` is set. `RUST_LOG` takes
//! precedence over the level picked by `-v`.
use std::fs;
use std::io::LineWriter;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use resman_core::get_log_path;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::OffsetTime;

const MAX_LOG_SIZE: u64 = 100 * 1024;

/// Directives for `-v` (debug) and `-vv` or more (trace). The client library logs
/// each request and response at debug level.
pub fn filter_directives(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "resman=info,resman_core=info,reqwest=warn",
        1 => "resman=debug,resman_core=debug,reqwest=info",
        _ => "resman=trace,resman_core=trace,reqwest=debug",
    }
}

fn build_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(verbosity)))
}

/// Moves `log_path` aside to `<name>.old` once it grows past `max_size`.
fn rotate(log_path: &Path, max_size: u64) -> std::io::Result<()> {
    let Ok(metadata) = fs::metadata(log_path) else {
        return Ok(());
    };
    if metadata.len() <= max_size {
        return Ok(());
    }

    let backup_path = log_path.with_extension("log.old");
    if backup_path.exists() {
        fs::remove_file(&backup_path)?;
    }
    fs::rename(log_path, backup_path)
}

/// Sends `tracing` output to `<data_dir>/resman.log`.
pub fn setup_logging(verbosity: u8) -> anyhow::Result<()> {
    if verbosity == 0 && std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }

    let log_path = get_log_path().context("Failed to get data directory")?;
    rotate(&log_path, MAX_LOG_SIZE).context("Failed to rotate log file")?;
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open {}", log_path.display()))?;

    // Flush after every line
    let writer = Mutex::new(LineWriter::new(log_file));

    tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbosity))
        .with_writer(writer)
        .with_ansi(false)
        .with_timer(OffsetTime::local_rfc_3339()?)
        .init();
    Ok(())
}
