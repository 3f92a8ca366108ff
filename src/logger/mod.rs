//! Logger module
//!
//! Module-owned logging for the server: access lines to stdout or a file,
//! errors and warnings to stderr or a file. Initialized once at startup;
//! before initialization (early startup, tests) messages fall back to the
//! standard streams.

mod format;

pub use format::AccessLogEntry;

use crate::config::{Config, LoggingConfig};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

/// Global log writer instance
static WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Log output target
enum LogTarget {
    Stdout,
    Stderr,
    File(Mutex<File>),
}

struct LogWriter {
    access: LogTarget,
    error: LogTarget,
}

/// Initialize the global writer from configuration. Call once at startup.
pub fn init(config: &LoggingConfig) -> io::Result<()> {
    let writer = LogWriter {
        access: open_target(config.access_log_file.as_deref(), LogTarget::Stdout)?,
        error: open_target(config.error_log_file.as_deref(), LogTarget::Stderr)?,
    };
    WRITER.set(writer).map_err(|_| {
        io::Error::new(io::ErrorKind::AlreadyExists, "logger already initialized")
    })
}

fn open_target(path: Option<&str>, fallback: LogTarget) -> io::Result<LogTarget> {
    match path {
        Some(path) => {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Ok(LogTarget::File(Mutex::new(file)))
        }
        None => Ok(fallback),
    }
}

fn write_to(target: &LogTarget, message: &str) {
    match target {
        LogTarget::Stdout => println!("{message}"),
        LogTarget::Stderr => eprintln!("{message}"),
        LogTarget::File(file) => {
            if let Ok(mut file) = file.lock() {
                let _ = writeln!(file, "{message}");
            }
        }
    }
}

fn write_access_line(message: &str) {
    match WRITER.get() {
        Some(writer) => write_to(&writer.access, message),
        None => println!("{message}"),
    }
}

fn write_error_line(message: &str) {
    match WRITER.get() {
        Some(writer) => write_to(&writer.error, message),
        None => eprintln!("{message}"),
    }
}

/// Emit one formatted access-log line.
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access_line(&entry.format(format));
}

pub fn log_error(message: &str) {
    write_error_line(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error_line(&format!("[WARN] {message}"));
}

/// Startup banner.
pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_access_line("======================================");
    write_access_line(&format!("Serving {}", config.serve.fs_root.display()));
    write_access_line(&format!("Listening on: http://{addr}"));
    if let Some(url_root) = &config.serve.url_root {
        write_access_line(&format!("URL root: /{url_root}"));
    }
    if config.vanity.store.is_some() {
        write_access_line(&format!("Vanity imports enabled for {}", config.vanity.host));
    }
    write_access_line("======================================");
}

pub fn log_shutdown() {
    write_access_line("Shutdown signal received, stopping server");
}
