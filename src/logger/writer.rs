//! Log sink plumbing.
//!
//! Two global sinks, one for access/info lines and one for errors. Each
//! writes to a file when a path is configured and falls back to the
//! console otherwise.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Where a sink sends its lines.
enum LogTarget {
    Stdout,
    Stderr,
    File(Mutex<File>),
}

impl LogTarget {
    /// Open an append-mode file target, creating parent directories as needed.
    fn file(path: &str) -> io::Result<Self> {
        let parent = Path::new(path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = parent {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::File(Mutex::new(file)))
    }

    fn write_line(&self, message: &str) {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            Self::File(file) => {
                if let Ok(mut f) = file.lock() {
                    let _ = writeln!(f, "{message}");
                }
            }
        }
    }
}

/// Paired access and error sinks.
pub struct LogWriter {
    access: LogTarget,
    error: LogTarget,
}

impl LogWriter {
    fn new(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<Self> {
        let access = match access_log_file {
            Some(path) => LogTarget::file(path)?,
            None => LogTarget::Stdout,
        };
        let error = match error_log_file {
            Some(path) => LogTarget::file(path)?,
            None => LogTarget::Stderr,
        };
        Ok(Self { access, error })
    }

    /// Write an access log line.
    pub fn write_access(&self, message: &str) {
        self.access.write_line(message);
    }

    /// Write an error line.
    pub fn write_error(&self, message: &str) {
        self.error.write_line(message);
    }

    /// Write an info line. Info shares the access sink.
    pub fn write_info(&self, message: &str) {
        self.access.write_line(message);
    }
}

/// Initialize the global sinks. Call once at startup, before anything logs.
///
/// Fails when a configured log file cannot be opened, or when called twice.
pub fn init(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<()> {
    let writer = LogWriter::new(access_log_file, error_log_file)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "log writer already initialized",
        )
    })
}

/// The global writer. Panics when `init` has not run.
pub fn get() -> &'static LogWriter {
    LOG_WRITER.get().expect("log writer not initialized")
}

/// Whether `init` has run.
pub fn is_initialized() -> bool {
    LOG_WRITER.get().is_some()
}
