//! Rolling Logger
//!
//! Installs a global `tracing` subscriber that writes to
//! `<log_dir>/<app_name>.log`, rotating the file when it grows past a size
//! limit and keeping a bounded number of backups (`.log.1` is the newest).
//! The last lines written are also kept in a circular buffer so they can be
//! shown without reading the file back.
//!
//! Records emitted through the `log` facade are bridged into the same
//! subscriber.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

/// Rotate once the active file would exceed this many bytes
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;
/// Number of rotated files kept next to the active one
pub const DEFAULT_BACKUPS: usize = 3;
/// Lines kept in the in-memory ring
pub const DEFAULT_BUFFER_LINES: usize = 500;

static WRITER: OnceLock<RollingWriter> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("log file error: {0}")]
    Io(#[from] io::Error),

    #[error("a global logger is already installed")]
    AlreadyInitialized,
}

struct RollingState {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    backups: usize,
    recent: VecDeque<String>,
    capacity: usize,
    partial: String,
}

impl RollingState {
    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.backups > 0 {
            for i in (1..self.backups).rev() {
                let from = self.backup_path(i);
                if from.exists() {
                    fs::rename(&from, self.backup_path(i + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
        }
        self.file = File::create(&self.path)?;
        self.written = 0;
        Ok(())
    }

    fn remember(&mut self, buf: &[u8]) {
        if self.capacity == 0 {
            return;
        }
        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            self.recent.push_back(line.trim_end().to_string());
            while self.recent.len() > self.capacity {
                self.recent.pop_front();
            }
        }
    }
}

/// Size-rotated file writer; clones share the same file and ring buffer
#[derive(Clone)]
pub struct RollingWriter {
    state: Arc<Mutex<RollingState>>,
}

impl RollingWriter {
    pub fn open(
        log_dir: &Path,
        app_name: &str,
        max_bytes: u64,
        backups: usize,
        buffer_lines: usize,
    ) -> Result<Self, LoggerError> {
        fs::create_dir_all(log_dir)?;
        let path = log_dir.join(format!("{}.log", app_name));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            state: Arc::new(Mutex::new(RollingState {
                path,
                file,
                written,
                max_bytes,
                backups,
                recent: VecDeque::with_capacity(buffer_lines),
                capacity: buffer_lines,
                partial: String::new(),
            })),
        })
    }

    /// Most recent complete lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        match self.state.lock() {
            Ok(state) => state.recent.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.state.lock().ok().map(|s| s.path.clone())
    }
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer poisoned"))?;

        if state.written > 0 && state.written + buf.len() as u64 > state.max_bytes {
            state.rotate()?;
        }
        state.file.write_all(buf)?;
        state.written += buf.len() as u64;
        state.remember(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer poisoned"))?;
        state.file.flush()
    }
}

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Install the global logger at INFO level
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with_level(log_dir, app_name, Level::INFO)
}

pub fn init_logger_with_level(
    log_dir: impl AsRef<Path>,
    app_name: &str,
    level: Level,
) -> Result<(), LoggerError> {
    let writer = RollingWriter::open(
        log_dir.as_ref(),
        app_name,
        DEFAULT_MAX_BYTES,
        DEFAULT_BACKUPS,
        DEFAULT_BUFFER_LINES,
    )?;
    let make_writer = writer.clone();

    tracing_subscriber::fmt()
        .with_writer(move || make_writer.clone())
        .with_ansi(false)
        .with_timer(LocalTimer)
        .with_max_level(level)
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    WRITER
        .set(writer)
        .map_err(|_| LoggerError::AlreadyInitialized)
}

pub fn info(msg: &str) {
    tracing::info!("{}", msg);
}

pub fn error(msg: &str) {
    tracing::error!("{}", msg);
}

/// Recent lines of the global logger (empty before `init_logger`)
pub fn recent_lines() -> Vec<String> {
    WRITER.get().map(RollingWriter::recent_lines).unwrap_or_default()
}
