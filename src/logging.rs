//! File-backed `log` sink.
//!
//! The terminal belongs to the UI, so records go to a file under the state
//! directory instead of stderr.

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use std::error::Error;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

/// Files past this size are truncated when the logger opens them.
const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

pub struct FileLogger {
    level: LevelFilter,
    file: Mutex<File>,
}

impl FileLogger {
    pub fn open(path: &Path, level: LevelFilter) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let oversized = fs::metadata(path).map_or(false, |m| m.len() >= MAX_LOG_SIZE);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(!oversized)
            .truncate(oversized)
            .open(path)?;

        Ok(Self {
            level,
            file: Mutex::new(file),
        })
    }

    fn format(record: &Record) -> String {
        format!(
            "[{}][{}][{}] {}",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", Self::format(record));
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Installs a [`FileLogger`] as the global logger.
pub fn init(path: &Path, level: LevelFilter) -> Result<(), Box<dyn Error>> {
    let logger = FileLogger::open(path, level)?;
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(())
}
