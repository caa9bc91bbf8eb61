/// File persistence for log lines
///
/// Lines are appended to `logs/tokenscout_<date>.log`; the file rolls over
/// when the local date changes.
use super::config::get_logger_config;
use chrono::Local;
use once_cell::sync::Lazy;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

struct LogFile {
    date: String,
    writer: BufWriter<File>,
}

static LOG_FILE: Lazy<Mutex<Option<LogFile>>> = Lazy::new(|| Mutex::new(None));

fn log_file_path(date: &str) -> PathBuf {
    crate::paths::get_logs_dir().join(format!("tokenscout_{}.log", date))
}

fn open_log_file(date: &str) -> Option<LogFile> {
    let dir = crate::paths::get_logs_dir();
    if fs::create_dir_all(&dir).is_err() {
        return None;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path(date))
        .ok()
        .map(|file| LogFile {
            date: date.to_string(),
            writer: BufWriter::new(file),
        })
}

pub fn init_file_logging() {
    if !get_logger_config().file_logging {
        return;
    }

    let date = Local::now().format("%Y-%m-%d").to_string();
    if let Ok(mut slot) = LOG_FILE.lock() {
        *slot = open_log_file(&date);
    }
}

pub fn write_to_file(line: &str) {
    let Ok(mut slot) = LOG_FILE.lock() else {
        return;
    };

    let today = Local::now().format("%Y-%m-%d").to_string();
    let needs_roll = matches!(slot.as_ref(), Some(f) if f.date != today);
    if needs_roll {
        if let Some(mut old) = slot.take() {
            let _ = old.writer.flush();
        }
        *slot = open_log_file(&today);
    }

    if let Some(file) = slot.as_mut() {
        let _ = writeln!(file.writer, "{}", line);
    }
}

pub fn flush_file_logging() {
    if let Ok(mut slot) = LOG_FILE.lock() {
        if let Some(file) = slot.as_mut() {
            let _ = file.writer.flush();
        }
    }
}
