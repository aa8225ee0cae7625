//! Log file with weekly rotation, plugged into the env_logger builder.

use std::{
    ffi::OsString,
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Datelike, IsoWeek, Local};
use env_logger::{Target, WriteStyle};
use log::LevelFilter;

use crate::config::LogConfig;

/// Append-only log file that starts over whenever the ISO week changes.
/// The previous file becomes `<name>.1`, older ones shift up, and at most
/// `keep` rotated files survive.
pub struct RotatingFile {
    path: PathBuf,
    keep: usize,
    week: IsoWeek,
    file: File,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, keep: usize) -> io::Result<Self> {
        Self::open_at(path.into(), keep, Local::now())
    }

    fn open_at(path: PathBuf, keep: usize, now: DateTime<Local>) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        if let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) {
            let modified: DateTime<Local> = modified.into();
            if modified.iso_week() != now.iso_week() {
                rotate_files(&path, keep)?;
            }
        }

        let file = open_append(&path)?;
        Ok(Self {
            path,
            keep,
            week: now.iso_week(),
            file,
        })
    }

    fn rotate_if_needed(&mut self, now: DateTime<Local>) -> io::Result<()> {
        if now.iso_week() == self.week {
            return Ok(());
        }
        self.file.flush()?;
        rotate_files(&self.path, self.keep)?;
        self.file = open_append(&self.path)?;
        self.week = now.iso_week();
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.rotate_if_needed(Local::now())?;
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn numbered(path: &Path, n: usize) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(format!(".{}", n));
    PathBuf::from(name)
}

fn rotate_files(path: &Path, keep: usize) -> io::Result<()> {
    if keep == 0 {
        return remove_if_exists(path);
    }

    remove_if_exists(&numbered(path, keep))?;
    for n in (1..keep).rev() {
        let from = numbered(path, n);
        if from.exists() {
            fs::rename(&from, numbered(path, n + 1))?;
        }
    }
    if path.exists() {
        fs::rename(path, numbered(path, 1))?;
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Routes `log` records into the rotating file as
/// `2024-01-31 12:00:00,123 - INFO - message` lines.
///
/// `RUST_LOG` overrides the default `info` level. Returns an error when the
/// file can't be opened so the caller can fall back to stderr.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    let file = RotatingFile::open(&config.file, config.keep)?;

    let mut builder = base_builder(env_filters().as_deref());
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                record.level(),
                record.args()
            )
        })
        .write_style(WriteStyle::Never)
        .target(Target::Pipe(Box::new(file)));

    builder.try_init().map_err(io::Error::other)?;
    log::info!("Logging to {}", config.file.display());
    Ok(())
}

/// Plain stderr logger for when the log file is unavailable. Same `info`
/// default as the file logger.
pub fn init_logging_stderr() {
    let _ = base_builder(env_filters().as_deref()).try_init();
}

fn env_filters() -> Option<String> {
    std::env::var("RUST_LOG").ok()
}

/// `info` unless `filters` (RUST_LOG syntax) says otherwise.
fn base_builder(filters: Option<&str>) -> env_logger::Builder {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.filter_level(LevelFilter::Info);
    if let Some(filters) = filters {
        builder.parse_filters(filters);
    }
    builder
}
