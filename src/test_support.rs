//! Fakes for the extraction backend and the media tool, plus a log capture.

use std::{
    cell::RefCell,
    collections::HashMap,
    ffi::OsString,
    path::Path,
    sync::{Mutex, Once},
};

use async_trait::async_trait;
use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::{
    errors::{DownloaderError, DownloaderResult},
    video::{
        convert::{MediaTool, ToolOutput},
        streams::{ResolvedMedia, StreamDescriptor, StreamSource},
    },
};

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

#[derive(Default)]
pub struct FakeSource {
    media: HashMap<String, ResolvedMedia>,
    failing_fetch: Option<String>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_media(mut self, url: &str, title: &str, streams: Vec<StreamDescriptor>) -> Self {
        self.media.insert(
            url.to_string(),
            ResolvedMedia {
                title: title.to_string(),
                streams,
            },
        );
        self
    }

    pub fn failing_fetch(mut self, format_id: &str) -> Self {
        self.failing_fetch = Some(format_id.to_string());
        self
    }
}

#[async_trait]
impl StreamSource for FakeSource {
    fn name(&self) -> &str {
        "fake"
    }

    async fn resolve_streams(&self, url: &str) -> DownloaderResult<ResolvedMedia> {
        self.media
            .get(url)
            .cloned()
            .ok_or_else(|| DownloaderError::resolution(format!("ERROR: {}: Video unavailable", url)))
    }

    async fn fetch(
        &self,
        _url: &str,
        stream: &StreamDescriptor,
        dest: &Path,
    ) -> DownloaderResult<()> {
        if self.failing_fetch.as_deref() == Some(stream.format_id.as_str()) {
            return Err(DownloaderError::resolution("HTTP Error 403: Forbidden"));
        }
        tokio::fs::write(dest, format!("stream {}", stream.format_id)).await?;
        Ok(())
    }
}

/// Records every invocation. On success writes the last argument (the
/// output path); on failure leaves a partial output if none existed.
#[derive(Default)]
pub struct FakeTool {
    failure: Option<String>,
    calls: Mutex<Vec<Vec<OsString>>>,
}

impl FakeTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(stderr: &str) -> Self {
        Self {
            failure: Some(stderr.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<OsString>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaTool for FakeTool {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn run(&self, args: &[OsString]) -> DownloaderResult<ToolOutput> {
        self.calls.lock().unwrap().push(args.to_vec());
        let output = Path::new(args.last().unwrap());

        match &self.failure {
            Some(stderr) => {
                let _ = std::fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(output);
                Ok(ToolOutput {
                    success: false,
                    code: Some(1),
                    stdout: String::new(),
                    stderr: stderr.clone(),
                })
            }
            None => {
                std::fs::write(output, b"processed")?;
                Ok(ToolOutput {
                    success: true,
                    code: Some(0),
                    stdout: String::new(),
                    stderr: "size=1kB time=00:00:01.00".to_string(),
                })
            }
        }
    }
}

thread_local! {
    static RECORDS: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|r| r.borrow_mut().push((record.level(), record.args().to_string())));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Starts capturing log records emitted on the current thread.
pub fn capture_logs() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Info);
    });
    RECORDS.with(|r| r.borrow_mut().clear());
}

pub fn captured_logs() -> Vec<(Level, String)> {
    RECORDS.with(|r| r.borrow().clone())
}
