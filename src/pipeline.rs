use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use log::{error, info, warn};
use tokio::fs;

use crate::{
    config::{Config, FailurePolicy},
    errors::{DownloaderError, DownloaderResult},
    utils::{MediaMode, sanitize_title, unique_output_path},
    video::{
        Fetched, MediaTool, StreamSource, TARGET_CONTAINER, convert, fetch_selection,
        select_streams,
    },
};

/// Result of processing one URL
#[derive(Debug)]
pub struct UrlOutcome {
    pub url: String,
    pub result: DownloaderResult<PathBuf>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<UrlOutcome>,
    /// Set when a failure stopped the batch
    pub aborted: bool,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Resolve → fetch → post-process, one URL at a time.
pub struct Pipeline<'a> {
    config: &'a Config,
    source: &'a dyn StreamSource,
    tool: &'a dyn MediaTool,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, source: &'a dyn StreamSource, tool: &'a dyn MediaTool) -> Self {
        Self {
            config,
            source,
            tool,
        }
    }

    pub async fn prepare_output_dir(&self) -> DownloaderResult<()> {
        let dir = &self.config.output_dir;
        fs::create_dir_all(dir)
            .await
            .map_err(|source| DownloaderError::DirectoryCreation {
                path: dir.clone(),
                source,
            })
    }

    /// Processes `urls` in order. What happens after a failed URL is decided
    /// by the configured `FailurePolicy`; fatal errors always stop the batch.
    pub async fn run(&self, urls: &[String], mode: MediaMode) -> RunReport {
        let mut report = RunReport::default();

        for (index, url) in urls.iter().enumerate() {
            let result = self.process(url, mode).await;

            let stop = match &result {
                Ok(_) => false,
                Err(e) => {
                    error!("An error occurred for URL {}: {}", url, e);
                    println!("Failed to download {}: {}", url, e);
                    e.is_fatal() || self.config.failure_policy == FailurePolicy::Abort
                }
            };

            report.outcomes.push(UrlOutcome {
                url: url.clone(),
                result,
            });

            if stop {
                let skipped = urls.len() - index - 1;
                if skipped > 0 {
                    warn!("Aborting batch, {} URLs not attempted", skipped);
                }
                report.aborted = true;
                break;
            }
        }

        report
    }

    pub async fn process(&self, url: &str, mode: MediaMode) -> DownloaderResult<PathBuf> {
        info!("Downloading started for URL: {} (mode: {})", url, mode);
        let started = Instant::now();

        let media = self.source.resolve_streams(url).await?;
        let selection = select_streams(mode, &media.streams, TARGET_CONTAINER)?;
        let fetched = fetch_selection(self.source, url, &selection, &self.config.temp_dir).await?;

        let title = sanitize_title(&media.title);
        let output = unique_output_path(&self.config.output_dir, &title, mode.extension()).await?;
        log_if_renamed(&output, &title, mode.extension());

        match fetched {
            Fetched::Pair { video, audio } => convert::mux(self.tool, video, audio, &output).await?,
            Fetched::Single(input) if mode == MediaMode::AudioOnly => {
                convert::transcode_audio(self.tool, input, &output).await?
            }
            Fetched::Single(input) => convert::strip_metadata(self.tool, input, &output).await?,
        }

        info!(
            "Downloaded successfully to {} in {:.2?}",
            output.display(),
            started.elapsed()
        );
        println!("Downloaded successfully to {}", output.display());
        Ok(output)
    }
}

fn log_if_renamed(output: &Path, title: &str, ext: &str) {
    let desired = format!("{}.{}", title, ext);
    if let Some(name) = output.file_name() {
        if name != desired.as_str() {
            info!(
                "Filename already exists. Appending identifier: {}",
                name.to_string_lossy()
            );
        }
    }
}
