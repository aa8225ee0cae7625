use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use tokio::process;

use crate::{
    errors::{DownloaderError, DownloaderResult},
    video::streams::{ResolvedMedia, StreamDescriptor, StreamSource},
};

#[derive(Debug, Deserialize)]
struct YtDlpFormat {
    format_id: String,
    ext: String,
    height: Option<u32>,
    vcodec: Option<String>,
    acodec: Option<String>,
    abr: Option<f32>,
    tbr: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    #[serde(default)]
    formats: Vec<YtDlpFormat>,
}

fn has_codec(codec: &Option<String>) -> bool {
    codec
        .as_deref()
        .map_or(false, |c| !c.is_empty() && c != "none")
}

impl From<YtDlpFormat> for StreamDescriptor {
    fn from(format: YtDlpFormat) -> Self {
        let has_video = has_codec(&format.vcodec);
        let has_audio = has_codec(&format.acodec);
        // tbr mixes both tracks, so it only stands in for abr on audio-only streams
        let bitrate = format
            .abr
            .or(if has_video { None } else { format.tbr });

        StreamDescriptor {
            format_id: format.format_id,
            container: format.ext,
            height: format.height.filter(|&h| h > 0),
            bitrate,
            has_video,
            has_audio,
        }
    }
}

/// Parses the `yt-dlp -J` document for one video.
fn parse_info(json: &str) -> DownloaderResult<ResolvedMedia> {
    let info: YtDlpInfo = serde_json::from_str(json)
        .map_err(|e| DownloaderError::resolution(format!("Failed to parse yt-dlp output: {}", e)))?;

    let streams: Vec<StreamDescriptor> = info.formats.into_iter().map(Into::into).collect();
    if streams.is_empty() {
        return Err(DownloaderError::resolution("no streams offered"));
    }

    Ok(ResolvedMedia {
        title: info.title.unwrap_or_default(),
        streams,
    })
}

/// Extraction backend driving the `yt-dlp` binary
pub struct YtDlp {
    program: PathBuf,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> process::Command {
        let mut cmd = process::Command::new(&self.program);
        cmd.arg("--no-playlist").stdin(Stdio::null());
        cmd
    }

    fn display_name(&self) -> String {
        self.program.display().to_string()
    }
}

#[async_trait]
impl StreamSource for YtDlp {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn resolve_streams(&self, url: &str) -> DownloaderResult<ResolvedMedia> {
        let output = self
            .command()
            .args(["-J"]) // JSON output
            .arg(url)
            .output()
            .await
            .map_err(|e| DownloaderError::spawn_failed(self.display_name(), e))?;

        if !output.status.success() {
            let stderr_str = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(DownloaderError::resolution(stderr_str));
        }

        let media = parse_info(&String::from_utf8_lossy(&output.stdout))?;
        info!(
            "Resolved {:?}: {} streams offered",
            media.title,
            media.streams.len()
        );
        Ok(media)
    }

    async fn fetch(
        &self,
        url: &str,
        stream: &StreamDescriptor,
        dest: &Path,
    ) -> DownloaderResult<()> {
        let output = self
            .command()
            .args(["--no-part", "--force-overwrites", "--no-progress"])
            .args(["-f", &stream.format_id])
            .arg("-o")
            .arg(dest)
            .arg(url)
            .output()
            .await
            .map_err(|e| DownloaderError::spawn_failed(self.display_name(), e))?;

        info!("yt-dlp exit code: {:?}", output.status.code());

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            log::error!("yt-dlp failed: {}", stderr);
            Err(DownloaderError::resolution(stderr))
        }
    }
}
