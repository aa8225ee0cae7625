use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use log::{info, warn};
use tokio::{fs, process};

use crate::{
    errors::{DownloaderError, DownloaderResult},
    temp_file::TempFile,
};

const AUDIO_CODEC: &str = "libmp3lame";
const AUDIO_BITRATE: &str = "192k";
const AUDIO_SAMPLE_RATE: &str = "44100";
const MUX_AUDIO_CODEC: &str = "aac";

/// Captured result of one media tool invocation
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Transcoder seam: runs the media binary with an argument vector.
#[async_trait]
pub trait MediaTool: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, args: &[OsString]) -> DownloaderResult<ToolOutput>;
}

pub struct Ffmpeg {
    program: PathBuf,
    name: String,
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let name = program.display().to_string();
        Self { program, name }
    }
}

#[async_trait]
impl MediaTool for Ffmpeg {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, args: &[OsString]) -> DownloaderResult<ToolOutput> {
        let output = process::Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| DownloaderError::spawn_failed(self.name.clone(), e))?;

        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Copies every stream of `input` into `output` and drops all metadata tags.
pub async fn strip_metadata(
    tool: &dyn MediaTool,
    input: TempFile,
    output: &Path,
) -> DownloaderResult<()> {
    let args: Vec<OsString> = vec![
        "-hide_banner".into(),
        "-i".into(),
        input.path().into(),
        "-map_metadata".into(),
        "-1".into(),
        "-c".into(),
        "copy".into(),
        output.into(),
    ];
    run_tool(tool, &args, output).await?;
    info!("Metadata stripped successfully from {}", input.path().display());
    Ok(())
}

/// Combines a video-only and an audio-only file. Video is copied as-is,
/// audio is re-encoded to AAC.
pub async fn mux(
    tool: &dyn MediaTool,
    video: TempFile,
    audio: TempFile,
    output: &Path,
) -> DownloaderResult<()> {
    let args: Vec<OsString> = vec![
        "-hide_banner".into(),
        "-i".into(),
        video.path().into(),
        "-i".into(),
        audio.path().into(),
        "-map".into(),
        "0:v:0".into(),
        "-map".into(),
        "1:a:0".into(),
        "-c:v".into(),
        "copy".into(),
        "-c:a".into(),
        MUX_AUDIO_CODEC.into(),
        "-b:a".into(),
        AUDIO_BITRATE.into(),
        output.into(),
    ];
    run_tool(tool, &args, output).await?;
    info!(
        "Muxed {} and {}",
        video.path().display(),
        audio.path().display()
    );
    Ok(())
}

/// Drops any video track and re-encodes the audio to MP3, overwriting `output`.
pub async fn transcode_audio(
    tool: &dyn MediaTool,
    input: TempFile,
    output: &Path,
) -> DownloaderResult<()> {
    let args: Vec<OsString> = vec![
        "-hide_banner".into(),
        "-y".into(),
        "-i".into(),
        input.path().into(),
        "-vn".into(),
        "-c:a".into(),
        AUDIO_CODEC.into(),
        "-b:a".into(),
        AUDIO_BITRATE.into(),
        "-ar".into(),
        AUDIO_SAMPLE_RATE.into(),
        output.into(),
    ];
    run_tool(tool, &args, output).await?;
    info!("Audio transcoded from {}", input.path().display());
    Ok(())
}

/// Runs the tool and maps a failed exit onto `Transcode`. A partial output
/// created by the failed run is removed; a file that was already there is
/// left alone.
async fn run_tool(tool: &dyn MediaTool, args: &[OsString], output: &Path) -> DownloaderResult<()> {
    let existed = fs::try_exists(output).await?;
    let result = tool.run(args).await?;

    if !result.success {
        if !existed {
            remove_partial(output).await;
        }
        log::error!("{} failed: {}", tool.name(), result.stderr.trim());
        return Err(DownloaderError::Transcode {
            command: tool.name().to_string(),
            code: result.code,
            stderr: result.stderr,
        });
    }

    info!("{} stdout output: {}", tool.name(), result.stdout.trim());
    info!("{} stderr output: {}", tool.name(), result.stderr.trim());
    Ok(())
}

async fn remove_partial(output: &Path) {
    match fs::remove_file(output).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            warn!("Failed to remove partial output {:?}: {}", output, e);
        }
        _ => {}
    }
}
