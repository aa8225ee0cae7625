use std::{path::Path, process::Stdio};

use tokio::process;

use crate::errors::{DownloaderError, DownloaderResult};

/// External binaries the pipeline shells out to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolType {
    Ffmpeg,
    YtDlp,
}

impl ToolType {
    fn version_arg(&self) -> &'static str {
        match self {
            ToolType::Ffmpeg => "-version",
            ToolType::YtDlp => "--version",
        }
    }
}

/// Runs `program` with its version flag and returns the first line printed.
/// A binary that can't be spawned because it doesn't exist is `MissingTool`.
pub async fn tool_version(tool: ToolType, program: &Path) -> DownloaderResult<String> {
    let output = process::Command::new(program)
        .arg(tool.version_arg())
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| DownloaderError::spawn_failed(program.display().to_string(), e))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}

pub async fn ensure_available(tool: ToolType, program: &Path) -> DownloaderResult<()> {
    let version = tool_version(tool, program).await?;
    log::info!("Using {} ({})", program.display(), version);
    Ok(())
}
