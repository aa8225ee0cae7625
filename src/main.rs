mod config;
mod errors;
mod input;
mod logging;
mod pipeline;
mod temp_file;
mod tools;
mod utils;
mod video;

#[cfg(test)]
mod test_support;

use std::process::ExitCode;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    config::Config,
    errors::DownloaderResult,
    pipeline::{Pipeline, RunReport},
    tools::ToolType,
    utils::MediaMode,
    video::{Ffmpeg, YtDlp},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.log) {
        logging::init_logging_stderr();
        log::warn!(
            "Could not open log file {}: {}. Logging to stderr",
            config.log.file.display(),
            e
        );
    }
    log::info!("Starting tube-grab...");

    let result = run(&config).await;
    match &result {
        Ok(report) => {
            log::info!(
                "Finished: {} succeeded, {} failed",
                report.succeeded(),
                report.failed()
            );
            println!(
                "Done: {} succeeded, {} failed",
                report.succeeded(),
                report.failed()
            );
            for outcome in &report.outcomes {
                if let Err(e) = &outcome.result {
                    println!("  {}: {}", outcome.url, e);
                }
            }
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
        }
    }

    if completed(&result) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// A run completed when no fatal error occurred and the batch was not
/// aborted. Per-URL failures under the continue policy still count.
fn completed(result: &DownloaderResult<RunReport>) -> bool {
    matches!(result, Ok(report) if !report.aborted)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

async fn run(config: &Config) -> DownloaderResult<RunReport> {
    tools::ensure_available(ToolType::Ffmpeg, &config.ffmpeg).await?;
    tools::ensure_available(ToolType::YtDlp, &config.yt_dlp).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Enter the video URL or the path to a .txt file with one URL per line:");
    let raw = lines.next_line().await?.unwrap_or_default();
    let urls = input::resolve_input(&raw).await?;

    println!("Download audio only? (y/n):");
    let audio_only = lines
        .next_line()
        .await?
        .map(|answer| is_yes(&answer))
        .unwrap_or(false);
    let mode = if audio_only {
        MediaMode::AudioOnly
    } else {
        config.video_mode
    };

    let source = YtDlp::new(&config.yt_dlp);
    let ffmpeg = Ffmpeg::new(&config.ffmpeg);
    let pipeline = Pipeline::new(config, &source, &ffmpeg);

    pipeline.prepare_output_dir().await?;
    log::info!(
        "Processing {} URL(s) in {} mode into {}",
        urls.len(),
        mode,
        config.output_dir.display()
    );

    Ok(pipeline.run(&urls, mode).await)
}
