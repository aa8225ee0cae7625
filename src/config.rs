use std::path::PathBuf;

use strum::{Display, EnumString};

use crate::{
    errors::{DownloaderError, DownloaderResult},
    utils::MediaMode,
};

pub const OUTPUT_DIR_VAR: &str = "TUBE_GRAB_OUTPUT_DIR";
pub const VIDEO_MODE_VAR: &str = "TUBE_GRAB_VIDEO_MODE";
pub const ON_ERROR_VAR: &str = "TUBE_GRAB_ON_ERROR";
pub const LOG_FILE_VAR: &str = "TUBE_GRAB_LOG_FILE";
pub const LOG_KEEP_VAR: &str = "TUBE_GRAB_LOG_KEEP";
pub const TEMP_DIR_VAR: &str = "TUBE_GRAB_TEMP_DIR";
pub const FFMPEG_VAR: &str = "TUBE_GRAB_FFMPEG";
pub const YTDLP_VAR: &str = "TUBE_GRAB_YTDLP";

const DEFAULT_LOG_FILE: &str = "download_log.txt";
const DEFAULT_LOG_KEEP: usize = 4;
/// A year of weekly files
pub const MAX_LOG_KEEP: usize = 52;

/// What happens to the rest of a batch once one URL fails
#[derive(Display, EnumString, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FailurePolicy {
    /// Log the failure and move on to the next URL
    #[default]
    Continue,
    /// Stop the batch after the first failure
    Abort,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub file: PathBuf,
    /// Number of rotated weekly files kept next to the live one
    pub keep: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub output_dir: PathBuf,
    pub video_mode: MediaMode,
    pub failure_policy: FailurePolicy,
    pub log: LogConfig,
    pub temp_dir: PathBuf,
    pub ffmpeg: PathBuf,
    pub yt_dlp: PathBuf,
}

impl Config {
    pub fn from_env() -> DownloaderResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> DownloaderResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let output_dir = match get(OUTPUT_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => default_output_dir().ok_or_else(|| {
                DownloaderError::config(format!(
                    "output directory unset: no home directory and {} is empty",
                    OUTPUT_DIR_VAR
                ))
            })?,
        };

        let video_mode = match get(VIDEO_MODE_VAR) {
            Some(mode) => mode.trim().parse::<MediaMode>()?,
            None => MediaMode::Video,
        };
        if video_mode == MediaMode::AudioOnly {
            return Err(DownloaderError::config(format!(
                "{} must be `video` or `mux`",
                VIDEO_MODE_VAR
            )));
        }

        let failure_policy = match get(ON_ERROR_VAR) {
            Some(policy) => policy.trim().parse::<FailurePolicy>()?,
            None => FailurePolicy::default(),
        };

        let keep = match get(LOG_KEEP_VAR) {
            Some(keep) => keep.trim().parse::<usize>().map_err(|e| {
                DownloaderError::config(format!("{} is not a number: {}", LOG_KEEP_VAR, e))
            })?,
            None => DEFAULT_LOG_KEEP,
        };
        if keep > MAX_LOG_KEEP {
            return Err(DownloaderError::config(format!(
                "{} must be at most {}",
                LOG_KEEP_VAR, MAX_LOG_KEEP
            )));
        }

        Ok(Config {
            output_dir,
            video_mode,
            failure_policy,
            log: LogConfig {
                file: get(LOG_FILE_VAR)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
                keep,
            },
            temp_dir: get(TEMP_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            ffmpeg: PathBuf::from(get(FFMPEG_VAR).unwrap_or_else(|| "ffmpeg".to_string())),
            yt_dlp: PathBuf::from(get(YTDLP_VAR).unwrap_or_else(|| "yt-dlp".to_string())),
        })
    }
}

fn default_output_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("Videos").join("YouTube_downloads"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[(OUTPUT_DIR_VAR, "/tmp/out")])).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.video_mode, MediaMode::Video);
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
        assert_eq!(config.log.file, PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(config.log.keep, DEFAULT_LOG_KEEP);
        assert_eq!(config.ffmpeg, PathBuf::from("ffmpeg"));
        assert_eq!(config.yt_dlp, PathBuf::from("yt-dlp"));
        assert_eq!(config.temp_dir, std::env::temp_dir());
    }

    #[test]
    fn overrides() {
        let config = Config::from_lookup(lookup(&[
            (OUTPUT_DIR_VAR, "/srv/videos"),
            (VIDEO_MODE_VAR, "mux"),
            (ON_ERROR_VAR, "Abort"),
            (LOG_FILE_VAR, "/var/log/grab.log"),
            (LOG_KEEP_VAR, " 10 "),
            (FFMPEG_VAR, "/opt/ffmpeg/bin/ffmpeg"),
        ]))
        .unwrap();
        assert_eq!(config.video_mode, MediaMode::VideoAudioMux);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.log.file, PathBuf::from("/var/log/grab.log"));
        assert_eq!(config.log.keep, 10);
        assert_eq!(config.ffmpeg, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
    }

    #[test]
    fn blank_values_use_defaults() {
        let config =
            Config::from_lookup(lookup(&[(OUTPUT_DIR_VAR, "/tmp/out"), (ON_ERROR_VAR, "  ")]))
                .unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
    }

    #[test]
    fn rejects_invalid_values() {
        let bad_policy =
            Config::from_lookup(lookup(&[(OUTPUT_DIR_VAR, "/o"), (ON_ERROR_VAR, "retry")]));
        assert!(matches!(bad_policy, Err(DownloaderError::Config(_))));

        let audio_mode =
            Config::from_lookup(lookup(&[(OUTPUT_DIR_VAR, "/o"), (VIDEO_MODE_VAR, "audio")]));
        assert!(matches!(audio_mode, Err(DownloaderError::Config(_))));

        let bad_keep =
            Config::from_lookup(lookup(&[(OUTPUT_DIR_VAR, "/o"), (LOG_KEEP_VAR, "many")]));
        assert!(matches!(bad_keep, Err(DownloaderError::Config(_))));
    }

    #[test]
    fn log_keep_is_bounded() {
        let limit = MAX_LOG_KEEP.to_string();
        let at_limit = Config::from_lookup(lookup(&[
            (OUTPUT_DIR_VAR, "/o"),
            (LOG_KEEP_VAR, limit.as_str()),
        ]))
        .unwrap();
        assert_eq!(at_limit.log.keep, MAX_LOG_KEEP);

        let huge = Config::from_lookup(lookup(&[
            (OUTPUT_DIR_VAR, "/o"),
            (LOG_KEEP_VAR, "18446744073709551615"),
        ]));
        assert!(matches!(huge, Err(DownloaderError::Config(ref msg)) if msg.contains("at most")));
    }
}
