use std::path::{Path, PathBuf};

use strum::{Display, EnumString};
use tokio::{fs, io};

const UNTITLED: &str = "untitled";

#[derive(Display, EnumString, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum MediaMode {
    #[strum(to_string = "video")]
    Video,
    #[strum(to_string = "audio-only", serialize = "audio")]
    AudioOnly,
    #[strum(to_string = "video+audio-mux", serialize = "mux")]
    VideoAudioMux,
}

impl MediaMode {
    /// Extension of the final artifact.
    pub fn extension(&self) -> &'static str {
        match self {
            MediaMode::Video | MediaMode::VideoAudioMux => "mp4",
            MediaMode::AudioOnly => "mp3",
        }
    }
}

/// Keeps word characters, whitespace, `.` and `-`, then collapses runs of
/// whitespace into a single space. No space is kept at either edge.
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace() || *c == '.' || *c == '-')
        .collect();

    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        UNTITLED.to_string()
    } else {
        collapsed
    }
}

/// Finds the first free path among `base.ext`, `base_1.ext`, `base_2.ext`, ...
///
/// The probe and the later write are not atomic: another process may claim
/// the returned path in between.
pub async fn unique_output_path(dir: &Path, base: &str, ext: &str) -> io::Result<PathBuf> {
    let candidate = dir.join(format!("{}.{}", base, ext));
    if !fs::try_exists(&candidate).await? {
        return Ok(candidate);
    }

    let mut increment: u32 = 1;
    loop {
        let candidate = dir.join(format!("{}_{}.{}", base, increment, ext));
        if !fs::try_exists(&candidate).await? {
            return Ok(candidate);
        }
        increment += 1;
    }
}
