use std::path::Path;

use async_trait::async_trait;

use crate::{
    errors::{DownloaderError, DownloaderResult},
    utils::MediaMode,
};

/// Container every video deliverable is produced in
pub const TARGET_CONTAINER: &str = "mp4";

/// One fetchable track (or pair of tracks) offered by the platform
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    pub format_id: String,
    /// File extension of the stream, e.g. `mp4`, `webm`, `m4a`
    pub container: String,
    pub height: Option<u32>,
    /// kbit/s
    pub bitrate: Option<f32>,
    pub has_video: bool,
    pub has_audio: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Video and audio in one stream
    Progressive,
    VideoOnly,
    AudioOnly,
    /// Neither track, e.g. storyboards
    Unplayable,
}

impl StreamDescriptor {
    pub fn kind(&self) -> StreamKind {
        match (self.has_video, self.has_audio) {
            (true, true) => StreamKind::Progressive,
            (true, false) => StreamKind::VideoOnly,
            (false, true) => StreamKind::AudioOnly,
            (false, false) => StreamKind::Unplayable,
        }
    }
}

/// Title and stream list for one URL
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMedia {
    pub title: String,
    pub streams: Vec<StreamDescriptor>,
}

/// Extraction backend seam: everything the pipeline needs from the platform.
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &str;

    /// Lists the streams available for `url`. Fails with `Resolution` when
    /// the URL is rejected or nothing is offered.
    async fn resolve_streams(&self, url: &str) -> DownloaderResult<ResolvedMedia>;

    /// Downloads `stream` completely into `dest`, replacing its content.
    async fn fetch(&self, url: &str, stream: &StreamDescriptor, dest: &Path)
    -> DownloaderResult<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Single(StreamDescriptor),
    Pair {
        video: StreamDescriptor,
        audio: StreamDescriptor,
    },
}

/// Audio containers that can go into a `target` file without remuxing trouble.
fn audio_containers(target: &str) -> &[&str] {
    match target {
        "mp4" => &["mp4", "m4a"],
        "webm" => &["webm"],
        _ => &[],
    }
}

/// Keeps the first of equally ranked streams, so the backend's order breaks ties.
fn best_by<'a, I, K, F>(streams: I, key: F) -> Option<&'a StreamDescriptor>
where
    I: IntoIterator<Item = &'a StreamDescriptor>,
    K: PartialOrd,
    F: Fn(&StreamDescriptor) -> K,
{
    let mut best: Option<(&StreamDescriptor, K)> = None;
    for stream in streams {
        let rank = key(stream);
        let better = match &best {
            Some((_, top)) => rank > *top,
            None => true,
        };
        if better {
            best = Some((stream, rank));
        }
    }
    best.map(|(stream, _)| stream)
}

fn resolution(stream: &StreamDescriptor) -> u32 {
    stream.height.unwrap_or(0)
}

fn bitrate(stream: &StreamDescriptor) -> f32 {
    stream.bitrate.unwrap_or(0.0)
}

fn best_progressive<'a>(
    streams: &'a [StreamDescriptor],
    container: &str,
) -> Option<&'a StreamDescriptor> {
    best_by(
        streams
            .iter()
            .filter(|s| s.kind() == StreamKind::Progressive && s.container == container),
        resolution,
    )
}

fn best_video_only<'a>(
    streams: &'a [StreamDescriptor],
    container: &str,
) -> Option<&'a StreamDescriptor> {
    best_by(
        streams
            .iter()
            .filter(|s| s.kind() == StreamKind::VideoOnly && s.container == container),
        resolution,
    )
}

fn best_audio<'a, F>(streams: &'a [StreamDescriptor], accept: F) -> Option<&'a StreamDescriptor>
where
    F: Fn(&StreamDescriptor) -> bool,
{
    best_by(
        streams
            .iter()
            .filter(|s| s.kind() == StreamKind::AudioOnly && accept(*s)),
        bitrate,
    )
}

/// Applies the selection policy of `mode` to `streams`.
///
/// - `video`: highest-resolution progressive stream in `container`
/// - `audio-only`: highest-bitrate audio-only stream, any container
/// - `video+audio-mux`: highest-resolution video-only stream in `container`
///   plus the best audio-only stream of a compatible container. Progressive
///   streams are never used as a fallback.
pub fn select_streams(
    mode: MediaMode,
    streams: &[StreamDescriptor],
    container: &str,
) -> DownloaderResult<Selection> {
    match mode {
        MediaMode::Video => best_progressive(streams, container)
            .cloned()
            .map(Selection::Single)
            .ok_or_else(|| {
                DownloaderError::no_stream(format!("no progressive {} stream", container))
            }),
        MediaMode::AudioOnly => best_audio(streams, |_| true)
            .cloned()
            .map(Selection::Single)
            .ok_or_else(|| DownloaderError::no_stream("no audio-only stream")),
        MediaMode::VideoAudioMux => {
            let video = best_video_only(streams, container).ok_or_else(|| {
                DownloaderError::no_stream(format!("no video-only {} stream", container))
            })?;
            let compatible = audio_containers(container);
            let audio = best_audio(streams, |s| compatible.contains(&s.container.as_str()))
                .ok_or_else(|| {
                    DownloaderError::no_stream(format!(
                        "no audio-only stream compatible with {}",
                        container
                    ))
                })?;
            Ok(Selection::Pair {
                video: video.clone(),
                audio: audio.clone(),
            })
        }
    }
}
