use std::{path::Path, time::Instant};

use log::info;

use crate::{
    errors::DownloaderResult,
    temp_file::TempFile,
    video::streams::{Selection, StreamDescriptor, StreamSource},
};

/// Temporary files holding the selected streams. Dropping it removes them.
#[derive(Debug)]
pub enum Fetched {
    Single(TempFile),
    Pair { video: TempFile, audio: TempFile },
}

/// Downloads every stream of `selection` into fresh temporary files under
/// `temp_dir`. A failed fetch leaves nothing behind.
pub async fn fetch_selection(
    source: &dyn StreamSource,
    url: &str,
    selection: &Selection,
    temp_dir: &Path,
) -> DownloaderResult<Fetched> {
    match selection {
        Selection::Single(stream) => {
            let file = fetch_one(source, url, stream, temp_dir).await?;
            Ok(Fetched::Single(file))
        }
        Selection::Pair { video, audio } => {
            let video = fetch_one(source, url, video, temp_dir).await?;
            let audio = fetch_one(source, url, audio, temp_dir).await?;
            Ok(Fetched::Pair { video, audio })
        }
    }
}

async fn fetch_one(
    source: &dyn StreamSource,
    url: &str,
    stream: &StreamDescriptor,
    temp_dir: &Path,
) -> DownloaderResult<TempFile> {
    let temp = TempFile::create_in(temp_dir, &stream.container).await?;

    info!(
        "Fetching format {} ({}, {:?}) via {} into {}",
        stream.format_id,
        stream.container,
        stream.kind(),
        source.name(),
        temp.path().display()
    );

    let started = Instant::now();
    source.fetch(url, stream, temp.path()).await?;
    info!("Fetch completed in {:.2?}", started.elapsed());

    Ok(temp)
}
