use std::path::PathBuf;

use tokio::fs;

use crate::errors::{DownloaderError, DownloaderResult};

/// Turns the raw prompt answer into the ordered list of URLs to process.
///
/// A string starting with `http` is taken as a single URL. A path ending in
/// `.txt` is read as a newline-delimited list; blank lines are skipped. URLs
/// are not validated here, bad ones fail later during resolution.
pub async fn resolve_input(raw: &str) -> DownloaderResult<Vec<String>> {
    let raw = raw.trim();

    if raw.starts_with("http") {
        return Ok(vec![raw.to_string()]);
    }

    if raw.to_lowercase().ends_with(".txt") {
        let path = PathBuf::from(raw);
        let content = fs::read_to_string(&path).await?;
        let urls: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if urls.is_empty() {
            return Err(DownloaderError::EmptyList(path));
        }
        log::info!("Loaded {} URLs from {}", urls.len(), path.display());
        return Ok(urls);
    }

    Err(DownloaderError::unrecognized_input(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_url_is_passed_through() {
        let urls = resolve_input("https://example.com/watch?v=abc\n").await.unwrap();
        assert_eq!(urls, vec!["https://example.com/watch?v=abc"]);

        // no well-formedness check at this layer
        let urls = resolve_input("httpnonsense").await.unwrap();
        assert_eq!(urls, vec!["httpnonsense"]);
    }

    #[tokio::test]
    async fn list_file_drops_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("urls.txt");
        std::fs::write(&list, "u1\n\n  \nu2\n").unwrap();

        let urls = resolve_input(list.to_str().unwrap()).await.unwrap();
        assert_eq!(urls, vec!["u1", "u2"]);
    }

    #[tokio::test]
    async fn list_lines_are_trimmed_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("URLS.TXT");
        std::fs::write(&list, "  https://b\r\nhttps://a\t\n").unwrap();

        let urls = resolve_input(list.to_str().unwrap()).await.unwrap();
        assert_eq!(urls, vec!["https://b", "https://a"]);
    }

    #[tokio::test]
    async fn blank_list_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("empty.txt");
        std::fs::write(&list, "\n   \n\t\n").unwrap();

        let err = resolve_input(list.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, DownloaderError::EmptyList(ref p) if *p == list));
    }

    #[tokio::test]
    async fn missing_list_is_a_filesystem_error() {
        let err = resolve_input("/nonexistent/tube-grab/urls.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, DownloaderError::FileSystem(_)));
    }

    #[tokio::test]
    async fn anything_else_is_unrecognized() {
        for raw in ["", "example.com/watch", "urls.csv", "ftp://host/file"] {
            let err = resolve_input(raw).await.unwrap_err();
            assert!(
                matches!(err, DownloaderError::UnrecognizedInput(_)),
                "{:?}",
                raw
            );
        }
    }
}
