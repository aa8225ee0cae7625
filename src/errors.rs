use std::{fmt, path::PathBuf};

/// Errors produced while resolving, fetching and post-processing downloads
#[derive(Debug)]
pub enum DownloaderError {
    /// Input is neither a URL nor a `.txt` list
    UnrecognizedInput(String),
    /// List file contained no URLs
    EmptyList(PathBuf),
    /// The platform or the extraction backend rejected the URL
    Resolution(String),
    /// No stream matches the selection policy
    NoStream(String),
    /// The transcoding binary exited unsuccessfully
    Transcode {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    /// Output directory could not be created
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },
    /// An external binary is not installed
    MissingTool(String),
    /// Filesystem errors
    FileSystem(std::io::Error),
    /// Invalid or missing configuration
    Config(String),
}

impl fmt::Display for DownloaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloaderError::UnrecognizedInput(input) => write!(
                f,
                "unrecognized input {:?}: expected a URL or a path to a .txt file",
                input
            ),
            DownloaderError::EmptyList(path) => {
                write!(f, "no URLs found in {}", path.display())
            }
            DownloaderError::Resolution(msg) => write!(f, "could not resolve streams: {}", msg),
            DownloaderError::NoStream(msg) => write!(f, "no suitable stream: {}", msg),
            DownloaderError::Transcode {
                command,
                code,
                stderr,
            } => match code {
                Some(code) => write!(f, "{} exited with code {} - stderr: {}", command, code, stderr),
                None => write!(f, "{} was terminated by a signal - stderr: {}", command, stderr),
            },
            DownloaderError::DirectoryCreation { path, source } => {
                write!(f, "could not create directory {}: {}", path.display(), source)
            }
            DownloaderError::MissingTool(tool) => {
                write!(f, "required tool `{}` was not found in PATH", tool)
            }
            DownloaderError::FileSystem(e) => write!(f, "filesystem error: {}", e),
            DownloaderError::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl std::error::Error for DownloaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DownloaderError::DirectoryCreation { source, .. } => Some(source),
            DownloaderError::FileSystem(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DownloaderError {
    fn from(err: std::io::Error) -> Self {
        DownloaderError::FileSystem(err)
    }
}

impl From<strum::ParseError> for DownloaderError {
    fn from(err: strum::ParseError) -> Self {
        DownloaderError::Config(format!("Enum parsing error: {}", err))
    }
}

impl DownloaderError {
    pub fn unrecognized_input(input: impl Into<String>) -> Self {
        Self::UnrecognizedInput(input.into())
    }

    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    pub fn no_stream(msg: impl Into<String>) -> Self {
        Self::NoStream(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Maps a failure to spawn `tool` onto `MissingTool` when the binary is absent.
    pub fn spawn_failed(tool: impl Into<String>, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::MissingTool(tool.into())
        } else {
            Self::FileSystem(err)
        }
    }

    /// Precondition failures end the whole run instead of a single URL.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DownloaderError::UnrecognizedInput(_)
                | DownloaderError::EmptyList(_)
                | DownloaderError::DirectoryCreation { .. }
                | DownloaderError::MissingTool(_)
                | DownloaderError::Config(_)
        )
    }
}

pub type DownloaderResult<T> = Result<T, DownloaderError>;
