pub mod convert;
pub mod fetch;
pub mod streams;
pub mod youtube;

pub use convert::{Ffmpeg, MediaTool};
pub use fetch::{Fetched, fetch_selection};
pub use streams::{StreamSource, TARGET_CONTAINER, select_streams};
pub use youtube::YtDlp;
