//! The external downloader boundary: the `MediaBackend` port, its data types,
//! and the `yt-dlp` invocation builder shared by adapters.

pub mod client;
pub mod types;
