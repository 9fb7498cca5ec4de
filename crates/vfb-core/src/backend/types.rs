use std::path::PathBuf;

use serde::Deserialize;

/// Raw info record as reported by the downloader's metadata probe.
///
/// Field names follow `yt-dlp --dump-single-json`. Everything except the
/// title is optional because extractors fill in wildly different subsets.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MediaInfo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub filesize: Option<f64>,
    #[serde(default)]
    pub filesize_approx: Option<f64>,
}

/// Classified failure of a metadata probe.
///
/// This is a closed set so the resolver's mapping onto user-facing reasons is
/// an exhaustive match.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// No extractor accepts the URL.
    #[error("unsupported url: {0}")]
    Unsupported(String),

    /// An extractor accepted the URL but failed while extracting.
    #[error("extractor error: {0}")]
    Extractor(String),

    /// Anything else: network, spawn failures, unparseable output.
    #[error("download error: {0}")]
    Download(String),
}

/// A single transfer request handed to the backend.
#[derive(Clone, Debug)]
pub struct FetchRequest {
    pub url: String,
    /// Directory the artifact (and any partial files) must land in.
    pub workdir: PathBuf,
    pub max_filesize_bytes: u64,
}

#[derive(Clone, Debug)]
pub struct YtDlpConfig {
    pub ytdlp_path: PathBuf,
    pub cookies_file: Option<PathBuf>,
    pub concurrent_fragments: u32,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            cookies_file: None,
            concurrent_fragments: 8,
        }
    }
}
