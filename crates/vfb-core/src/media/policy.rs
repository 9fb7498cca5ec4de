use super::metadata::MediaMetadata;

/// Why a candidate will not be (or was not) delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvalidReason {
    DownloadFailed,
    UnsupportedUrl,
    VideoTooLong,
    FileTooBig,
    Unauthorized,
}

impl InvalidReason {
    pub fn as_str(self) -> &'static str {
        match self {
            InvalidReason::DownloadFailed => "DOWNLOAD_FAILED",
            InvalidReason::UnsupportedUrl => "UNSUPPORTED_URL",
            InvalidReason::VideoTooLong => "VIDEO_TOO_LONG",
            InvalidReason::FileTooBig => "FILE_TOO_BIG",
            InvalidReason::Unauthorized => "UNAUTHORIZED",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static admission thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub max_duration_secs: u64,
    pub max_filesize_bytes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_duration_secs: 600, // 10 minutes
            max_filesize_bytes: 50 * 1024 * 1024, // Bot API upload cap
        }
    }
}

impl Limits {
    pub fn exceeds_filesize(&self, bytes: u64) -> bool {
        bytes > self.max_filesize_bytes
    }
}

/// Admission rules, first match wins. Duration is always known, size may
/// not be; an unknown size is left for the post-download check.
pub fn admit(meta: &MediaMetadata, limits: &Limits) -> Result<(), InvalidReason> {
    if meta.duration_secs > limits.max_duration_secs {
        return Err(InvalidReason::VideoTooLong);
    }
    if let Some(size) = meta.size {
        if limits.exceeds_filesize(size.bytes()) {
            return Err(InvalidReason::FileTooBig);
        }
    }
    Ok(())
}
