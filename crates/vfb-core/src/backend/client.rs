use std::path::PathBuf;

use async_trait::async_trait;

use crate::Result;

use super::types::*;

/// Format sort order: prefer H.264 + AAC so Telegram can play the file inline.
const FORMAT_SORT: &str = "vcodec:avc,res,acodec:aac";

/// Output template inside the candidate's work directory.
const OUTPUT_TEMPLATE: &str = "%(title).80B-%(id)s.%(ext)s";

/// A concrete CLI invocation (used by the `yt-dlp` runner).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

/// Builds `yt-dlp` argument lists and interprets its failures.
///
/// Kept in the core so the flags that enforce the size ceiling live next to
/// the policy that depends on them.
#[derive(Clone, Debug, Default)]
pub struct YtDlpAdapter {
    pub cfg: YtDlpConfig,
}

impl YtDlpAdapter {
    pub fn new(cfg: YtDlpConfig) -> Self {
        Self { cfg }
    }

    /// Prefer a single progressive stream under the ceiling, then an
    /// approximate match, then best video + best audio, then anything.
    pub fn format_selector(max_filesize_bytes: u64) -> String {
        format!(
            "best[filesize<{max_filesize_bytes}]/best[filesize_approx<{max_filesize_bytes}]/bv*+ba/b"
        )
    }

    /// Metadata-only probe. The format selector is passed so the reported
    /// size describes the format a transfer would pick.
    pub fn probe_invocation(&self, url: &str, max_filesize_bytes: u64) -> CliInvocation {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--skip-download".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
        ];
        self.push_common_args(&mut args, max_filesize_bytes);
        args.push("--".to_string());
        args.push(url.to_string());

        CliInvocation {
            program: self.cfg.ytdlp_path.clone(),
            args,
        }
    }

    /// Full transfer. The final path is printed to stdout once all
    /// post-processing (merging, moving) has finished.
    pub fn fetch_invocation(&self, req: &FetchRequest) -> CliInvocation {
        let workdir = req.workdir.display().to_string();
        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "--no-warnings".to_string(),
            "--restrict-filenames".to_string(),
            "--max-filesize".to_string(),
            req.max_filesize_bytes.to_string(),
            "--concurrent-fragments".to_string(),
            self.cfg.concurrent_fragments.max(1).to_string(),
            "--paths".to_string(),
            format!("home:{workdir}"),
            "--paths".to_string(),
            format!("temp:{workdir}"),
            "--output".to_string(),
            OUTPUT_TEMPLATE.to_string(),
            // `--print` implies `--simulate` unless told otherwise.
            "--no-simulate".to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
        ];
        self.push_common_args(&mut args, req.max_filesize_bytes);
        args.push("--".to_string());
        args.push(req.url.clone());

        CliInvocation {
            program: self.cfg.ytdlp_path.clone(),
            args,
        }
    }

    pub fn version_invocation(&self) -> CliInvocation {
        CliInvocation {
            program: self.cfg.ytdlp_path.clone(),
            args: vec!["--version".to_string()],
        }
    }

    fn push_common_args(&self, args: &mut Vec<String>, max_filesize_bytes: u64) {
        args.push("--format".to_string());
        args.push(Self::format_selector(max_filesize_bytes));
        args.push("--format-sort".to_string());
        args.push(FORMAT_SORT.to_string());
        if let Some(cookies) = &self.cfg.cookies_file {
            args.push("--cookies".to_string());
            args.push(cookies.display().to_string());
        }
    }
}

/// Classify a failed `yt-dlp` run from its stderr.
///
/// yt-dlp reports the fatal condition on the last `ERROR:` line. Extractor
/// failures carry an `[extractor]` tag right after the prefix.
pub fn classify_failure(stderr: &str) -> ProbeError {
    let Some(line) = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with("ERROR:"))
    else {
        let tail = stderr.trim();
        return ProbeError::Download(if tail.is_empty() {
            "yt-dlp exited without an error message".to_string()
        } else {
            tail.to_string()
        });
    };

    let msg = line.trim_start_matches("ERROR:").trim();
    if msg.starts_with("Unsupported URL") {
        return ProbeError::Unsupported(msg.to_string());
    }
    if msg.starts_with('[') {
        return ProbeError::Extractor(msg.to_string());
    }
    ProbeError::Download(msg.to_string())
}

/// Port for the external downloader tool.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Metadata-only probe; never transfers the payload.
    async fn probe(&self, url: &str, max_filesize_bytes: u64)
        -> std::result::Result<MediaInfo, ProbeError>;

    /// Materialize the media into `req.workdir` and return its final path.
    async fn fetch(&self, req: &FetchRequest) -> Result<PathBuf>;
}
