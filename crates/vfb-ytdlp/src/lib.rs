//! `yt-dlp` adapter: runs the downloader as a subprocess.
//!
//! Argument lists come from `vfb_core::backend::client::YtDlpAdapter`; this
//! crate only spawns, drains and interprets the process.

use async_trait::async_trait;

use std::{collections::VecDeque, path::PathBuf, process::Stdio, sync::Arc};

use vfb_core::{
    backend::{
        client::{classify_failure, CliInvocation, MediaBackend, YtDlpAdapter},
        types::{FetchRequest, MediaInfo, ProbeError, YtDlpConfig},
    },
    errors::Error,
    utils::truncate_text,
    Result,
};

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
    sync::Mutex,
};
use tracing::{debug, info};

const STDERR_TAIL_MAX_BYTES: usize = 16 * 1024;
const STDERR_TAIL_MAX_LINES: usize = 200;

#[derive(Clone, Debug)]
pub struct YtDlpClient {
    adapter: YtDlpAdapter,
}

#[derive(Clone, Debug, Default)]
struct StderrTail {
    lines: VecDeque<String>,
    bytes: usize,
}

impl StderrTail {
    fn push_line(&mut self, line: String) {
        // +1 for the '\n' we join with later.
        self.bytes = self.bytes.saturating_add(line.len() + 1);
        self.lines.push_back(line);

        while self.lines.len() > STDERR_TAIL_MAX_LINES || self.bytes > STDERR_TAIL_MAX_BYTES {
            if let Some(front) = self.lines.pop_front() {
                self.bytes = self.bytes.saturating_sub(front.len() + 1);
            } else {
                break;
            }
        }
    }

    fn snapshot(&self) -> String {
        self.lines.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}

impl YtDlpClient {
    pub fn new(cfg: YtDlpConfig) -> Self {
        Self {
            adapter: YtDlpAdapter::new(cfg),
        }
    }

    fn command(inv: &CliInvocation) -> Command {
        let mut cmd = Command::new(&inv.program);
        cmd.args(&inv.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// `yt-dlp --version`, for the startup check.
    pub async fn version(&self) -> Result<String> {
        let inv = self.adapter.version_invocation();
        let out = Self::command(&inv).output().await.map_err(|e| {
            Error::External(format!(
                "failed to run {}: {e}",
                inv.program.display()
            ))
        })?;
        if !out.status.success() {
            return Err(Error::External(format!(
                "{} --version exited with status {}",
                inv.program.display(),
                out.status
            )));
        }
        Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
    }
}

#[async_trait]
impl MediaBackend for YtDlpClient {
    async fn probe(
        &self,
        url: &str,
        max_filesize_bytes: u64,
    ) -> std::result::Result<MediaInfo, ProbeError> {
        let inv = self.adapter.probe_invocation(url, max_filesize_bytes);
        debug!(program = %inv.program.display(), args = ?inv.args, "probing");

        let out = Self::command(&inv)
            .output()
            .await
            .map_err(|e| ProbeError::Download(format!("failed to spawn yt-dlp: {e}")))?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(classify_failure(&stderr));
        }

        serde_json::from_slice::<MediaInfo>(&out.stdout).map_err(|e| {
            let preview = truncate_text(&String::from_utf8_lossy(&out.stdout), 200);
            ProbeError::Download(format!("unreadable info json: {e} ({preview})"))
        })
    }

    async fn fetch(&self, req: &FetchRequest) -> Result<PathBuf> {
        let inv = self.adapter.fetch_invocation(req);
        debug!(program = %inv.program.display(), args = ?inv.args, "fetching");

        let mut child = Self::command(&inv).spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::External("yt-dlp stdout was not captured".to_string()))?;
        let stderr = child.stderr.take();
        let stderr_tail: Arc<Mutex<StderrTail>> = Arc::new(Mutex::new(StderrTail::default()));

        // Drain stderr in background to avoid blocking on a full pipe.
        let drain = stderr.map(|stderr| {
            let tail = stderr_tail.clone();
            tokio::spawn(async move {
                let mut r = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = r.next_line().await {
                    tail.lock().await.push_line(line);
                }
            })
        });

        // `--print after_move:filepath` emits one line per finished file.
        let mut final_path: Option<PathBuf> = None;
        let mut reader = BufReader::new(stdout).lines();
        while let Some(line) = reader.next_line().await? {
            let line = line.trim();
            if !line.is_empty() {
                final_path = Some(PathBuf::from(line));
            }
        }

        let status = child.wait().await?;
        if let Some(h) = drain {
            let _ = h.await;
        }

        if !status.success() {
            let stderr = stderr_tail.lock().await.snapshot();
            if !stderr.trim().is_empty() {
                return Err(Error::External(format!(
                    "yt-dlp exited with status {status}\nstderr (tail):\n{stderr}"
                )));
            }
            return Err(Error::External(format!(
                "yt-dlp exited with status {status}"
            )));
        }

        let Some(path) = final_path else {
            // yt-dlp exits cleanly when `--max-filesize` aborts a transfer.
            let stderr = stderr_tail.lock().await.snapshot();
            return Err(Error::External(format!(
                "yt-dlp reported no output file\nstderr (tail):\n{stderr}"
            )));
        };

        info!(path = %path.display(), "yt-dlp finished");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_tail_is_bounded() {
        let mut tail = StderrTail::default();
        for i in 0..(STDERR_TAIL_MAX_LINES + 50) {
            tail.push_line(format!("line {i}"));
        }
        assert_eq!(tail.lines.len(), STDERR_TAIL_MAX_LINES);
        assert!(tail.snapshot().ends_with(&format!(
            "line {}",
            STDERR_TAIL_MAX_LINES + 49
        )));

        let mut big = StderrTail::default();
        big.push_line("x".repeat(STDERR_TAIL_MAX_BYTES));
        big.push_line("tail".to_string());
        assert_eq!(big.snapshot(), "tail");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_a_fake_ytdlp() {
        use std::os::unix::fs::PermissionsExt;

        let root = PathBuf::from(format!(
            "/tmp/vfb-ytdlp-test-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        std::fs::create_dir_all(&root).unwrap();

        // Probe prints JSON; a transfer writes into the `home:` path and
        // prints it; the magic URL fails like an unsupported site.
        let script = root.join("yt-dlp");
        std::fs::write(
            &script,
            r#"#!/bin/sh
for last; do :; done
case "$last" in
  *unsupported*) echo "ERROR: Unsupported URL: $last" >&2; exit 1 ;;
esac
for a in "$@"; do
  case "$a" in
    --dump-single-json)
      echo '{"title":"Fake","duration":12.7,"height":720,"width":1280,"filesize_approx":2048}'
      exit 0 ;;
    home:*) home="${a#home:}" ;;
  esac
done
printf 'data' > "$home/fake.mp4"
echo "$home/fake.mp4"
"#,
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let client = YtDlpClient::new(YtDlpConfig {
            ytdlp_path: script.clone(),
            cookies_file: None,
            concurrent_fragments: 2,
        });

        let info = client.probe("https://example.com/v", 1000).await.unwrap();
        assert_eq!(info.title, "Fake");
        assert_eq!(info.duration, Some(12.7));
        assert_eq!(info.filesize_approx, Some(2048.0));

        let err = client
            .probe("https://example.com/unsupported", 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Unsupported(_)));

        let workdir = root.join("work");
        std::fs::create_dir_all(&workdir).unwrap();
        let path = client
            .fetch(&FetchRequest {
                url: "https://example.com/v".to_string(),
                workdir: workdir.clone(),
                max_filesize_bytes: 1000,
            })
            .await
            .unwrap();
        assert_eq!(path, workdir.join("fake.mp4"));
        assert_eq!(std::fs::read(&path).unwrap(), b"data");

        let _ = std::fs::remove_dir_all(&root);
    }
}
