use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, info, warn};

use crate::{
    backend::{
        client::MediaBackend,
        types::{FetchRequest, ProbeError},
    },
    errors::Error,
};

use super::{
    metadata::MediaMetadata,
    policy::{admit, InvalidReason, Limits},
    workspace::RequestKey,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidateStatus {
    Unresolved,
    Valid,
    Invalid(InvalidReason),
}

/// Caller misuse of a candidate. These are programming errors, not data
/// conditions: check `status()` / `has_local_file()` first.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CandidateError {
    #[error("metadata for {url} has not been resolved")]
    MetadataUnavailable { url: String },

    #[error("no local file for {url}")]
    NoLocalFile { url: String },
}

/// Creates candidates that share one backend, one set of limits and one
/// temp root.
#[derive(Clone)]
pub struct MediaFetcher {
    backend: Arc<dyn MediaBackend>,
    limits: Limits,
    temp_dir: PathBuf,
}

impl MediaFetcher {
    pub fn new(backend: Arc<dyn MediaBackend>, limits: Limits, temp_dir: PathBuf) -> Self {
        Self {
            backend,
            limits,
            temp_dir,
        }
    }

    /// Build a candidate for `url` and resolve it. The returned candidate is
    /// never `Unresolved`.
    pub async fn candidate(&self, url: &str, key: RequestKey) -> MediaCandidate {
        let mut candidate = MediaCandidate::new(
            url,
            self.backend.clone(),
            self.limits,
            key.workdir(&self.temp_dir, url),
        );
        candidate.resolve().await;
        candidate
    }
}

/// One URL under evaluation.
///
/// Owns the downloaded artifact: the file is removed by `delete()`, or when
/// the candidate is dropped while still holding it.
pub struct MediaCandidate {
    url: String,
    metadata: Option<MediaMetadata>,
    local_path: Option<PathBuf>,
    status: CandidateStatus,
    workdir: PathBuf,
    limits: Limits,
    backend: Arc<dyn MediaBackend>,
}

impl std::fmt::Debug for MediaCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaCandidate")
            .field("url", &self.url)
            .field("status", &self.status)
            .field("metadata", &self.metadata)
            .field("local_path", &self.local_path)
            .field("workdir", &self.workdir)
            .finish()
    }
}

impl MediaCandidate {
    pub(crate) fn new(
        url: impl Into<String>,
        backend: Arc<dyn MediaBackend>,
        limits: Limits,
        workdir: PathBuf,
    ) -> Self {
        Self {
            url: url.into(),
            metadata: None,
            local_path: None,
            status: CandidateStatus::Unresolved,
            workdir,
            limits,
            backend,
        }
    }

    async fn resolve(&mut self) {
        debug!(url = %self.url, "retrieving info");
        match self
            .backend
            .probe(&self.url, self.limits.max_filesize_bytes)
            .await
        {
            Ok(info) => {
                let meta = MediaMetadata::from(info);
                self.status = match admit(&meta, &self.limits) {
                    Ok(()) => CandidateStatus::Valid,
                    Err(reason) => {
                        warn!(
                            title = %meta.title,
                            duration_secs = meta.duration_secs,
                            size = ?meta.size,
                            %reason,
                            "rejected before transfer"
                        );
                        CandidateStatus::Invalid(reason)
                    }
                };
                self.metadata = Some(meta);
            }
            Err(e) => {
                let reason = reason_for_probe_error(&e);
                debug!(url = %self.url, error = %e, %reason, "metadata probe failed");
                self.status = CandidateStatus::Invalid(reason);
            }
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> CandidateStatus {
        self.status
    }

    pub fn is_valid(&self) -> bool {
        self.status == CandidateStatus::Valid
    }

    pub fn invalid_reason(&self) -> Option<InvalidReason> {
        match self.status {
            CandidateStatus::Invalid(reason) => Some(reason),
            CandidateStatus::Unresolved | CandidateStatus::Valid => None,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn metadata(&self) -> Result<&MediaMetadata, CandidateError> {
        self.metadata
            .as_ref()
            .ok_or_else(|| CandidateError::MetadataUnavailable {
                url: self.url.clone(),
            })
    }

    pub fn title(&self) -> Result<&str, CandidateError> {
        Ok(&self.metadata()?.title)
    }

    pub fn description(&self) -> Result<Option<&str>, CandidateError> {
        Ok(self.metadata()?.description.as_deref())
    }

    pub fn duration(&self) -> Result<u64, CandidateError> {
        Ok(self.metadata()?.duration_secs)
    }

    /// `(height, width)` in pixels.
    pub fn dimensions(&self) -> Result<(u32, u32), CandidateError> {
        let m = self.metadata()?;
        Ok((m.height, m.width))
    }

    /// Exact size if known, otherwise the approximate one.
    pub fn filesize(&self) -> Result<Option<u64>, CandidateError> {
        Ok(self.metadata()?.size.map(|s| s.bytes()))
    }

    pub fn has_local_file(&self) -> bool {
        self.local_path.is_some()
    }

    pub fn local_path(&self) -> Result<&Path, CandidateError> {
        self.local_path
            .as_deref()
            .ok_or_else(|| CandidateError::NoLocalFile {
                url: self.url.clone(),
            })
    }

    /// Transfer the media into this candidate's work directory.
    ///
    /// On return, either `local_path()` points at a file within the size
    /// limit, or there is no local file. An oversized artifact demotes the
    /// candidate to `Invalid(FileTooBig)` and is removed before returning.
    pub async fn download(&mut self) {
        if !self.is_valid() {
            warn!(url = %self.url, status = ?self.status, "invalid video, won't download");
            return;
        }
        if self.local_path.is_some() {
            debug!(url = %self.url, "already downloaded");
            return;
        }

        info!(url = %self.url, "downloading video");
        if let Err(e) = tokio::fs::create_dir_all(&self.workdir).await {
            warn!(workdir = %self.workdir.display(), error = %e, "failed to create work directory");
            return;
        }

        let req = FetchRequest {
            url: self.url.clone(),
            workdir: self.workdir.clone(),
            max_filesize_bytes: self.limits.max_filesize_bytes,
        };
        let path = match self.fetch_checked(&req).await {
            Ok(p) => p,
            Err(e) => {
                warn!(url = %self.url, error = %e, "download failed");
                remove_workdir(&self.workdir).await;
                return;
            }
        };
        info!(path = %path.display(), "downloaded video");

        let actual = match tokio::fs::metadata(&path).await {
            Ok(md) => md.len(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "downloaded file is not readable");
                remove_workdir(&self.workdir).await;
                return;
            }
        };

        // Hand ownership to the candidate first so `delete()` cleans it up.
        self.local_path = Some(path);

        if self.limits.exceeds_filesize(actual) {
            warn!(
                url = %self.url,
                actual_bytes = actual,
                max_bytes = self.limits.max_filesize_bytes,
                "downloaded file is over the size limit"
            );
            self.status = CandidateStatus::Invalid(InvalidReason::FileTooBig);
            self.delete().await;
        }
    }

    async fn fetch_checked(&self, req: &FetchRequest) -> crate::Result<PathBuf> {
        let path = self.backend.fetch(req).await?;
        if !path.starts_with(&self.workdir) {
            // Never adopt (and later delete) a file outside our namespace.
            return Err(Error::InvalidPath {
                path,
                reason: format!("outside work directory {}", self.workdir.display()),
            });
        }
        Ok(path)
    }

    /// Release the downloaded artifact. Safe to call on every exit path:
    /// without a local file this only logs.
    pub async fn delete(&mut self) {
        let Some(path) = self.local_path.take() else {
            warn!(url = %self.url, "no file to delete");
            return;
        };

        info!(path = %path.display(), "deleting");
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to delete file");
            }
        }
        remove_workdir(&self.workdir).await;
    }
}

impl Drop for MediaCandidate {
    fn drop(&mut self) {
        let Some(path) = self.local_path.take() else {
            return;
        };
        warn!(path = %path.display(), "candidate dropped with a local file, removing");
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to delete file");
            }
        }
        match std::fs::remove_dir_all(&self.workdir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(workdir = %self.workdir.display(), error = %e, "failed to remove work directory")
            }
        }
    }
}

fn reason_for_probe_error(e: &ProbeError) -> InvalidReason {
    match e {
        ProbeError::Unsupported(_) => InvalidReason::UnsupportedUrl,
        ProbeError::Extractor(msg) if msg.contains("--cookies") => InvalidReason::Unauthorized,
        ProbeError::Extractor(_) | ProbeError::Download(_) => InvalidReason::DownloadFailed,
    }
}

async fn remove_workdir(dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(workdir = %dir.display(), error = %e, "failed to remove work directory"),
    }
}
