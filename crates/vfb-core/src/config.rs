use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{backend::types::YtDlpConfig, errors::Error, media::Limits, Result};

/// Typed configuration, read from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,

    // Admission limits
    pub max_duration_secs: u64,
    pub max_filesize_bytes: u64,

    // Downloader
    pub ytdlp_path: PathBuf,
    pub ytdlp_cookies: Option<PathBuf>,
    pub concurrent_fragments: u32,

    // Runtime
    pub temp_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        // Required env vars
        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN")
            .and_then(non_empty)
            .or_else(|| env_str("BOT_TOKEN").and_then(non_empty))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        let defaults = Limits::default();
        let max_duration_secs =
            env_u64("MAX_DURATION_SECS").unwrap_or(defaults.max_duration_secs);
        let max_filesize_bytes =
            env_u64("MAX_FILESIZE_BYTES").unwrap_or(defaults.max_filesize_bytes);
        if max_filesize_bytes == 0 {
            return Err(Error::Config(
                "MAX_FILESIZE_BYTES must be greater than zero".to_string(),
            ));
        }

        let ytdlp_path = env_path("YTDLP_PATH")
            .or_else(|| which_in_path("yt-dlp"))
            .unwrap_or_else(|| PathBuf::from("yt-dlp"));
        let ytdlp_cookies = env_path("YTDLP_COOKIES");
        if let Some(p) = &ytdlp_cookies {
            if !p.is_file() {
                return Err(Error::InvalidPath {
                    path: p.clone(),
                    reason: "YTDLP_COOKIES is not a file".to_string(),
                });
            }
        }
        let concurrent_fragments = env_u32("YTDLP_CONCURRENT_FRAGMENTS").unwrap_or(8).max(1);

        let temp_dir =
            env_path("TEMP_DIR").unwrap_or_else(|| env::temp_dir().join("vidfetch-bot"));
        fs::create_dir_all(&temp_dir)?;
        // Absolute, so paths reported by yt-dlp compare equal to our work dirs.
        let temp_dir = fs::canonicalize(&temp_dir)?;

        Ok(Self {
            telegram_bot_token,
            max_duration_secs,
            max_filesize_bytes,
            ytdlp_path,
            ytdlp_cookies,
            concurrent_fragments,
            temp_dir,
        })
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_duration_secs: self.max_duration_secs,
            max_filesize_bytes: self.max_filesize_bytes,
        }
    }

    pub fn ytdlp(&self) -> YtDlpConfig {
        YtDlpConfig {
            ytdlp_path: self.ytdlp_path.clone(),
            cookies_file: self.ytdlp_cookies.clone(),
            concurrent_fragments: self.concurrent_fragments,
        }
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn which_in_path(binary: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    for dir in env::split_paths(&path) {
        let candidate = dir.join(binary);
        if is_executable_file(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn is_executable_file(p: &Path) -> bool {
    if !p.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(md) = fs::metadata(p) {
            return (md.permissions().mode() & 0o111) != 0;
        }
    }
    true
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
