use std::sync::Arc;

use tracing::{info, warn};

use vfb_core::{config::Config, media::MediaFetcher};
use vfb_ytdlp::YtDlpClient;

#[tokio::main]
async fn main() -> Result<(), vfb_core::Error> {
    vfb_core::logging::init("vfb")?;

    let cfg = Arc::new(Config::load()?);

    let ytdlp = YtDlpClient::new(cfg.ytdlp());
    match ytdlp.version().await {
        Ok(version) => info!(%version, path = %cfg.ytdlp_path.display(), "yt-dlp found"),
        Err(e) => warn!(error = %e, "yt-dlp version check failed"),
    }

    let fetcher = Arc::new(MediaFetcher::new(
        Arc::new(ytdlp),
        cfg.limits(),
        cfg.temp_dir.clone(),
    ));

    vfb_telegram::router::run_polling(cfg, fetcher)
        .await
        .map_err(|e| vfb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
