use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use vfb_core::{config::Config, media::MediaFetcher, messaging::port::MessagingPort};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    /// Our own username, for `/cmd@username` addressing in groups.
    pub bot_username: Option<String>,
    pub fetcher: Arc<MediaFetcher>,
    pub messenger: Arc<dyn MessagingPort>,
}

pub async fn run_polling(cfg: Arc<Config>, fetcher: Arc<MediaFetcher>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let bot_username = match bot.get_me().await {
        Ok(me) => {
            info!(username = %me.username(), "bot started");
            me.user.username.clone()
        }
        Err(e) => {
            warn!(error = %e, "getMe failed; continuing");
            None
        }
    };
    info!(
        temp_dir = %cfg.temp_dir.display(),
        max_duration_secs = cfg.max_duration_secs,
        max_filesize_bytes = cfg.max_filesize_bytes,
        "limits"
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(
        bot.clone(),
        cfg.telegram_bot_token.clone(),
    ));

    let state = Arc::new(AppState {
        bot_username,
        fetcher,
        messenger,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
