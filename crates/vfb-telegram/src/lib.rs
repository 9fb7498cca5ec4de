//! Telegram adapter (teloxide).
//!
//! This crate implements the `vfb-core` MessagingPort over Telegram Bot API
//! and routes incoming messages into the media pipeline.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InputFile, ParseMode},
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use vfb_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ChatAction, MessagingCapabilities, VideoUpload},
    },
    utils::truncate_text,
    Result,
};

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Bot API cap for uploads made by bots.
const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
    token: String,
    http: reqwest::Client,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, token: impl Into<String>) -> Self {
        Self {
            bot,
            token: token.into(),
            http: reqwest::Client::new(),
        }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_reactions: true,
            supports_chat_actions: true,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    async fn reply_html(&self, to: MessageRef, html: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(to.chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
                    .reply_to_message_id(Self::tg_msg_id(to.message_id))
                    .allow_sending_without_reply(true)
            })
            .await?;

        Ok(MessageRef {
            chat_id: to.chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn reply_video(&self, to: MessageRef, video: VideoUpload) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_video(
                        Self::tg_chat(to.chat_id),
                        InputFile::file(video.path.clone()),
                    )
                    .duration(video.duration_secs)
                    .height(video.height)
                    .width(video.width)
                    .caption(video.caption_html.clone())
                    .parse_mode(ParseMode::Html)
                    .supports_streaming(true)
                    .disable_notification(video.silent)
                    .reply_to_message_id(Self::tg_msg_id(to.message_id))
                    .allow_sending_without_reply(true)
            })
            .await?;

        Ok(MessageRef {
            chat_id: to.chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn set_reaction(&self, msg: MessageRef, emoji: &str) -> Result<()> {
        // teloxide 0.12 predates message reactions; call the Bot API directly.
        let body = serde_json::json!({
            "chat_id": msg.chat_id.0,
            "message_id": msg.message_id.0,
            "reaction": [{"type": "emoji", "emoji": emoji}],
        });

        let resp = self
            .http
            .post(format!("{TELEGRAM_API}/bot{}/setMessageReaction", self.token))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::External(format!("telegram reaction request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "telegram reaction failed: {status} {}",
                truncate_text(&body, 200)
            )));
        }
        Ok(())
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()> {
        let tg_action = match action {
            ChatAction::UploadVideo => teloxide::types::ChatAction::UploadVideo,
        };
        self.with_retry(|| self.bot.send_chat_action(Self::tg_chat(chat_id), tg_action))
            .await?;
        Ok(())
    }
}
