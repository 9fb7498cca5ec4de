use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{ChatAction, MessagingCapabilities, VideoUpload},
    Result,
};

/// Messenger port. Every send is a reply to the message that carried the URL.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn reply_html(&self, to: MessageRef, html: &str) -> Result<MessageRef>;
    async fn reply_video(&self, to: MessageRef, video: VideoUpload) -> Result<MessageRef>;

    async fn set_reaction(&self, msg: MessageRef, emoji: &str) -> Result<()>;

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()>;
}
