use std::{sync::Arc, time::Duration};

use teloxide::types::Message;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info};

use vfb_core::{
    domain::{ChatId, MessageId, MessageRef, Sender},
    media::{MediaFetcher, RequestKey, Response},
    messaging::{port::MessagingPort, types::ChatAction},
};

use crate::router::AppState;

/// Telegram shows a chat action for about five seconds.
const CHAT_ACTION_EVERY: Duration = Duration::from_secs(4);

/// Repeats a chat action until dropped.
struct ChatActionLoop(JoinHandle<()>);

impl ChatActionLoop {
    fn start(messenger: Arc<dyn MessagingPort>, chat_id: ChatId, action: ChatAction) -> Self {
        Self(tokio::spawn(async move {
            let mut tick = tokio::time::interval(CHAT_ACTION_EVERY);
            loop {
                tick.tick().await;
                let _ = messenger.send_chat_action(chat_id, action).await;
            }
        }))
    }
}

impl Drop for ChatActionLoop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Process every URL of one message in the background, one task per URL.
pub(super) fn handle_urls(msg: &Message, sender: Sender, urls: Vec<String>, state: Arc<AppState>) {
    let source = MessageRef {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
    };

    for url in &urls {
        info!(
            url = %url,
            user_id = sender.user_id.0,
            user = %sender.display_name,
            chat = %sender.chat_label(),
            "video requested"
        );
    }

    tokio::spawn(async move {
        let _action = state
            .messenger
            .capabilities()
            .supports_chat_actions
            .then(|| {
                ChatActionLoop::start(
                    state.messenger.clone(),
                    source.chat_id,
                    ChatAction::UploadVideo,
                )
            });

        let mut tasks = JoinSet::new();
        for (ordinal, url) in urls.into_iter().enumerate() {
            let fetcher = state.fetcher.clone();
            let messenger = state.messenger.clone();
            tasks.spawn(async move {
                process_url(&fetcher, messenger.as_ref(), source, ordinal, url).await
            });
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "url task panicked");
            }
        }
    });
}

/// Resolve, download, answer, clean up. The artifact is deleted whether or
/// not the answer went out.
async fn process_url(
    fetcher: &MediaFetcher,
    messenger: &dyn MessagingPort,
    source: MessageRef,
    ordinal: usize,
    url: String,
) {
    let mut candidate = fetcher
        .candidate(&url, RequestKey::new(source, ordinal))
        .await;

    if let Some(reason) = candidate.invalid_reason() {
        info!(url = %url, reason = %reason, "rejected");
    } else {
        candidate.download().await;
    }

    let outcome: anyhow::Result<()> = async {
        let response = Response::for_candidate(&candidate)?;
        response.deliver(messenger, source).await?;
        Ok(())
    }
    .await;

    if let Err(e) = outcome {
        error!(url = %url, error = %e, "failed to answer");
    }

    if candidate.has_local_file() {
        candidate.delete().await;
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::PathBuf,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    use async_trait::async_trait;

    use vfb_core::{
        backend::{
            client::MediaBackend,
            types::{FetchRequest, MediaInfo, ProbeError},
        },
        errors::Error,
        media::Limits,
        messaging::types::{MessagingCapabilities, VideoUpload},
        Result,
    };

    use super::*;

    /// Admits everything and writes a small file on fetch.
    struct SmallVideoBackend;

    #[async_trait]
    impl MediaBackend for SmallVideoBackend {
        async fn probe(
            &self,
            _url: &str,
            _max_filesize_bytes: u64,
        ) -> std::result::Result<MediaInfo, ProbeError> {
            Ok(MediaInfo {
                title: "clip".to_string(),
                duration: Some(5.0),
                height: Some(360),
                width: Some(640),
                filesize: Some(4.0),
                ..MediaInfo::default()
            })
        }

        async fn fetch(&self, req: &FetchRequest) -> Result<PathBuf> {
            let path = req.workdir.join("clip.mp4");
            std::fs::write(&path, b"clip")?;
            Ok(path)
        }
    }

    /// Fails every send.
    #[derive(Default)]
    struct BrokenMessenger {
        video_attempts: AtomicUsize,
        seen: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl MessagingPort for BrokenMessenger {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                supports_reactions: false,
                supports_chat_actions: false,
                max_upload_bytes: 50 * 1024 * 1024,
            }
        }

        async fn reply_html(&self, _to: MessageRef, _html: &str) -> Result<MessageRef> {
            Err(Error::External("telegram is down".to_string()))
        }

        async fn reply_video(&self, _to: MessageRef, video: VideoUpload) -> Result<MessageRef> {
            self.video_attempts.fetch_add(1, Ordering::SeqCst);
            assert!(video.path.exists());
            self.seen.lock().unwrap().push(video.path);
            Err(Error::External("telegram is down".to_string()))
        }

        async fn set_reaction(&self, _msg: MessageRef, _emoji: &str) -> Result<()> {
            Err(Error::External("telegram is down".to_string()))
        }

        async fn send_chat_action(&self, _chat_id: ChatId, _action: ChatAction) -> Result<()> {
            Ok(())
        }
    }

    fn tmp_root(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        PathBuf::from(format!("/tmp/{prefix}-{}-{ts}", std::process::id()))
    }

    #[tokio::test]
    async fn failed_send_still_removes_the_download() {
        let root = tmp_root("vfb-url-cleanup");
        std::fs::create_dir_all(&root).unwrap();
        let fetcher = MediaFetcher::new(Arc::new(SmallVideoBackend), Limits::default(), root.clone());
        let messenger = BrokenMessenger::default();
        let source = MessageRef {
            chat_id: ChatId(7),
            message_id: MessageId(70),
        };
        let url = "https://mock.example/clip".to_string();
        let workdir = RequestKey::new(source, 0).workdir(&root, &url);

        process_url(&fetcher, &messenger, source, 0, url).await;

        assert_eq!(messenger.video_attempts.load(Ordering::SeqCst), 1);
        let sent = messenger.seen.lock().unwrap().clone();
        assert_eq!(sent, vec![workdir.join("clip.mp4")]);
        assert!(!sent[0].exists());
        assert!(!workdir.exists());

        let _ = std::fs::remove_dir_all(&root);
    }
}
