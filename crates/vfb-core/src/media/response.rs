use tracing::warn;

use crate::{
    domain::MessageRef,
    formatting::{build_caption, human_duration},
    messaging::{port::MessagingPort, types::VideoUpload},
    Result,
};

use super::{
    candidate::{CandidateError, CandidateStatus, MediaCandidate},
    policy::InvalidReason,
};

const DOWNLOAD_FAILED_TEXT: &str = "Downloading failed! 🙀";
const FILE_TOO_BIG_TEXT: &str = "Video file is too big for Telegram. 😿";

/// What the bot does in reply to one URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    SendVideo(VideoUpload),
    Reply(String),
    React(&'static str),
}

impl Response {
    /// Map a terminal candidate to a reply.
    ///
    /// Driven only by the invalid reason and the presence of a local file.
    pub fn for_candidate(candidate: &MediaCandidate) -> std::result::Result<Self, CandidateError> {
        let reason = match candidate.status() {
            CandidateStatus::Invalid(reason) => reason,
            CandidateStatus::Valid if candidate.has_local_file() => {
                let (height, width) = candidate.dimensions()?;
                return Ok(Response::SendVideo(VideoUpload {
                    path: candidate.local_path()?.to_path_buf(),
                    duration_secs: u32::try_from(candidate.duration()?).unwrap_or(u32::MAX),
                    height,
                    width,
                    caption_html: build_caption(candidate.title()?, candidate.description()?),
                    silent: true,
                }));
            }
            // Admitted, but the transfer produced nothing.
            CandidateStatus::Valid => return Ok(Response::Reply(DOWNLOAD_FAILED_TEXT.to_string())),
            CandidateStatus::Unresolved => {
                return Err(CandidateError::MetadataUnavailable {
                    url: candidate.url().to_string(),
                })
            }
        };

        Ok(match reason {
            InvalidReason::FileTooBig => Response::Reply(FILE_TOO_BIG_TEXT.to_string()),
            InvalidReason::VideoTooLong => Response::Reply(format!(
                "Video is longer than {}. 👺",
                human_duration(candidate.limits().max_duration_secs)
            )),
            InvalidReason::UnsupportedUrl => Response::React("🤷"),
            InvalidReason::DownloadFailed => Response::Reply(DOWNLOAD_FAILED_TEXT.to_string()),
            InvalidReason::Unauthorized => {
                Response::Reply("That site wants a login before it shares this video. 🔒".to_string())
            }
        })
    }

    /// Send this response as a reply to `to`.
    ///
    /// A video over the messenger's upload cap is answered like an oversized
    /// file instead.
    pub async fn deliver(self, messenger: &dyn MessagingPort, to: MessageRef) -> Result<()> {
        match self {
            Response::SendVideo(video) => {
                let len = tokio::fs::metadata(&video.path).await?.len();
                let cap = messenger.capabilities().max_upload_bytes;
                if len > cap {
                    warn!(path = %video.path.display(), len, cap, "video exceeds upload cap");
                    messenger.reply_html(to, FILE_TOO_BIG_TEXT).await?;
                } else {
                    messenger.reply_video(to, video).await?;
                }
            }
            Response::Reply(text) => {
                messenger.reply_html(to, &text).await?;
            }
            Response::React(emoji) => {
                if messenger.capabilities().supports_reactions {
                    messenger.set_reaction(to, emoji).await?;
                } else {
                    messenger.reply_html(to, emoji).await?;
                }
            }
        }
        Ok(())
    }
}
