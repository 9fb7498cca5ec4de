use std::path::PathBuf;

/// Outgoing "chat action" (upload indicator, etc).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    UploadVideo,
}

/// A local video file plus the attributes shown by the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoUpload {
    pub path: PathBuf,
    pub duration_secs: u32,
    pub height: u32,
    pub width: u32,
    /// Already escaped for HTML parse mode.
    pub caption_html: String,
    pub silent: bool,
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_reactions: bool,
    pub supports_chat_actions: bool,
    pub max_upload_bytes: u64,
}
