use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::domain::MessageRef;

/// Identifies one URL occurrence within one incoming message.
///
/// The ordinal distinguishes repeated URLs in the same message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub message: MessageRef,
    pub ordinal: usize,
}

impl RequestKey {
    pub fn new(message: MessageRef, ordinal: usize) -> Self {
        Self { message, ordinal }
    }

    /// Per-candidate work directory under `root`.
    pub fn workdir(&self, root: &Path, url: &str) -> PathBuf {
        root.join(self.digest(url))
    }

    fn digest(&self, url: &str) -> String {
        let mut h = Sha256::new();
        h.update(url.as_bytes());
        h.update([0u8]);
        h.update(self.message.chat_id.0.to_le_bytes());
        h.update(self.message.message_id.0.to_le_bytes());
        h.update((self.ordinal as u64).to_le_bytes());

        // 128 bits is plenty for a process-local namespace.
        h.finalize()[..16]
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, MessageId};

    fn msg(chat: i64, id: i32) -> MessageRef {
        MessageRef {
            chat_id: ChatId(chat),
            message_id: MessageId(id),
        }
    }

    #[test]
    fn workdir_is_deterministic() {
        let root = Path::new("/tmp/vfb");
        let k = RequestKey::new(msg(1, 2), 0);
        assert_eq!(k.workdir(root, "https://a"), k.workdir(root, "https://a"));
        assert!(k.workdir(root, "https://a").starts_with(root));
    }

    #[test]
    fn workdir_separates_urls_messages_and_ordinals() {
        let root = Path::new("/tmp/vfb");
        let url = "https://example.com/v";
        let dirs = [
            RequestKey::new(msg(1, 2), 0).workdir(root, url),
            RequestKey::new(msg(1, 2), 1).workdir(root, url),
            RequestKey::new(msg(1, 3), 0).workdir(root, url),
            RequestKey::new(msg(9, 2), 0).workdir(root, url),
            RequestKey::new(msg(1, 2), 0).workdir(root, "https://example.com/w"),
        ];
        for (i, a) in dirs.iter().enumerate() {
            for b in &dirs[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
