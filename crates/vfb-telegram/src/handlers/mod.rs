//! Telegram update handlers.
//!
//! A message is either `/start` or a carrier of URL entities; anything else
//! is ignored.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{Message, MessageEntity, MessageEntityKind},
};

use vfb_core::{
    domain::{Sender, UserId},
    utils::{normalize_url, utf16_slice},
};

use crate::router::AppState;

mod commands;
mod url;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text().or_else(|| msg.caption()) else {
        return Ok(());
    };

    if text.starts_with('/')
        && commands::handle_command(&bot, &msg, text, state.bot_username.as_deref()).await?
    {
        return Ok(());
    }

    let entities = msg
        .entities()
        .or_else(|| msg.caption_entities())
        .unwrap_or(&[]);
    let urls = extract_urls(text, entities);
    if urls.is_empty() {
        return Ok(());
    }

    url::handle_urls(&msg, sender_of(&msg), urls, state);
    Ok(())
}

/// URLs in entity order. `url` entities are sliced out of the text by their
/// UTF-16 offsets; `text_link` entities carry their target.
fn extract_urls(text: &str, entities: &[MessageEntity]) -> Vec<String> {
    entities
        .iter()
        .filter_map(|e| match &e.kind {
            MessageEntityKind::Url => {
                utf16_slice(text, e.offset, e.length).map(|raw| normalize_url(&raw))
            }
            MessageEntityKind::TextLink { url } => Some(url.to_string()),
            _ => None,
        })
        .collect()
}

fn sender_of(msg: &Message) -> Sender {
    let (user_id, display_name) = match msg.from() {
        Some(u) => (
            UserId(u.id.0 as i64),
            u.username
                .as_ref()
                .map(|name| format!("@{name}"))
                .unwrap_or_else(|| u.first_name.clone()),
        ),
        None => (UserId(0), "unknown".to_string()),
    };
    Sender {
        user_id,
        display_name,
        chat_title: msg.chat.title().map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(kind: MessageEntityKind, offset: usize, length: usize) -> MessageEntity {
        MessageEntity {
            kind,
            offset,
            length,
        }
    }

    #[test]
    fn url_entities_use_utf16_offsets() {
        // "🎬" is two UTF-16 units.
        let text = "🎬 youtu.be/abc and https://vimeo.com/1";
        let entities = vec![
            entity(MessageEntityKind::Bold, 0, 2),
            entity(MessageEntityKind::Url, 3, 12),
            entity(MessageEntityKind::Url, 20, 19),
        ];
        assert_eq!(
            extract_urls(text, &entities),
            vec![
                "https://youtu.be/abc".to_string(),
                "https://vimeo.com/1".to_string()
            ]
        );
    }

    #[test]
    fn text_links_carry_their_target() {
        let target = reqwest::Url::parse("https://example.com/watch?v=1").unwrap();
        let entities = vec![entity(MessageEntityKind::TextLink { url: target }, 0, 4)];
        assert_eq!(
            extract_urls("this", &entities),
            vec!["https://example.com/watch?v=1".to_string()]
        );
    }

    #[test]
    fn out_of_range_entities_are_skipped() {
        let entities = vec![entity(MessageEntityKind::Url, 10, 30)];
        assert!(extract_urls("short", &entities).is_empty());
    }
}
