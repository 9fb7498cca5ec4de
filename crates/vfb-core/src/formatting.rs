//! Formatting utilities (Telegram HTML, captions, reply text).

use std::sync::OnceLock;

use regex::Regex;

/// Captions longer than this many words are cut and suffixed with ` ...`.
const CAPTION_MAX_WORDS: usize = 8;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn hashtag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\w+\s*").expect("valid regex"))
}

/// Build the spoiler caption sent with a video.
///
/// Uses the description when there is one, otherwise the title; keeps the
/// first non-blank line, drops hashtags and caps the word count.
pub fn build_caption(title: &str, description: Option<&str>) -> String {
    let source = description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(title);

    let line = source
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");

    let stripped = hashtag_re().replace_all(line, "");
    let words = stripped.split_whitespace().collect::<Vec<_>>();
    let mut caption = words
        .iter()
        .take(CAPTION_MAX_WORDS)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if words.len() > CAPTION_MAX_WORDS {
        caption.push_str(" ...");
    }

    format!("<tg-spoiler>{}</tg-spoiler>", escape_html(&caption))
}

/// "10 minutes", "1 minute", "90 seconds".
pub fn human_duration(secs: u64) -> String {
    match (secs / 60, secs % 60) {
        (1, 0) => "1 minute".to_string(),
        (m, 0) if m > 0 => format!("{m} minutes"),
        _ if secs == 1 => "1 second".to_string(),
        _ => format!("{secs} seconds"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_prefers_description() {
        assert_eq!(
            build_caption("Mock Title", Some("A short mock description")),
            "<tg-spoiler>A short mock description</tg-spoiler>"
        );
    }

    #[test]
    fn caption_falls_back_to_title() {
        assert_eq!(
            build_caption("Mock Title", None),
            "<tg-spoiler>Mock Title</tg-spoiler>"
        );
        assert_eq!(
            build_caption("Mock Title", Some("  \n")),
            "<tg-spoiler>Mock Title</tg-spoiler>"
        );
    }

    #[test]
    fn caption_strips_hashtags() {
        assert_eq!(
            build_caption(
                "t",
                Some("A description with multiple hashtags #test #unittest #python #telegram")
            ),
            "<tg-spoiler>A description with multiple hashtags</tg-spoiler>"
        );
    }

    #[test]
    fn caption_keeps_first_line_and_limits_words() {
        assert_eq!(
            build_caption("t", Some("\none two three four five six seven eight nine\nsecond")),
            "<tg-spoiler>one two three four five six seven eight ...</tg-spoiler>"
        );
    }

    #[test]
    fn caption_is_escaped() {
        assert_eq!(
            build_caption("<b>&</b>", None),
            "<tg-spoiler>&lt;b&gt;&amp;&lt;/b&gt;</tg-spoiler>"
        );
    }

    #[test]
    fn durations_read_naturally() {
        assert_eq!(human_duration(600), "10 minutes");
        assert_eq!(human_duration(60), "1 minute");
        assert_eq!(human_duration(90), "90 seconds");
        assert_eq!(human_duration(1), "1 second");
    }
}
