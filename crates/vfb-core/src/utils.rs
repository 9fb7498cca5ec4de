// ============== Entity Extraction ==============

/// Slice `text` by a Telegram entity range.
///
/// Telegram reports entity offsets and lengths in UTF-16 code units, so a
/// byte or char slice is wrong as soon as the text contains emoji.
pub fn utf16_slice(text: &str, offset: usize, length: usize) -> Option<String> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let end = offset.checked_add(length)?;
    if length == 0 || end > units.len() {
        return None;
    }
    String::from_utf16(&units[offset..end]).ok()
}

/// Telegram tags bare domains (`youtu.be/x`) as URLs too; give them a scheme.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

// ============== Text Helpers ==============

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_ascii() {
        let text = "look https://example.com/v now";
        assert_eq!(
            utf16_slice(text, 5, 21).as_deref(),
            Some("https://example.com/v")
        );
    }

    #[test]
    fn slice_counts_utf16_units() {
        // "😀" is two UTF-16 units but four bytes.
        let text = "😀 https://a.b/c";
        assert_eq!(utf16_slice(text, 3, 13).as_deref(), Some("https://a.b/c"));
    }

    #[test]
    fn slice_out_of_range() {
        assert_eq!(utf16_slice("abc", 2, 5), None);
        assert_eq!(utf16_slice("abc", 0, 0), None);
        assert_eq!(utf16_slice("abc", usize::MAX, 1), None);
    }

    #[test]
    fn bare_domains_get_a_scheme() {
        assert_eq!(normalize_url("youtu.be/x"), "https://youtu.be/x");
        assert_eq!(normalize_url("HTTP://a.b"), "HTTP://a.b");
    }

    #[test]
    fn truncate_text_adds_ellipsis() {
        let t = truncate_text(&"a".repeat(20), 10);
        assert_eq!(t, format!("{}...", "a".repeat(10)));
        assert_eq!(truncate_text("short", 10), "short");
    }
}
