use crate::backend::types::MediaInfo;

/// Size figure reported by the source, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeEstimate {
    Exact(u64),
    Approximate(u64),
}

impl SizeEstimate {
    pub fn bytes(self) -> u64 {
        match self {
            SizeEstimate::Exact(b) | SizeEstimate::Approximate(b) => b,
        }
    }
}

/// Resolved metadata for a candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaMetadata {
    pub title: String,
    pub description: Option<String>,
    /// Whole seconds, truncated toward zero.
    pub duration_secs: u64,
    pub height: u32,
    pub width: u32,
    pub size: Option<SizeEstimate>,
}

impl From<MediaInfo> for MediaMetadata {
    fn from(info: MediaInfo) -> Self {
        // Float-to-int `as` casts truncate and saturate (NaN -> 0).
        let size = match (info.filesize, info.filesize_approx) {
            (Some(b), _) if b > 0.0 => Some(SizeEstimate::Exact(b as u64)),
            (_, Some(b)) if b > 0.0 => Some(SizeEstimate::Approximate(b as u64)),
            _ => None,
        };

        Self {
            title: info.title,
            description: info.description.filter(|d| !d.trim().is_empty()),
            duration_secs: info.duration.map(|d| d.max(0.0) as u64).unwrap_or(0),
            height: info.height.unwrap_or(0),
            width: info.width.unwrap_or(0),
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(json: &str) -> MediaInfo {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn duration_is_truncated() {
        let m = MediaMetadata::from(info(r#"{"title":"T","duration":133.9}"#));
        assert_eq!(m.duration_secs, 133);
    }

    #[test]
    fn exact_size_wins_over_approximate() {
        let m = MediaMetadata::from(info(
            r#"{"title":"T","filesize":9001,"filesize_approx":12000.5}"#,
        ));
        assert_eq!(m.size, Some(SizeEstimate::Exact(9001)));

        let m = MediaMetadata::from(info(
            r#"{"title":"T","filesize":null,"filesize_approx":12000.5}"#,
        ));
        assert_eq!(m.size, Some(SizeEstimate::Approximate(12000)));
    }

    #[test]
    fn missing_fields_default() {
        let m = MediaMetadata::from(info(r#"{"title":"T","height":null,"extra":[1,2]}"#));
        assert_eq!(m.duration_secs, 0);
        assert_eq!((m.height, m.width), (0, 0));
        assert_eq!(m.size, None);
        assert_eq!(m.description, None);
    }
}
