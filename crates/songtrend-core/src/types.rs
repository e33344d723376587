use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Remote platform selector used when listing songs and building fetch URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Tiktok,
    Both,
}

#[derive(Debug, Error)]
#[error("unknown platform \"{0}\" (expected youtube, tiktok, or both)")]
pub struct PlatformParseError(String);

impl std::str::FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "youtube" => Ok(Platform::Youtube),
            "tiktok" => Ok(Platform::Tiktok),
            "both" => Ok(Platform::Both),
            _ => Err(PlatformParseError(s.to_owned())),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Youtube => write!(f, "youtube"),
            Platform::Tiktok => write!(f, "tiktok"),
            Platform::Both => write!(f, "both"),
        }
    }
}

/// Input to song identity resolution. `(title, artist)` is the natural key;
/// everything else is optional context captured on first observation.
#[derive(Debug, Clone, Default)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub thumbnail_url: Option<String>,
    pub youtube_id: Option<String>,
    pub tiktok_id: Option<String>,
    /// `None` normalizes to `false` on insert — approval is stored as a plain
    /// boolean, never as three-valued unknown.
    pub is_approved: Option<bool>,
}

impl NewSong {
    #[must_use]
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!(Platform::from_str("TikTok").unwrap(), Platform::Tiktok);
        assert_eq!(Platform::from_str("YOUTUBE").unwrap(), Platform::Youtube);
        assert_eq!(Platform::from_str("both").unwrap(), Platform::Both);
        assert!(Platform::from_str("instagram").is_err());
    }

    #[test]
    fn platform_display_round_trips() {
        for p in [Platform::Youtube, Platform::Tiktok, Platform::Both] {
            assert_eq!(Platform::from_str(&p.to_string()).unwrap(), p);
        }
    }
}
