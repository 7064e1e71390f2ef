//! Video identifier parsing.

use crate::error::{OppsumError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Immutable reference to a single video, created once per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
    /// The 11-character video ID.
    pub id: String,
    /// Canonical watch URL for the video.
    pub source_url: String,
}

impl VideoRef {
    /// Create a reference from a known video ID.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let source_url = format!("https://www.youtube.com/watch?v={}", id);
        Self { id, source_url }
    }

    /// Parse a YouTube URL or bare video ID.
    pub fn parse(input: &str) -> Result<Self> {
        extract_video_id(input).map(Self::new).ok_or_else(|| {
            OppsumError::InvalidInput(format!("Could not extract a video ID from: {}", input))
        })
    }
}

impl std::fmt::Display for VideoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Extract a video ID from the common YouTube URL shapes or a bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    // Matches watch/short/embed URLs and bare 11-character IDs
    let re = Regex::new(
        r"(?x)
        (?:
            (?:https?://)?
            (?:www\.)?
            (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/|youtube\.com/v/)
            ([a-zA-Z0-9_-]{11})
        )
        |
        ^([a-zA-Z0-9_-]{11})$
    ",
    )
    .expect("Invalid regex");

    let caps = re.captures(input.trim())?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}
