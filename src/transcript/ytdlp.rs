//! Auto-generated caption extraction via yt-dlp.
//!
//! Second layer: ask yt-dlp for the video's metadata dump, follow the
//! subtitle URL it reports, and flatten the payload to plain text.

use super::{classify_transport, parse_subtitles, CaptionTrack, FailureReason, TranscriptLayer};
use crate::video::VideoRef;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Subtitle formats we can parse, in preference order.
const PREFERRED_FORMATS: [&str; 3] = ["vtt", "json3", "srv3"];

/// Layer B: yt-dlp metadata dump, following the caption URL it reports.
pub struct YtdlpCaptionsLayer {
    client: reqwest::Client,
    language: String,
    enabled: bool,
}

impl YtdlpCaptionsLayer {
    pub fn new(language: String, request_timeout: Duration, enabled: bool) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(super::BROWSER_USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            language,
            enabled,
        }
    }

    async fn dump_info(
        &self,
        video: &VideoRef,
    ) -> std::result::Result<serde_json::Value, FailureReason> {
        let result = Command::new("yt-dlp")
            .arg("--dump-json")
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg("--write-auto-subs")
            .arg("--sub-lang")
            .arg(&self.language)
            .arg(&video.source_url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FailureReason::Unavailable("yt-dlp is not installed".into()));
            }
            Err(e) => {
                return Err(FailureReason::TransportError(format!(
                    "failed to run yt-dlp: {}",
                    e
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let first_line = stderr.lines().next().unwrap_or("unknown error");
            if stderr.contains("Video unavailable") || stderr.contains("Private video") {
                return Err(FailureReason::Unavailable(first_line.to_string()));
            }
            return Err(FailureReason::NotFound(format!(
                "yt-dlp failed: {}",
                first_line
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| FailureReason::ParseError(format!("invalid yt-dlp JSON: {}", e)))
    }

    /// Pick a subtitle URL from the dump, preferring manual tracks over
    /// auto-generated ones, and parseable formats over the rest.
    fn select_track_url(&self, info: &serde_json::Value) -> Option<String> {
        for key in ["subtitles", "automatic_captions"] {
            let Some(tracks) = info[key][&self.language].as_array() else {
                continue;
            };

            for format in PREFERRED_FORMATS {
                if let Some(url) = tracks
                    .iter()
                    .find(|t| t["ext"].as_str() == Some(format))
                    .and_then(|t| t["url"].as_str())
                {
                    return Some(url.to_string());
                }
            }

            // No known format; take whatever is first and hope it parses
            if let Some(url) = tracks.first().and_then(|t| t["url"].as_str()) {
                return Some(url.to_string());
            }
        }

        None
    }
}

#[async_trait]
impl TranscriptLayer for YtdlpCaptionsLayer {
    fn name(&self) -> &'static str {
        "ytdlp-auto-captions"
    }

    async fn attempt(
        &self,
        video: &VideoRef,
    ) -> std::result::Result<CaptionTrack, FailureReason> {
        if !self.enabled {
            return Err(FailureReason::Disabled);
        }

        let info = self.dump_info(video).await?;

        let url = self.select_track_url(&info).ok_or_else(|| {
            FailureReason::NotFound(format!(
                "yt-dlp reports no captions for language {}",
                self.language
            ))
        })?;

        debug!("Downloading subtitle payload");
        let payload = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(classify_transport)?
            .text()
            .await
            .map_err(classify_transport)?;

        let text = parse_subtitles(&payload)
            .map_err(|e| FailureReason::ParseError(e.to_string()))?;

        Ok(CaptionTrack {
            text,
            language: self.language.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> YtdlpCaptionsLayer {
        YtdlpCaptionsLayer::new("en".to_string(), Duration::from_secs(10), true)
    }

    #[test]
    fn test_select_prefers_manual_subtitles() {
        let info = serde_json::json!({
            "subtitles": {
                "en": [{"ext": "vtt", "url": "https://example.com/manual.vtt"}]
            },
            "automatic_captions": {
                "en": [{"ext": "vtt", "url": "https://example.com/auto.vtt"}]
            }
        });
        assert_eq!(
            layer().select_track_url(&info),
            Some("https://example.com/manual.vtt".to_string())
        );
    }

    #[test]
    fn test_select_prefers_parseable_format() {
        let info = serde_json::json!({
            "automatic_captions": {
                "en": [
                    {"ext": "ttml", "url": "https://example.com/a.ttml"},
                    {"ext": "json3", "url": "https://example.com/a.json3"}
                ]
            }
        });
        assert_eq!(
            layer().select_track_url(&info),
            Some("https://example.com/a.json3".to_string())
        );
    }

    #[test]
    fn test_select_none_when_language_missing() {
        let info = serde_json::json!({
            "automatic_captions": {
                "de": [{"ext": "vtt", "url": "https://example.com/de.vtt"}]
            }
        });
        assert_eq!(layer().select_track_url(&info), None);
    }
}
