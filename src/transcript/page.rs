//! Best-effort caption discovery from the rendered watch page.
//!
//! Lowest-confidence layer: scan the page's embedded player response for a
//! caption track URL. Kept deliberately minimal.

use super::{classify_transport, parse_subtitles, CaptionTrack, FailureReason, TranscriptLayer};
use crate::video::VideoRef;
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;
use tracing::debug;

/// Layer C: scrape a caption track URL out of the watch page.
pub struct PageInspectionLayer {
    client: reqwest::Client,
    enabled: bool,
}

impl PageInspectionLayer {
    pub fn new(request_timeout: Duration, enabled: bool) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(super::BROWSER_USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, enabled }
    }

    /// Find the first caption track URL (and language) in the page payload.
    fn find_caption_track(page: &str) -> Option<(String, String)> {
        let track = Regex::new(r#""captionTracks":\[\{"baseUrl":"([^"]+)""#)
            .expect("Invalid regex");
        let language = Regex::new(r#""languageCode":"([^"]+)""#).expect("Invalid regex");

        let url = track.captures(page)?.get(1)?.as_str();
        // The embedded JSON escapes ampersands and slashes
        let url = url.replace("\\u0026", "&").replace("\\/", "/");

        let lang = language
            .captures(page)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Some((url, lang))
    }
}

#[async_trait]
impl TranscriptLayer for PageInspectionLayer {
    fn name(&self) -> &'static str {
        "page-inspection"
    }

    async fn attempt(
        &self,
        video: &VideoRef,
    ) -> std::result::Result<CaptionTrack, FailureReason> {
        if !self.enabled {
            return Err(FailureReason::Disabled);
        }

        let response = self
            .client
            .get(&video.source_url)
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            return Err(FailureReason::TransportError(format!(
                "HTTP {} when fetching watch page",
                response.status()
            )));
        }

        let page = response.text().await.map_err(classify_transport)?;

        let (url, language) = Self::find_caption_track(&page).ok_or_else(|| {
            FailureReason::NotFound("no caption tracks in page payload".into())
        })?;

        debug!("Found embedded caption track ({})", language);

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

        Ok(CaptionTrack { text, language })
    }
}
