//! Caption track retrieval from the timedtext endpoint.
//!
//! The most reliable and cheapest layer: an official caption protocol that
//! serves published tracks as timedtext XML, queried across an ordered list
//! of language-code candidates.

use super::{classify_transport, parse_subtitles, CaptionTrack, FailureReason, TranscriptLayer};
use crate::video::VideoRef;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Layer A: official caption tracks across language candidates.
pub struct TimedTextLayer {
    client: reqwest::Client,
    languages: Vec<String>,
    enabled: bool,
}

impl TimedTextLayer {
    pub fn new(languages: Vec<String>, request_timeout: Duration, enabled: bool) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(super::BROWSER_USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            languages,
            enabled,
        }
    }

    /// Fetch one language's track. `Ok(None)` means the endpoint answered
    /// but has no track for that language.
    async fn fetch_track(
        &self,
        video_id: &str,
        language: &str,
    ) -> std::result::Result<Option<String>, FailureReason> {
        let url = format!(
            "https://video.google.com/timedtext?lang={}&v={}",
            language, video_id
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            return Err(FailureReason::TransportError(format!(
                "HTTP {} from caption endpoint",
                response.status()
            )));
        }

        let body = response.text().await.map_err(classify_transport)?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        match parse_subtitles(&body) {
            Ok(text) => Ok(Some(text)),
            // An answered-but-empty track is a miss, not a parse failure
            Err(_) => Ok(None),
        }
    }
}

#[async_trait]
impl TranscriptLayer for TimedTextLayer {
    fn name(&self) -> &'static str {
        "timedtext"
    }

    async fn attempt(
        &self,
        video: &VideoRef,
    ) -> std::result::Result<CaptionTrack, FailureReason> {
        if !self.enabled {
            return Err(FailureReason::Disabled);
        }

        let mut transport_failure: Option<FailureReason> = None;

        for language in &self.languages {
            debug!("Requesting caption track for language {}", language);
            match self.fetch_track(&video.id, language).await {
                Ok(Some(text)) => {
                    return Ok(CaptionTrack {
                        text,
                        language: language.clone(),
                    });
                }
                Ok(None) => continue,
                // Remember the transport failure but keep trying the
                // remaining language candidates.
                Err(reason @ FailureReason::TransportError(_)) => {
                    transport_failure = Some(reason);
                }
                Err(reason) => return Err(reason),
            }
        }

        Err(transport_failure.unwrap_or_else(|| {
            FailureReason::NotFound(format!(
                "no caption track in any of: {}",
                self.languages.join(", ")
            ))
        }))
    }
}
