//! Transcript acquisition pipeline.
//!
//! An ordered chain of extraction strategies, each independently attemptable
//! and individually time-bounded. Layers are ordered by reliability and
//! cost, so the common case resolves on the first layer with no wasted
//! work, while the accumulated diagnostic trail lets callers tell "video
//! has no captions" apart from "extraction broke."

mod page;
mod subtitles;
mod timedtext;
mod ytdlp;

pub use page::PageInspectionLayer;
pub use subtitles::parse_subtitles;
pub use timedtext::TimedTextLayer;
pub use ytdlp::YtdlpCaptionsLayer;

use crate::config::TranscriptSettings;
use crate::video::VideoRef;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Browser-like user agent for endpoints that dislike default clients.
pub(crate) const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";

/// Why a layer failed to produce a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The layer is switched off in configuration.
    Disabled,
    /// The layer ran but found no captions for this video.
    NotFound(String),
    /// The video itself is inaccessible (private, removed, region-locked),
    /// or a tool the layer needs is missing.
    Unavailable(String),
    /// Network failure or timeout.
    TransportError(String),
    /// The layer received a payload it could not make sense of.
    ParseError(String),
}

impl FailureReason {
    /// Stable category name for logs and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            FailureReason::Disabled => "disabled",
            FailureReason::NotFound(_) => "not_found",
            FailureReason::Unavailable(_) => "unavailable",
            FailureReason::TransportError(_) => "transport_error",
            FailureReason::ParseError(_) => "parse_error",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Disabled => write!(f, "disabled in configuration"),
            FailureReason::NotFound(detail)
            | FailureReason::Unavailable(detail)
            | FailureReason::TransportError(detail)
            | FailureReason::ParseError(detail) => write!(f, "{}", detail),
        }
    }
}

/// Classify a reqwest error into a transport failure reason.
pub(crate) fn classify_transport(err: reqwest::Error) -> FailureReason {
    if err.is_timeout() {
        FailureReason::TransportError("request timed out".into())
    } else if err.is_connect() {
        FailureReason::TransportError(format!("connection failed: {}", err))
    } else {
        FailureReason::TransportError(err.to_string())
    }
}

/// One caption track successfully pulled by a layer.
#[derive(Debug, Clone)]
pub struct CaptionTrack {
    /// Plain caption text, timing already discarded.
    pub text: String,
    /// Language code of the track.
    pub language: String,
}

/// Diagnostic record of one failed layer attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptedLayer {
    pub layer: String,
    pub reason: FailureReason,
}

/// Outcome of running the full acquisition chain.
#[derive(Debug, Clone)]
pub enum TranscriptResult {
    /// A layer produced a usable transcript.
    Found {
        text: String,
        language: String,
        source: String,
    },
    /// Every layer was exhausted; the full diagnostic history is retained.
    NotFound { attempted: Vec<AttemptedLayer> },
}

/// One independently attemptable transcript extraction strategy.
#[async_trait]
pub trait TranscriptLayer: Send + Sync {
    /// Short stable name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Try to produce a caption track for the video.
    async fn attempt(&self, video: &VideoRef)
        -> std::result::Result<CaptionTrack, FailureReason>;
}

/// Ordered fallback chain over transcript layers.
pub struct AcquisitionPipeline {
    layers: Vec<Box<dyn TranscriptLayer>>,
    layer_timeout: Duration,
    min_chars: usize,
}

impl AcquisitionPipeline {
    /// Build the default chain from settings: caption tracks, then yt-dlp
    /// auto-captions, then best-effort page inspection.
    pub fn from_settings(settings: &TranscriptSettings) -> Self {
        let request_timeout = Duration::from_secs(settings.request_timeout_seconds);

        let layers: Vec<Box<dyn TranscriptLayer>> = vec![
            Box::new(TimedTextLayer::new(
                settings.languages.clone(),
                request_timeout,
                settings.timedtext_enabled,
            )),
            Box::new(YtdlpCaptionsLayer::new(
                settings.primary_language(),
                request_timeout,
                settings.ytdlp_enabled,
            )),
            Box::new(PageInspectionLayer::new(
                request_timeout,
                settings.page_inspection_enabled,
            )),
        ];

        Self::new(
            layers,
            Duration::from_secs(settings.layer_timeout_seconds),
            settings.min_transcript_chars,
        )
    }

    /// Build a chain from explicit layers.
    pub fn new(
        layers: Vec<Box<dyn TranscriptLayer>>,
        layer_timeout: Duration,
        min_chars: usize,
    ) -> Self {
        Self {
            layers,
            layer_timeout,
            min_chars,
        }
    }

    /// Run layers in priority order, short-circuiting on the first success.
    ///
    /// A layer that times out is recorded as a transport failure and not
    /// retried within this call; retries belong to a future invocation.
    #[instrument(skip(self), fields(video_id = %video.id))]
    pub async fn acquire(&self, video: &VideoRef) -> TranscriptResult {
        let mut attempted = Vec::new();

        for layer in &self.layers {
            debug!("Trying transcript layer: {}", layer.name());

            let reason = match tokio::time::timeout(self.layer_timeout, layer.attempt(video)).await
            {
                Err(_) => FailureReason::TransportError(format!(
                    "layer timed out after {}s",
                    self.layer_timeout.as_secs()
                )),
                Ok(Ok(track)) => {
                    if track.text.trim().chars().count() >= self.min_chars {
                        info!(
                            "Transcript found via {} ({}, {} chars)",
                            layer.name(),
                            track.language,
                            track.text.len()
                        );
                        return TranscriptResult::Found {
                            text: track.text,
                            language: track.language,
                            source: layer.name().to_string(),
                        };
                    }
                    FailureReason::NotFound(format!(
                        "track shorter than {} characters",
                        self.min_chars
                    ))
                }
                Ok(Err(reason)) => reason,
            };

            warn!("Layer {} failed: {}", layer.name(), reason);
            attempted.push(AttemptedLayer {
                layer: layer.name().to_string(),
                reason,
            });
        }

        TranscriptResult::NotFound { attempted }
    }
}
