//! Layered video metadata resolution.
//!
//! Metadata comes from progressively less reliable sources: a structured
//! yt-dlp lookup, then a watch-page scrape, then synthesis from the bare
//! identifier. The resolver never fails; every request gets a record, with
//! `source` recording which layer produced it.

mod page;
mod ytdlp;

pub use page::PageMetadataLayer;
pub use ytdlp::YtdlpMetadataLayer;

use crate::config::MetadataSettings;
use crate::error::Result;
use crate::video::VideoRef;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Sentinel for fields no resolution layer could fill.
pub const UNKNOWN: &str = "Unknown";

/// Sentinel description when none could be retrieved.
pub const NO_DESCRIPTION: &str = "No description available";

/// Which resolution layer produced a metadata record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    Primary,
    Secondary,
    Fallback,
}

impl std::fmt::Display for MetadataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataSource::Primary => write!(f, "primary"),
            MetadataSource::Secondary => write!(f, "secondary"),
            MetadataSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// What we know about a video.
///
/// Partial data is valid: fields no layer could fill carry an explicit
/// sentinel rather than an absent value, so they can flow into prompt text
/// without null checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    pub author: String,
    pub duration_label: String,
    pub views_label: String,
    pub published_label: String,
    pub description: String,
    pub source: MetadataSource,
}

impl VideoMetadata {
    /// Synthesize a record from nothing but the identifier.
    pub fn fallback(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            title: format!("YouTube Video (ID: {})", video_id),
            author: UNKNOWN.to_string(),
            duration_label: UNKNOWN.to_string(),
            views_label: UNKNOWN.to_string(),
            published_label: UNKNOWN.to_string(),
            description: NO_DESCRIPTION.to_string(),
            source: MetadataSource::Fallback,
        }
    }

    /// True when some layer recovered an actual title.
    pub fn has_real_title(&self) -> bool {
        !self.title.starts_with("YouTube Video (ID:")
    }

    /// True when a non-sentinel description is present.
    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty() && self.description != NO_DESCRIPTION
    }
}

/// One independently attemptable metadata lookup.
#[async_trait]
pub trait MetadataLayer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn lookup(&self, video: &VideoRef) -> Result<VideoMetadata>;
}

/// Sequential fallback over metadata layers.
///
/// Layers are tried in priority order, short-circuiting on the first one
/// that recovers a real title; later layers are more expensive and less
/// trustworthy, so there is no parallel racing.
pub struct MetadataResolver {
    layers: Vec<Box<dyn MetadataLayer>>,
    layer_timeout: Duration,
}

impl MetadataResolver {
    /// Build the default two-layer resolver from settings.
    pub fn from_settings(settings: &MetadataSettings) -> Self {
        let request_timeout = Duration::from_secs(settings.request_timeout_seconds);
        let layers: Vec<Box<dyn MetadataLayer>> = vec![
            Box::new(YtdlpMetadataLayer::new()),
            Box::new(PageMetadataLayer::new(request_timeout)),
        ];

        Self::new(layers, Duration::from_secs(settings.layer_timeout_seconds))
    }

    /// Build a resolver from explicit layers.
    pub fn new(layers: Vec<Box<dyn MetadataLayer>>, layer_timeout: Duration) -> Self {
        Self {
            layers,
            layer_timeout,
        }
    }

    /// Resolve metadata. Always returns a record; when every layer fails
    /// the record is synthesized from the identifier alone.
    #[instrument(skip(self), fields(video_id = %video.id))]
    pub async fn resolve(&self, video: &VideoRef) -> VideoMetadata {
        for layer in &self.layers {
            match tokio::time::timeout(self.layer_timeout, layer.lookup(video)).await {
                Ok(Ok(meta)) if meta.has_real_title() => {
                    info!("Metadata resolved via {} layer", layer.name());
                    return meta;
                }
                Ok(Ok(_)) => debug!("{} layer returned no usable title", layer.name()),
                Ok(Err(e)) => warn!("{} metadata layer failed: {}", layer.name(), e),
                Err(_) => warn!(
                    "{} metadata layer timed out after {}s",
                    layer.name(),
                    self.layer_timeout.as_secs()
                ),
            }
        }

        warn!("All metadata layers failed, synthesizing from the video ID");
        VideoMetadata::fallback(&video.id)
    }
}

/// Format a duration in seconds as MM:SS or HH:MM:SS.
pub(crate) fn format_duration_label(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Format a view count with thousands separators.
pub(crate) fn format_views_label(views: u64) -> String {
    let digits: Vec<char> = views.to_string().chars().rev().collect();
    let mut out = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(*c);
    }
    format!("{} views", out.chars().rev().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OppsumError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubMetadataLayer {
        name: &'static str,
        outcome: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl StubMetadataLayer {
        fn new(
            name: &'static str,
            outcome: Option<&'static str>,
        ) -> (Box<dyn MetadataLayer>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Box::new(Self {
                    name,
                    outcome,
                    calls: calls.clone(),
                }),
                calls,
            )
        }
    }

    #[async_trait]
    impl MetadataLayer for StubMetadataLayer {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn lookup(&self, video: &VideoRef) -> Result<VideoMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Some(title) => Ok(VideoMetadata {
                    title: title.to_string(),
                    ..VideoMetadata::fallback(&video.id)
                }),
                None => Err(OppsumError::Metadata("lookup failed".into())),
            }
        }
    }

    #[tokio::test]
    async fn test_primary_success_short_circuits() {
        let (a, a_calls) = StubMetadataLayer::new("a", Some("Real Title"));
        let (b, b_calls) = StubMetadataLayer::new("b", Some("Other Title"));

        let resolver = MetadataResolver::new(vec![a, b], Duration::from_secs(5));
        let meta = resolver.resolve(&VideoRef::new("dQw4w9WgXcQ")).await;

        assert_eq!(meta.title, "Real Title");
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_falls_through() {
        let (a, _) = StubMetadataLayer::new("a", None);
        let (b, b_calls) = StubMetadataLayer::new("b", Some("Scraped Title"));

        let resolver = MetadataResolver::new(vec![a, b], Duration::from_secs(5));
        let meta = resolver.resolve(&VideoRef::new("dQw4w9WgXcQ")).await;

        assert_eq!(meta.title, "Scraped Title");
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_layers_fail_yields_synthesized_record() {
        let (a, _) = StubMetadataLayer::new("a", None);
        let (b, _) = StubMetadataLayer::new("b", None);

        let resolver = MetadataResolver::new(vec![a, b], Duration::from_secs(5));
        let meta = resolver.resolve(&VideoRef::new("dQw4w9WgXcQ")).await;

        assert_eq!(meta.source, MetadataSource::Fallback);
        assert_eq!(meta.title, "YouTube Video (ID: dQw4w9WgXcQ)");
        assert!(!meta.has_real_title());
        assert_eq!(meta.author, UNKNOWN);
    }

    #[test]
    fn test_fallback_record_uses_sentinels() {
        let meta = VideoMetadata::fallback("abc123def45");
        assert_eq!(meta.duration_label, UNKNOWN);
        assert_eq!(meta.views_label, UNKNOWN);
        assert_eq!(meta.description, NO_DESCRIPTION);
        assert!(!meta.has_description());
    }

    #[test]
    fn test_format_duration_label() {
        assert_eq!(format_duration_label(59), "0:59");
        assert_eq!(format_duration_label(61), "1:01");
        assert_eq!(format_duration_label(3725), "1:02:05");
    }

    #[test]
    fn test_format_views_label() {
        assert_eq!(format_views_label(999), "999 views");
        assert_eq!(format_views_label(1234567), "1,234,567 views");
    }
}
