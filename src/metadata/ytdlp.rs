//! Structured metadata lookup via yt-dlp.

use super::{
    format_duration_label, format_views_label, MetadataLayer, MetadataSource, VideoMetadata,
    NO_DESCRIPTION, UNKNOWN,
};
use crate::error::{OppsumError, Result};
use crate::video::VideoRef;
use async_trait::async_trait;
use tokio::process::Command;

/// Descriptions beyond this are cut to keep prompts bounded.
const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Primary metadata layer: yt-dlp's structured JSON dump.
pub struct YtdlpMetadataLayer;

impl YtdlpMetadataLayer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for YtdlpMetadataLayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataLayer for YtdlpMetadataLayer {
    fn name(&self) -> &'static str {
        "ytdlp"
    }

    async fn lookup(&self, video: &VideoRef) -> Result<VideoMetadata> {
        let output = Command::new("yt-dlp")
            .args([
                "--dump-json",
                "--no-download",
                "--no-warnings",
                &video.source_url,
            ])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OppsumError::ToolNotFound("yt-dlp".to_string())
                } else {
                    OppsumError::Metadata(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OppsumError::Metadata(format!(
                "yt-dlp could not fetch {}: {}",
                video.id,
                stderr.lines().next().unwrap_or("unknown error")
            )));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| OppsumError::Metadata(format!("Failed to parse yt-dlp output: {}", e)))?;

        let title = json["title"]
            .as_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("YouTube Video (ID: {})", video.id));

        let author = json["channel"]
            .as_str()
            .or_else(|| json["uploader"].as_str())
            .unwrap_or(UNKNOWN)
            .to_string();

        let duration_label = json["duration"]
            .as_f64()
            .map(|d| format_duration_label(d as u64))
            .unwrap_or_else(|| UNKNOWN.to_string());

        let views_label = json["view_count"]
            .as_u64()
            .map(format_views_label)
            .unwrap_or_else(|| UNKNOWN.to_string());

        // yt-dlp returns the upload date as YYYYMMDD
        let published_label = json["upload_date"]
            .as_str()
            .and_then(|date_str| {
                chrono::NaiveDate::parse_from_str(date_str, "%Y%m%d")
                    .ok()
                    .map(|d| d.format("%Y-%m-%d").to_string())
            })
            .unwrap_or_else(|| UNKNOWN.to_string());

        let description = json["description"]
            .as_str()
            .map(truncate_description)
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());

        Ok(VideoMetadata {
            video_id: video.id.clone(),
            title,
            author,
            duration_label,
            views_label,
            published_label,
            description,
            source: MetadataSource::Primary,
        })
    }
}

fn truncate_description(description: &str) -> String {
    let description = description.trim();
    if description.is_empty() {
        return NO_DESCRIPTION.to_string();
    }

    match description.char_indices().nth(MAX_DESCRIPTION_CHARS) {
        Some((cut, _)) => format!("{}...", &description[..cut]),
        None => description.to_string(),
    }
}
