//! Watch-page metadata scraping.
//!
//! Secondary layer: pull what we can out of the rendered page HTML. Lower
//! confidence than the structured lookup, but it works without yt-dlp.

use super::{MetadataLayer, MetadataSource, VideoMetadata, NO_DESCRIPTION, UNKNOWN};
use crate::error::{OppsumError, Result};
use crate::text::decode_entities;
use crate::video::VideoRef;
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;

/// Secondary metadata layer: scrape the watch page.
pub struct PageMetadataLayer {
    client: reqwest::Client,
}

impl PageMetadataLayer {
    pub fn new(request_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(crate::transcript::BROWSER_USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    fn extract_title(page: &str) -> Option<String> {
        let patterns = [
            r#"property="og:title" content="([^"]+)""#,
            r#"name="title" content="([^"]+)""#,
            r"<title>([^<]+)</title>",
            r#""title":"([^"]+)""#,
        ];

        for pattern in patterns {
            let re = Regex::new(pattern).expect("Invalid regex");
            if let Some(caps) = re.captures(page) {
                let raw = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                let title = decode_entities(raw.replace(" - YouTube", "").trim());
                if !title.is_empty() && title != "YouTube" && !title.starts_with("YouTube") {
                    return Some(title);
                }
            }
        }

        None
    }

    fn extract_author(page: &str) -> String {
        let patterns = [
            r#""author":"([^"]+)""#,
            r#"name="author" content="([^"]+)""#,
            r#""ownerChannelName":"([^"]+)""#,
        ];

        for pattern in patterns {
            let re = Regex::new(pattern).expect("Invalid regex");
            if let Some(caps) = re.captures(page) {
                let author = decode_entities(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
                if author.trim().len() > 1 && author != "YouTube" {
                    return author;
                }
            }
        }

        UNKNOWN.to_string()
    }

    fn extract_description(page: &str) -> String {
        let patterns = [
            r#"property="og:description" content="([^"]+)""#,
            r#"name="description" content="([^"]+)""#,
            r#""shortDescription":"([^"]+)""#,
        ];

        for pattern in patterns {
            let re = Regex::new(pattern).expect("Invalid regex");
            if let Some(caps) = re.captures(page) {
                let description =
                    decode_entities(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
                // A description this short carries no signal
                if description.trim().len() > 10 {
                    return description;
                }
            }
        }

        NO_DESCRIPTION.to_string()
    }
}

#[async_trait]
impl MetadataLayer for PageMetadataLayer {
    fn name(&self) -> &'static str {
        "page-scrape"
    }

    async fn lookup(&self, video: &VideoRef) -> Result<VideoMetadata> {
        let response = self.client.get(&video.source_url).send().await?;

        if !response.status().is_success() {
            return Err(OppsumError::Metadata(format!(
                "HTTP {} when fetching watch page",
                response.status()
            )));
        }

        let page = response.text().await?;

        let title = Self::extract_title(&page)
            .unwrap_or_else(|| format!("YouTube Video (ID: {})", video.id));

        Ok(VideoMetadata {
            video_id: video.id.clone(),
            title,
            author: Self::extract_author(&page),
            duration_label: UNKNOWN.to_string(),
            views_label: UNKNOWN.to_string(),
            published_label: UNKNOWN.to_string(),
            description: Self::extract_description(&page),
            source: MetadataSource::Secondary,
        })
    }
}
