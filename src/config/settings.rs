//! Configuration settings for Oppsum.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub metadata: MetadataSettings,
    pub transcript: TranscriptSettings,
    pub chunking: ChunkingSettings,
    pub summarize: SummarizeSettings,
    pub prompts: PromptSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Hard deadline for one pipeline run, in seconds. When it elapses the
    /// run unwinds to the metadata-fallback path.
    pub pipeline_timeout_seconds: u64,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            pipeline_timeout_seconds: 300,
        }
    }
}

/// Metadata resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataSettings {
    /// Timeout for individual HTTP requests, in seconds.
    pub request_timeout_seconds: u64,
    /// Timeout for one metadata layer end to end, in seconds.
    pub layer_timeout_seconds: u64,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 20,
            layer_timeout_seconds: 30,
        }
    }
}

/// Transcript acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Caption language candidates, tried in order.
    pub languages: Vec<String>,
    /// Timeout for individual HTTP requests, in seconds.
    pub request_timeout_seconds: u64,
    /// Timeout for one extraction layer end to end, in seconds.
    pub layer_timeout_seconds: u64,
    /// Tracks shorter than this many characters are treated as misses.
    pub min_transcript_chars: usize,
    /// Enable the caption-track protocol layer.
    pub timedtext_enabled: bool,
    /// Enable the yt-dlp auto-caption layer.
    pub ytdlp_enabled: bool,
    /// Enable the watch-page inspection layer.
    pub page_inspection_enabled: bool,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            languages: vec![
                "en".to_string(),
                "en-US".to_string(),
                "en-GB".to_string(),
                "en-CA".to_string(),
                "en-AU".to_string(),
            ],
            request_timeout_seconds: 20,
            layer_timeout_seconds: 30,
            min_transcript_chars: 50,
            timedtext_enabled: true,
            ytdlp_enabled: true,
            page_inspection_enabled: true,
        }
    }
}

impl TranscriptSettings {
    /// The first (preferred) caption language.
    pub fn primary_language(&self) -> String {
        self.languages
            .first()
            .cloned()
            .unwrap_or_else(|| "en".to_string())
    }
}

/// Transcript chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Estimated-token budget per chunk.
    pub token_budget: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            token_budget: crate::text::DEFAULT_TOKEN_BUDGET,
        }
    }
}

/// Summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizeSettings {
    /// Chat model used for chunk summaries, reduction, and fallbacks.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum output tokens per completion.
    pub max_output_tokens: u32,
    /// Maximum concurrent chunk-summary calls.
    pub max_concurrent_chunks: usize,
    /// Retries per model call on transient failure.
    pub max_retries: u32,
    /// Initial retry backoff in milliseconds; doubles per attempt.
    pub retry_backoff_ms: u64,
}

impl Default for SummarizeSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_output_tokens: 1024,
            max_concurrent_chunks: 3,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}


impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::OppsumError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("oppsum")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.token_budget, 2000);
        assert_eq!(settings.summarize.max_concurrent_chunks, 3);
        assert_eq!(settings.transcript.languages[0], "en");
        assert_eq!(settings.transcript.primary_language(), "en");
        assert!(settings.transcript.timedtext_enabled);
    }

    #[test]
    fn test_toml_roundtrip() {
        let settings = Settings::default();
        let serialized = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.summarize.model, settings.summarize.model);
        assert_eq!(parsed.general.pipeline_timeout_seconds, 300);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Settings = toml::from_str("[summarize]\nmodel = \"gpt-4.1\"\n").unwrap();
        assert_eq!(parsed.summarize.model, "gpt-4.1");
        assert_eq!(parsed.summarize.max_retries, 2);
        assert_eq!(parsed.chunking.token_budget, 2000);
    }
}
