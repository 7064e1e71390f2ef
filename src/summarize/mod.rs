//! Hierarchical transcript summarization.
//!
//! A map-reduce over transcript chunks: each chunk is summarized
//! independently through the language model, then the ordered summaries are
//! synthesized into one final text. When no transcript exists at all, the
//! fallback generator produces an honest metadata-only summary instead.

mod fallback;
mod llm;
mod map_reduce;

pub use fallback::FallbackGenerator;
pub use llm::{complete_with_retry, LanguageModel, OpenAiModel, RetryPolicy};
pub use map_reduce::MapReduceSummarizer;

use crate::metadata::VideoMetadata;
use crate::transcript::AttemptedLayer;
use serde::{Deserialize, Serialize};

/// What the caller asked the pipeline to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Summarize,
    Transcribe,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Summarize => write!(f, "summarize"),
            Action::Transcribe => write!(f, "transcribe"),
        }
    }
}

/// How the final text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryMethod {
    /// Derived from an actual transcript.
    #[serde(rename = "transcript")]
    Transcript,
    /// Derived from metadata only; no transcript was obtainable.
    #[serde(rename = "metadata-fallback")]
    MetadataFallback,
}

impl std::fmt::Display for SummaryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryMethod::Transcript => write!(f, "transcript"),
            SummaryMethod::MetadataFallback => write!(f, "metadata-fallback"),
        }
    }
}

/// Summary of one chunk, correlated by chunk index, never by arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSummary {
    pub chunk_index: usize,
    pub text: String,
}

/// Terminal artifact of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResult {
    /// The final summary (or presented transcript, or fallback text).
    pub text: String,
    /// Which path produced the text.
    pub method: SummaryMethod,
    /// Metadata used for context, whatever layer it came from.
    pub video: VideoMetadata,
    /// Extraction layer and caption language behind a transcript-backed
    /// result.
    pub transcript_source: Option<String>,
    /// Diagnostic trail of failed layers when no transcript was found.
    pub attempted_layers: Vec<AttemptedLayer>,
}
