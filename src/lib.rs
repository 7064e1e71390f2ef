//! Oppsum - Resilient Video Summarization
//!
//! Turns a YouTube URL or video ID into a natural-language summary even when
//! the underlying data sources (caption tracks, page metadata, the language
//! model) are flaky, rate-limited, or absent.
//!
//! The name comes from the Norwegian "oppsummere," meaning "to summarize."
//!
//! # Overview
//!
//! A single pipeline run:
//! - resolves video metadata through layered fallbacks
//! - acquires a transcript through an ordered chain of extraction strategies
//! - normalizes and splits the transcript into token-bounded chunks
//! - summarizes each chunk concurrently and reduces the parts into one text
//! - falls back to an honest metadata-only summary when no transcript exists
//!
//! Every run produces a usable result; failures degrade, they never surface.
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `video` - Video identifier parsing
//! - `metadata` - Layered video metadata resolution
//! - `transcript` - Layered transcript acquisition
//! - `text` - Normalization and chunking
//! - `summarize` - Map-reduce summarization and metadata fallback
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use oppsum::config::Settings;
//! use oppsum::orchestrator::Orchestrator;
//! use oppsum::summarize::Action;
//! use oppsum::video::VideoRef;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let video = VideoRef::parse("dQw4w9WgXcQ")?;
//!     let result = orchestrator.process(&video, Action::Summarize).await;
//!     println!("{}", result.text);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod metadata;
pub mod openai;
pub mod orchestrator;
pub mod summarize;
pub mod text;
pub mod transcript;
pub mod video;

pub use error::{OppsumError, Result};
