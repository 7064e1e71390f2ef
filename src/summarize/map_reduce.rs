//! Map-reduce summarization over transcript chunks.
//!
//! Map: one model call per chunk, run concurrently under a bounded worker
//! pool so the external service's rate limit is respected. Reduce: a join
//! point that waits for every chunk summary, then one further call that
//! synthesizes them into a single narrative.

use super::llm::{complete_with_retry, LanguageModel, RetryPolicy};
use super::ChunkSummary;
use crate::config::Prompts;
use crate::error::{OppsumError, Result};
use crate::metadata::VideoMetadata;
use crate::text::Chunk;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Maximum characters of chunk text kept in an extractive placeholder.
const PLACEHOLDER_EXCERPT_CHARS: usize = 400;

/// Map-reduce summarizer over ordered transcript chunks.
pub struct MapReduceSummarizer {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    max_concurrent: usize,
    max_output_tokens: u32,
    retry: RetryPolicy,
}

impl MapReduceSummarizer {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        prompts: Prompts,
        max_concurrent: usize,
        max_output_tokens: u32,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            model,
            prompts,
            max_concurrent: max_concurrent.max(1),
            max_output_tokens,
            retry,
        }
    }

    /// Summarize all chunks, then reduce to one final text.
    #[instrument(skip_all, fields(chunks = chunks.len()))]
    pub async fn summarize(&self, chunks: &[Chunk], meta: &VideoMetadata) -> Result<String> {
        let summaries = self.map(chunks, meta).await?;
        self.reduce(&summaries, meta).await
    }

    /// Map phase: summarize each chunk independently, concurrently up to
    /// the cap. Returns summaries sorted by chunk index.
    pub async fn map(&self, chunks: &[Chunk], meta: &VideoMetadata) -> Result<Vec<ChunkSummary>> {
        if chunks.is_empty() {
            return Err(OppsumError::Summarize("No chunks to summarize".into()));
        }

        let total = chunks.len();
        info!("Summarizing {} chunk(s)", total);

        let mut summaries: Vec<ChunkSummary> = stream::iter(chunks)
            .map(|chunk| async move { self.summarize_chunk(chunk, meta, total).await })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        // Completion order is arbitrary; the chunk index is authoritative.
        summaries.sort_by_key(|s| s.chunk_index);
        Ok(summaries)
    }

    /// Summarize one chunk. Never fails: after retries are exhausted the
    /// chunk gets an extractive placeholder so one bad call cannot sink the
    /// whole run.
    async fn summarize_chunk(
        &self,
        chunk: &Chunk,
        meta: &VideoMetadata,
        total: usize,
    ) -> ChunkSummary {
        let position = chunk.index + 1;

        let mut vars = HashMap::new();
        vars.insert("title".to_string(), meta.title.clone());
        vars.insert("author".to_string(), meta.author.clone());
        vars.insert("duration".to_string(), meta.duration_label.clone());
        vars.insert("views".to_string(), meta.views_label.clone());
        vars.insert("published".to_string(), meta.published_label.clone());
        vars.insert("position".to_string(), position.to_string());
        vars.insert("total".to_string(), total.to_string());
        vars.insert("chunk".to_string(), chunk.text.clone());

        // A transcript that fits one chunk gets the whole-video prompt; the
        // reducer then passes its summary through untouched.
        let (system, user) = if total == 1 {
            (
                self.prompts
                    .render_with_custom(&self.prompts.single.system, &vars),
                self.prompts
                    .render_with_custom(&self.prompts.single.user, &vars),
            )
        } else {
            (
                self.prompts
                    .render_with_custom(&self.prompts.chunk.system, &vars),
                self.prompts
                    .render_with_custom(&self.prompts.chunk.user, &vars),
            )
        };

        match complete_with_retry(
            self.model.as_ref(),
            &system,
            &user,
            self.max_output_tokens,
            self.retry,
        )
        .await
        {
            Ok(text) => {
                debug!("Chunk {}/{} summarized", position, total);
                ChunkSummary {
                    chunk_index: chunk.index,
                    text,
                }
            }
            Err(e) => {
                warn!(
                    "Chunk {}/{} failed after retries, substituting extractive fallback: {}",
                    position, total, e
                );
                ChunkSummary {
                    chunk_index: chunk.index,
                    text: extractive_fallback(&chunk.text),
                }
            }
        }
    }

    /// Reduce phase: synthesize the ordered summaries into one narrative.
    ///
    /// A single summary is returned unchanged (no redundant model call).
    /// An empty list is a precondition violation and fails closed. When the
    /// synthesis call fails, the ordered concatenation of the summaries is
    /// returned instead, so the result always reflects every chunk in
    /// order.
    pub async fn reduce(&self, summaries: &[ChunkSummary], meta: &VideoMetadata) -> Result<String> {
        match summaries {
            [] => Err(OppsumError::Summarize(
                "Cannot reduce an empty summary list".into(),
            )),
            [only] => Ok(only.text.clone()),
            _ => {
                let sections = join_sections(summaries);

                let mut vars = HashMap::new();
                vars.insert("title".to_string(), meta.title.clone());
                vars.insert("author".to_string(), meta.author.clone());
                vars.insert("duration".to_string(), meta.duration_label.clone());
                vars.insert("sections".to_string(), sections.clone());

                let system = self
                    .prompts
                    .render_with_custom(&self.prompts.reduce.system, &vars);
                let user = self
                    .prompts
                    .render_with_custom(&self.prompts.reduce.user, &vars);

                match complete_with_retry(
                    self.model.as_ref(),
                    &system,
                    &user,
                    self.max_output_tokens,
                    self.retry,
                )
                .await
                {
                    Ok(text) => Ok(text),
                    Err(e) => {
                        warn!(
                            "Reduce call failed, concatenating section summaries: {}",
                            e
                        );
                        Ok(sections)
                    }
                }
            }
        }
    }
}

/// Ordered "Section N:" concatenation, used both as the reducer's input and
/// as its own fallback output.
fn join_sections(summaries: &[ChunkSummary]) -> String {
    summaries
        .iter()
        .map(|s| format!("Section {}: {}", s.chunk_index + 1, s.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Minimal extractive stand-in for a chunk the model could not summarize.
fn extractive_fallback(text: &str) -> String {
    let excerpt = match text.char_indices().nth(PLACEHOLDER_EXCERPT_CHARS) {
        Some((cut, _)) => {
            // Back off to the last sentence boundary inside the window
            match text[..cut].rfind(['.', '!', '?']) {
                Some(p) => &text[..=p],
                None => &text[..cut],
            }
        }
        None => text,
    };

    format!(
        "(A summary for this section could not be generated; an excerpt follows.) {}",
        excerpt.trim()
    )
}
