//! Pipeline orchestrator for Oppsum.
//!
//! Drives one video through metadata resolution, transcript acquisition,
//! and summarization. Every run terminates in a [`SummaryResult`]; when a
//! transcript cannot be obtained (or the pipeline deadline elapses), the
//! run unwinds to the metadata-fallback path instead of surfacing an error.

use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::metadata::{MetadataResolver, VideoMetadata};
use crate::summarize::{
    complete_with_retry, Action, FallbackGenerator, LanguageModel, MapReduceSummarizer,
    OpenAiModel, RetryPolicy, SummaryMethod, SummaryResult,
};
use crate::text::{chunk_text, normalize};
use crate::transcript::{AcquisitionPipeline, AttemptedLayer, FailureReason, TranscriptResult};
use crate::video::VideoRef;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// The main orchestrator for the Oppsum pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    resolver: MetadataResolver,
    pipeline: AcquisitionPipeline,
    model: Arc<dyn LanguageModel>,
    summarizer: MapReduceSummarizer,
    fallback: FallbackGenerator,
    retry: RetryPolicy,
}

/// Where the transcript path ended up before fallback handling.
enum Outcome {
    Done(SummaryResult),
    NotFound(Vec<AttemptedLayer>),
}

impl Orchestrator {
    /// Create an orchestrator with default components.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let resolver = MetadataResolver::from_settings(&settings.metadata);
        let pipeline = AcquisitionPipeline::from_settings(&settings.transcript);
        let model: Arc<dyn LanguageModel> = Arc::new(OpenAiModel::new(
            &settings.summarize.model,
            settings.summarize.temperature,
        ));

        Ok(Self::with_components(
            settings, prompts, resolver, pipeline, model,
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        resolver: MetadataResolver,
        pipeline: AcquisitionPipeline,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        let retry = RetryPolicy::new(
            settings.summarize.max_retries,
            Duration::from_millis(settings.summarize.retry_backoff_ms),
        );

        let summarizer = MapReduceSummarizer::new(
            model.clone(),
            prompts.clone(),
            settings.summarize.max_concurrent_chunks,
            settings.summarize.max_output_tokens,
            retry,
        );

        let fallback = FallbackGenerator::new(
            model.clone(),
            prompts.clone(),
            settings.summarize.max_output_tokens,
            retry,
        );

        Self {
            settings,
            prompts,
            resolver,
            pipeline,
            model,
            summarizer,
            fallback,
            retry,
        }
    }

    /// Process one video. Never fails: every outcome, including every
    /// internal failure, is encoded in the returned [`SummaryResult`].
    #[instrument(skip(self), fields(video_id = %video.id, action = %action))]
    pub async fn process(&self, video: &VideoRef, action: Action) -> SummaryResult {
        info!("Resolving metadata");
        let meta = self.resolver.resolve(video).await;
        info!("Metadata via {} layer: {}", meta.source, meta.title);

        let deadline = Duration::from_secs(self.settings.general.pipeline_timeout_seconds);
        let outcome =
            match tokio::time::timeout(deadline, self.transcript_path(video, &meta, action)).await
            {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(
                        "Pipeline deadline of {}s elapsed, falling back to metadata",
                        deadline.as_secs()
                    );
                    Outcome::NotFound(vec![AttemptedLayer {
                        layer: "pipeline".to_string(),
                        reason: FailureReason::TransportError(format!(
                            "pipeline deadline of {}s elapsed",
                            deadline.as_secs()
                        )),
                    }])
                }
            };

        match outcome {
            Outcome::Done(result) => result,
            Outcome::NotFound(attempted) => {
                info!("No transcript; generating metadata-only result");
                let text = self.fallback.generate(&meta, action, &attempted).await;
                SummaryResult {
                    text,
                    method: SummaryMethod::MetadataFallback,
                    video: meta,
                    transcript_source: None,
                    attempted_layers: attempted,
                }
            }
        }
    }

    /// The transcript-backed branch: acquire, normalize, chunk, then
    /// summarize or present depending on the action.
    async fn transcript_path(
        &self,
        video: &VideoRef,
        meta: &VideoMetadata,
        action: Action,
    ) -> Outcome {
        info!("Acquiring transcript");
        let (raw, language, source) = match self.pipeline.acquire(video).await {
            TranscriptResult::Found {
                text,
                language,
                source,
            } => (text, language, source),
            TranscriptResult::NotFound { attempted } => return Outcome::NotFound(attempted),
        };

        let normalized = normalize(&raw);
        if normalized.is_empty() {
            return Outcome::NotFound(vec![AttemptedLayer {
                layer: source,
                reason: FailureReason::ParseError(
                    "transcript empty after normalization".into(),
                ),
            }]);
        }

        let provenance = format!("{} ({})", source, language);

        let text = match action {
            Action::Summarize => {
                let chunks = chunk_text(&normalized, self.settings.chunking.token_budget);
                match self.summarizer.summarize(&chunks, meta).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Summarization failed: {}", e);
                        return Outcome::NotFound(vec![AttemptedLayer {
                            layer: source,
                            reason: FailureReason::ParseError(e.to_string()),
                        }]);
                    }
                }
            }
            Action::Transcribe => self.present_transcript(&normalized, meta).await,
        };

        Outcome::Done(SummaryResult {
            text,
            method: SummaryMethod::Transcript,
            video: meta.clone(),
            transcript_source: Some(provenance),
            attempted_layers: Vec::new(),
        })
    }

    /// Re-present a transcript readably through one model call; the
    /// normalized text itself is the fallback.
    async fn present_transcript(&self, transcript: &str, meta: &VideoMetadata) -> String {
        let mut vars = HashMap::new();
        vars.insert("title".to_string(), meta.title.clone());
        vars.insert("author".to_string(), meta.author.clone());
        vars.insert("duration".to_string(), meta.duration_label.clone());
        vars.insert("transcript".to_string(), transcript.to_string());

        let system = self
            .prompts
            .render_with_custom(&self.prompts.transcribe.system, &vars);
        let user = self
            .prompts
            .render_with_custom(&self.prompts.transcribe.user, &vars);

        match complete_with_retry(
            self.model.as_ref(),
            &system,
            &user,
            self.settings.summarize.max_output_tokens,
            self.retry,
        )
        .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "Transcript presentation call failed, returning normalized text: {}",
                    e
                );
                transcript.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OppsumError;
    use crate::metadata::{MetadataLayer, MetadataSource};
    use crate::transcript::{CaptionTrack, TranscriptLayer};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticMetadataLayer;

    #[async_trait]
    impl MetadataLayer for StaticMetadataLayer {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn lookup(&self, video: &VideoRef) -> Result<VideoMetadata> {
            Ok(VideoMetadata {
                title: "Deep Dive Into Widgets".to_string(),
                author: "Widget Channel".to_string(),
                source: MetadataSource::Primary,
                ..VideoMetadata::fallback(&video.id)
            })
        }
    }

    struct StaticTranscriptLayer {
        text: Option<String>,
    }

    #[async_trait]
    impl TranscriptLayer for StaticTranscriptLayer {
        fn name(&self) -> &'static str {
            "static-captions"
        }

        async fn attempt(
            &self,
            _video: &VideoRef,
        ) -> std::result::Result<CaptionTrack, FailureReason> {
            match &self.text {
                Some(text) => Ok(CaptionTrack {
                    text: text.clone(),
                    language: "en".to_string(),
                }),
                None => Err(FailureReason::NotFound("no captions".into())),
            }
        }
    }

    /// Counts calls and tags map vs reduce responses apart.
    struct CountingModel {
        calls: AtomicUsize,
    }

    impl CountingModel {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for CountingModel {
        async fn complete(
            &self,
            _system: &str,
            user: &str,
            _max_output_tokens: u32,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if user.contains("Section summaries") {
                Ok("the reduced narrative".to_string())
            } else {
                Ok("a chunk summary".to_string())
            }
        }
    }

    struct FailingModel;

    #[async_trait]
    impl LanguageModel for FailingModel {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _max_output_tokens: u32,
        ) -> Result<String> {
            Err(OppsumError::OpenAI("model down".into()))
        }
    }

    fn sentence() -> String {
        let mut s: String = std::iter::repeat('w').take(398).collect();
        s.push('.');
        s
    }

    fn orchestrator(
        transcript: Option<String>,
        model: Arc<dyn LanguageModel>,
    ) -> Orchestrator {
        let mut settings = Settings::default();
        settings.summarize.max_retries = 0;
        settings.summarize.retry_backoff_ms = 1;

        let resolver = MetadataResolver::new(
            vec![Box::new(StaticMetadataLayer)],
            Duration::from_secs(5),
        );
        let pipeline = AcquisitionPipeline::new(
            vec![Box::new(StaticTranscriptLayer { text: transcript })],
            Duration::from_secs(5),
            50,
        );

        Orchestrator::with_components(
            settings,
            Prompts::default(),
            resolver,
            pipeline,
            model,
        )
    }

    #[tokio::test]
    async fn test_long_transcript_maps_and_reduces() {
        // 60 sentences of 100 estimated tokens -> 3 chunks at budget 2000,
        // so 3 map calls plus 1 reduce call
        let transcript = (0..60).map(|_| sentence()).collect::<Vec<_>>().join(" ");
        let model = CountingModel::new();
        let orchestrator = orchestrator(Some(transcript), model.clone());

        let video = VideoRef::new("dQw4w9WgXcQ");
        let result = orchestrator.process(&video, Action::Summarize).await;

        assert_eq!(result.method, SummaryMethod::Transcript);
        assert_eq!(result.text, "the reduced narrative");
        assert_eq!(model.calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            result.transcript_source.as_deref(),
            Some("static-captions (en)")
        );
        assert!(result.attempted_layers.is_empty());
    }

    #[tokio::test]
    async fn test_short_transcript_single_call() {
        // ~300 estimated tokens: one chunk, reducer short-circuits, so
        // exactly one model call in total
        let transcript = (0..3).map(|_| sentence()).collect::<Vec<_>>().join(" ");
        let model = CountingModel::new();
        let orchestrator = orchestrator(Some(transcript), model.clone());

        let video = VideoRef::new("dQw4w9WgXcQ");
        let result = orchestrator.process(&video, Action::Summarize).await;

        assert_eq!(result.method, SummaryMethod::Transcript);
        assert_eq!(result.text, "a chunk summary");
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_transcript_falls_back_to_metadata() {
        let model = CountingModel::new();
        let orchestrator = orchestrator(None, model);

        let video = VideoRef::new("dQw4w9WgXcQ");
        let result = orchestrator.process(&video, Action::Summarize).await;

        assert_eq!(result.method, SummaryMethod::MetadataFallback);
        assert!(result.text.contains("No transcript was available"));
        assert_eq!(result.attempted_layers.len(), 1);
        assert_eq!(result.attempted_layers[0].layer, "static-captions");
        assert!(result.transcript_source.is_none());
        assert_eq!(result.video.title, "Deep Dive Into Widgets");
    }

    #[tokio::test]
    async fn test_model_outage_still_produces_result() {
        // Transcript found but every model call fails: chunk placeholders
        // plus concatenation fallback still yield a transcript-backed result
        let transcript = (0..60).map(|_| sentence()).collect::<Vec<_>>().join(" ");
        let orchestrator = orchestrator(Some(transcript), Arc::new(FailingModel));

        let video = VideoRef::new("dQw4w9WgXcQ");
        let result = orchestrator.process(&video, Action::Summarize).await;

        assert_eq!(result.method, SummaryMethod::Transcript);
        assert!(result.text.contains("Section 1:"));
        assert!(result.text.contains("could not be generated"));
    }

    #[tokio::test]
    async fn test_transcribe_action_presents_transcript() {
        let transcript = (0..3).map(|_| sentence()).collect::<Vec<_>>().join(" ");
        let model = CountingModel::new();
        let orchestrator = orchestrator(Some(transcript), model.clone());

        let video = VideoRef::new("dQw4w9WgXcQ");
        let result = orchestrator.process(&video, Action::Transcribe).await;

        assert_eq!(result.method, SummaryMethod::Transcript);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transcribe_model_failure_returns_normalized_text() {
        let transcript = "hello [Music] world. this is a caption track long enough to pass the \
                          minimum length gate."
            .to_string();
        let orchestrator = orchestrator(Some(transcript), Arc::new(FailingModel));

        let video = VideoRef::new("dQw4w9WgXcQ");
        let result = orchestrator.process(&video, Action::Transcribe).await;

        assert_eq!(result.method, SummaryMethod::Transcript);
        assert!(result.text.starts_with("hello world."));
    }
}
