//! Metadata-only summary generation.
//!
//! Used when every transcript layer has been exhausted. The output states
//! plainly that no transcript was available, infers what it can from title
//! and author, and ends with actionable suggestions. It never claims
//! knowledge of the video's actual content; that is a content-policy
//! invariant, not a style preference.

use super::llm::{complete_with_retry, LanguageModel, RetryPolicy};
use super::Action;
use crate::config::Prompts;
use crate::error::Result;
use crate::metadata::{VideoMetadata, UNKNOWN};
use crate::transcript::AttemptedLayer;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Generates honest metadata-only summaries.
pub struct FallbackGenerator {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    max_output_tokens: u32,
    retry: RetryPolicy,
}

impl FallbackGenerator {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        prompts: Prompts,
        max_output_tokens: u32,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            model,
            prompts,
            max_output_tokens,
            retry,
        }
    }

    /// Build the fallback text. Infallible: degrades to a static
    /// explanation when the model is unreachable or the metadata is too
    /// thin to infer anything from.
    pub async fn generate(
        &self,
        meta: &VideoMetadata,
        action: Action,
        attempted: &[AttemptedLayer],
    ) -> String {
        let header = match action {
            Action::Summarize => {
                "No transcript was available for this video, so this summary is based on its \
                 metadata only."
            }
            Action::Transcribe => {
                "No transcript could be extracted for this video. The video may not have \
                 captions, or access to them may be restricted."
            }
        };

        let body = if meta.has_real_title() || meta.has_description() {
            match self.inferred_body(meta).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Metadata inference call failed: {}", e);
                    static_body(meta)
                }
            }
        } else {
            info!("Metadata too thin for inference, using static fallback text");
            static_body(meta)
        };

        let mut out = String::new();
        out.push_str(header);
        if let Some(diagnostics) = format_attempts(attempted) {
            out.push_str("\n\n");
            out.push_str(&diagnostics);
        }
        out.push_str("\n\n");
        out.push_str(&body);
        out.push_str("\n\n");
        out.push_str(&suggestions(action));
        out
    }

    /// One model call inferring what the video likely covers from its
    /// metadata alone.
    async fn inferred_body(&self, meta: &VideoMetadata) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("title".to_string(), meta.title.clone());
        vars.insert("author".to_string(), meta.author.clone());
        vars.insert("duration".to_string(), meta.duration_label.clone());
        vars.insert("views".to_string(), meta.views_label.clone());
        vars.insert("published".to_string(), meta.published_label.clone());
        vars.insert("description".to_string(), meta.description.clone());

        let system = self
            .prompts
            .render_with_custom(&self.prompts.fallback.system, &vars);
        let user = self
            .prompts
            .render_with_custom(&self.prompts.fallback.user, &vars);

        complete_with_retry(
            self.model.as_ref(),
            &system,
            &user,
            self.max_output_tokens,
            self.retry,
        )
        .await
    }
}

/// Render the diagnostic trail of failed layers, if any.
fn format_attempts(attempted: &[AttemptedLayer]) -> Option<String> {
    if attempted.is_empty() {
        return None;
    }

    let lines = attempted
        .iter()
        .map(|a| format!("  - {}: {}", a.layer, a.reason))
        .collect::<Vec<_>>()
        .join("\n");

    Some(format!("Attempted extraction layers:\n{}", lines))
}

/// Static inference used when the model is unreachable or there is nothing
/// to infer from.
fn static_body(meta: &VideoMetadata) -> String {
    if meta.has_real_title() {
        let by = if meta.author != UNKNOWN {
            format!(" by {}", meta.author)
        } else {
            String::new()
        };
        format!(
            "The video is titled \"{}\"{}. Without a transcript, nothing can be said about \
             what is actually discussed in it beyond what the title suggests.",
            meta.title, by
        )
    } else {
        format!(
            "Details for video {} could not be retrieved either; it may be private, removed, \
             or region-restricted.",
            meta.video_id
        )
    }
}

/// Actionable alternatives for the user.
fn suggestions(action: Action) -> String {
    let mut lines = vec![
        "What you can try:".to_string(),
        "  - Watch the first minute of the video directly to gauge its content".to_string(),
        "  - Use the platform's own caption button (CC) if the player offers one".to_string(),
        "  - Check the comments for viewer perspectives".to_string(),
    ];

    if action == Action::Transcribe {
        lines.push(
            "  - Try the summarize action instead for a metadata-based overview".to_string(),
        );
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OppsumError;
    use crate::transcript::FailureReason;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubModel {
        response: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl StubModel {
        fn new(response: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                response,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for StubModel {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _max_output_tokens: u32,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.response {
                Some(text) => Ok(text.to_string()),
                None => Err(OppsumError::OpenAI("model down".into())),
            }
        }
    }

    fn generator(model: Arc<StubModel>) -> FallbackGenerator {
        FallbackGenerator::new(
            model,
            Prompts::default(),
            512,
            RetryPolicy::new(0, std::time::Duration::from_millis(1)),
        )
    }

    fn rich_meta() -> VideoMetadata {
        VideoMetadata {
            title: "A Real Title".to_string(),
            author: "Some Channel".to_string(),
            description: "An actual description of the video.".to_string(),
            ..VideoMetadata::fallback("dQw4w9WgXcQ")
        }
    }

    fn attempts() -> Vec<AttemptedLayer> {
        vec![AttemptedLayer {
            layer: "timedtext".to_string(),
            reason: FailureReason::NotFound("no caption track".to_string()),
        }]
    }

    #[tokio::test]
    async fn test_states_transcript_absence() {
        let model = StubModel::new(Some("Likely a music video."));
        let text = generator(model)
            .generate(&rich_meta(), Action::Summarize, &attempts())
            .await;

        assert!(text.contains("No transcript was available"));
        assert!(text.contains("Likely a music video."));
        assert!(text.contains("timedtext: no caption track"));
        assert!(text.contains("What you can try:"));
    }

    #[tokio::test]
    async fn test_thin_metadata_skips_model_call() {
        let model = StubModel::new(Some("should not appear"));
        let meta = VideoMetadata::fallback("dQw4w9WgXcQ");
        let text = generator(model.clone())
            .generate(&meta, Action::Summarize, &attempts())
            .await;

        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert!(!text.contains("should not appear"));
        assert!(text.contains("could not be retrieved"));
    }

    #[tokio::test]
    async fn test_model_failure_degrades_to_static_body() {
        let model = StubModel::new(None);
        let text = generator(model)
            .generate(&rich_meta(), Action::Summarize, &attempts())
            .await;

        assert!(text.contains("No transcript was available"));
        assert!(text.contains("A Real Title"));
        assert!(text.contains("nothing can be said"));
    }

    #[tokio::test]
    async fn test_transcribe_action_wording_and_suggestion() {
        let model = StubModel::new(None);
        let text = generator(model)
            .generate(&rich_meta(), Action::Transcribe, &[])
            .await;

        assert!(text.contains("No transcript could be extracted"));
        assert!(text.contains("summarize action"));
    }
}
