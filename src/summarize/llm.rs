//! Language-model client abstraction.
//!
//! Every model interaction in the pipeline (chunk summaries, reduction,
//! fallbacks, transcript presentation) goes through the [`LanguageModel`]
//! trait, so tests can substitute a mock and the backend stays swappable.

use crate::error::{OppsumError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// A single completion endpoint: system + user prompt in, text out.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str, max_output_tokens: u32) -> Result<String>;
}

/// OpenAI chat-completion backend.
pub struct OpenAiModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiModel {
    pub fn new(model: &str, temperature: f32) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            temperature,
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(&self, system: &str, user: &str, max_output_tokens: u32) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system.to_string())
                .build()
                .map_err(|e| OppsumError::Summarize(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user.to_string())
                .build()
                .map_err(|e| OppsumError::Summarize(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_completion_tokens(max_output_tokens)
            .build()
            .map_err(|e| OppsumError::Summarize(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| OppsumError::OpenAI(format!("Completion request failed: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .ok_or_else(|| OppsumError::Summarize("Empty response from language model".into()))
    }
}

/// Retry policy for transient model failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Backoff before the first retry; doubles per attempt.
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
        }
    }
}

/// Run a completion with bounded retries and exponential backoff.
///
/// Rate-limit failures back off twice as long as other failures.
pub async fn complete_with_retry(
    model: &dyn LanguageModel,
    system: &str,
    user: &str,
    max_output_tokens: u32,
    policy: RetryPolicy,
) -> Result<String> {
    let mut attempt = 0;

    loop {
        match model.complete(system, user, max_output_tokens).await {
            Ok(text) => return Ok(text),
            Err(e) if attempt < policy.max_retries => {
                let mut delay = policy.initial_backoff * 2u32.saturating_pow(attempt);
                if is_rate_limited(&e) {
                    delay *= 2;
                }
                attempt += 1;
                warn!(
                    "Model call failed (attempt {}/{}), retrying in {}ms: {}",
                    attempt,
                    policy.max_retries,
                    delay.as_millis(),
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

fn is_rate_limited(err: &OppsumError) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("429") || msg.contains("rate limit") || msg.contains("rate_limit")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyModel {
        failures_before_success: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LanguageModel for FlakyModel {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _max_output_tokens: u32,
        ) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err(OppsumError::OpenAI("temporary outage".into()))
            } else {
                Ok("done".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let model = FlakyModel {
            failures_before_success: 2,
            calls: AtomicUsize::new(0),
        };
        let policy = RetryPolicy::new(2, Duration::from_millis(1));

        let result = complete_with_retry(&model, "s", "u", 64, policy).await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_propagates_error() {
        let model = FlakyModel {
            failures_before_success: 10,
            calls: AtomicUsize::new(0),
        };
        let policy = RetryPolicy::new(2, Duration::from_millis(1));

        let result = complete_with_retry(&model, "s", "u", 64, policy).await;
        assert!(result.is_err());
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_rate_limit_detection() {
        assert!(is_rate_limited(&OppsumError::OpenAI(
            "HTTP 429 Too Many Requests".into()
        )));
        assert!(is_rate_limited(&OppsumError::OpenAI(
            "Rate limit exceeded".into()
        )));
        assert!(!is_rate_limited(&OppsumError::OpenAI(
            "connection reset".into()
        )));
    }
}
