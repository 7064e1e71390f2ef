//! Pre-flight checks run before commands that need external services.

use crate::error::{OppsumError, Result};

/// Verify that the environment can support a pipeline run.
///
/// Only the language-model key is a hard requirement; missing extraction
/// tools degrade at runtime rather than blocking up front.
pub fn check() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(OppsumError::Config(
            "OPENAI_API_KEY is not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}
