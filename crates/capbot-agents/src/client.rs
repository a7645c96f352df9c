//! Generative capability interface.
//!
//! The agents consume a text-completion capability through this trait and
//! treat its output as untrusted: every response is structurally validated
//! before anything downstream sees it.

use async_trait::async_trait;
use thiserror::Error;

/// Failure kinds of the generative capability.
#[derive(Debug, Clone, Error)]
pub enum GenerativeError {
    /// The backing service could not be reached or returned an error.
    #[error("generative capability unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete within the configured deadline.
    #[error("generative call timed out")]
    Timeout,
}

impl GenerativeError {
    /// Transient failures are worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerativeError::Unavailable(_) | GenerativeError::Timeout)
    }
}

/// Text-completion capability, swappable backend.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Complete a prompt. Output is untrusted free text.
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String, GenerativeError>;
}

/// Extract a JSON object from model output (handles markdown code blocks).
pub fn extract_json(text: &str) -> String {
    if let Some(start) = text.find("```json") {
        if let Some(end) = text[start + 7..].find("```") {
            return text[start + 7..start + 7 + end].trim().to_string();
        }
    }

    if let Some(start) = text.find("```") {
        if let Some(end) = text[start + 3..].find("```") {
            return text[start + 3..start + 3 + end].trim().to_string();
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        return text[start..=end].to_string();
    }

    text.to_string()
}
