//! Mock generative client for testing.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::client::{GenerativeClient, GenerativeError};

/// Mock generative client that replays a queue of scripted responses.
///
/// Useful for testing the agents without making API calls. Each call to
/// `complete` pops the next scripted response; an empty queue yields
/// `Unavailable`.
#[derive(Default)]
pub struct MockGenerativeClient {
    responses: Mutex<VecDeque<Result<String, GenerativeError>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerativeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful completion.
    pub async fn push_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(Ok(text.into()));
    }

    /// Queue a failure.
    pub async fn push_failure(&self, error: GenerativeError) {
        self.responses.lock().await.push_back(Err(error));
    }

    /// Number of completions performed so far.
    pub async fn call_count(&self) -> usize {
        self.prompts.lock().await.len()
    }

    /// The prompt of the most recent call.
    pub async fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().await.last().cloned()
    }
}

#[async_trait]
impl GenerativeClient for MockGenerativeClient {
    async fn complete(
        &self,
        prompt: &str,
        _temperature: f32,
        _max_output_tokens: u32,
    ) -> Result<String, GenerativeError> {
        self.prompts.lock().await.push(prompt.to_string());
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(GenerativeError::Unavailable("no scripted response".to_string())))
    }
}
