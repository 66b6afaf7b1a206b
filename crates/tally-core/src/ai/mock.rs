//! Mock provider for testing
//!
//! Replies with scripted text (or a scripted failure) and records every call,
//! so assistant behaviour can be tested without a running model server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{ProviderError, TextProvider};

/// Reply used when nothing was scripted: not a digit and not JSON, so every
/// assistant operation lands on its local fallback.
const DEFAULT_REPLY: &str = "mock provider: no scripted reply";

/// One recorded call
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Mock text provider
///
/// Clones share the call log, so a test can keep one handle and give the
/// other to the code under test.
#[derive(Clone)]
pub struct MockProvider {
    reply: Result<String, ProviderError>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockProvider {
    /// Create a new mock provider with the default reply
    pub fn new() -> Self {
        Self {
            reply: Ok(DEFAULT_REPLY.to_string()),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reply with the given text
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            ..Self::new()
        }
    }

    /// Fail every call with the given error
    pub fn failing(error: ProviderError) -> Self {
        Self {
            reply: Err(error),
            ..Self::new()
        }
    }

    /// Wait before answering (for timeout tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextProvider for MockProvider {
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(MockCall {
                prompt: prompt.to_string(),
                temperature,
                max_tokens,
            });
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.reply.clone()
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
