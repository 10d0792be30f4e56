// Deterministic stand-in for the AI service

use super::{ProviderError, TextGenerator};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct MockGenerator {
    outcome: Result<String, ProviderError>,
    calls: AtomicUsize,
}

impl MockGenerator {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            outcome: Ok(reply.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(err: ProviderError) -> Self {
        Self {
            outcome: Err(err),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, _message: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}
