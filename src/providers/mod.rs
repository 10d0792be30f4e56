// Handlers only see TextGenerator, so tests swap the Gemini client for
// mock::MockGenerator

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Empty reply from model")]
    EmptyReply,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, message: &str) -> Result<String, ProviderError>;
}
