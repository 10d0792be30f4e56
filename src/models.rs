use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

// POST /ai request body
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ChatRequest {
    pub username: String,
    pub message: String,
}

impl ChatRequest {
    // Shape check only, content is passed through untouched
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.username.trim().is_empty() {
            return Err(GatewayError::InvalidRequest("username must not be empty".into()));
        }
        if self.message.trim().is_empty() {
            return Err(GatewayError::InvalidRequest("message must not be empty".into()));
        }
        Ok(())
    }
}

// POST /ai response body
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ChatResponse {
    pub reply: String,
}
