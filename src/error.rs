use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::admission::Denial;
use crate::providers::ProviderError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid user")]
    Unauthorized,

    #[error("Premium required")]
    Forbidden,

    #[error("Rate limit exceeded")]
    RateLimited { retry_after: u64 },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream AI service failed: {0}")]
    Upstream(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<Denial> for GatewayError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthorized => GatewayError::Unauthorized,
            Denial::Forbidden => GatewayError::Forbidden,
            Denial::RateLimited { retry_after } => GatewayError::RateLimited { retry_after },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::Forbidden => StatusCode::FORBIDDEN,
            GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::Upstream(_)
            | GatewayError::Configuration(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            detail: self.to_string(),
        });
        let mut response = (status, body).into_response();

        if let GatewayError::RateLimited { retry_after } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        }
        response
    }
}
