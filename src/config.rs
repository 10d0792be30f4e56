use clap::Parser;
use std::time::Duration;

use crate::error::GatewayError;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "gemini-gateway")]
#[command(about = "Authorizing, rate limited gateway in front of Gemini")]
pub struct Args {
    // Address to bind on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // Max requests per user per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 5)]
    pub rate_limit: usize,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW", default_value_t = 60)]
    pub rate_window: u64,

    // Model every message is sent to
    #[arg(short, long, env = "GEMINI_MODEL", default_value = "gemma-3n-e2b-it")]
    pub model: String,

    #[arg(
        long,
        env = "GEMINI_API_BASE",
        default_value = "https://generativelanguage.googleapis.com/v1beta"
    )]
    pub api_base: String,

    // User directory, comma-separated "name:tier" where tier is premium or basic
    // Example: "aditya:premium,guest:basic"
    #[arg(short, long, env = "GATEWAY_USERS", default_value = "aditya:premium,guest:basic")]
    pub users: String,

    // How often idle users are dropped from the usage ledger, 0 disables
    #[arg(long, env = "SWEEP_INTERVAL", default_value_t = 300)]
    pub sweep_interval: u64,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl Args {
    // Quota settings that would switch the limiter off or deny everyone
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.rate_limit == 0 {
            return Err(GatewayError::Configuration(
                "rate limit must be at least 1".to_string(),
            ));
        }
        if self.rate_window == 0 {
            return Err(GatewayError::Configuration(
                "rate window must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    // The Gemini credential, absent or blank is fatal at startup
    pub fn require_api_key(&self) -> Result<String, GatewayError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(GatewayError::Configuration(
                "GEMINI_API_KEY not set".to_string(),
            )),
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }

    pub fn sweep_every(&self) -> Option<Duration> {
        (self.sweep_interval > 0).then(|| Duration::from_secs(self.sweep_interval))
    }
}
