use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use gemini_gateway::admission::AdmissionController;
use gemini_gateway::build_router;
use gemini_gateway::config::Args;
use gemini_gateway::directory::StaticDirectory;
use gemini_gateway::error::GatewayError;
use gemini_gateway::providers::gemini::{GeminiConfig, GeminiGenerator};
use gemini_gateway::rate_limit::{UsageLedger, now_secs, sweeper};
use gemini_gateway::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional, real environment wins
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "gateway stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), GatewayError> {
    args.validate()?;
    let api_key = args.require_api_key()?;
    let directory = StaticDirectory::parse(&args.users)?;
    if directory.is_empty() {
        tracing::warn!("user directory is empty, every request will be rejected");
    }

    let ledger = Arc::new(UsageLedger::new(args.rate_limit, args.window()));

    let generator = GeminiGenerator::new(
        GeminiConfig {
            api_base: args.api_base.clone(),
            api_key,
            model: args.model.clone(),
        },
        reqwest::Client::new(),
    );

    let state = Arc::new(AppState {
        admission: AdmissionController::new(Arc::new(directory), Arc::clone(&ledger)),
        generator: Arc::new(generator),
    });

    if let Some(every) = args.sweep_every() {
        tokio::spawn(sweeper(Arc::clone(&ledger), every, now_secs));
    }

    let app = build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| GatewayError::Configuration(format!("cannot bind {addr}: {e}")))?;

    tracing::info!(%addr, model = %args.model, "gateway listening");
    tracing::info!(
        limit = ledger.limit(),
        window = ?ledger.window(),
        "per-user rate limit"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| GatewayError::Internal(e.to_string()))
}
