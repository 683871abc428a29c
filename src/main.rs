use anyhow::{Context, Result};
use std::sync::Arc;

use quotecrab::config::Config;
use quotecrab::transport::{Transport, http::HttpTransport};
use quotecrab::{AllocationTracker, ApiKeyGate, AppState, DailyReset, Metrics, QuoteStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from environment variables and CLI arguments
    let config = Config::from_env_and_args()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("quotecrab={}", config.log_level).parse()?),
        )
        .init();

    // An unreadable or empty corpus is fatal
    let quotes = QuoteStore::load(&config.quotes_file)
        .with_context(|| format!("Failed to load quotes from {}", config.quotes_file.display()))?;
    tracing::info!(
        "Loaded {} quotes from {}",
        quotes.len(),
        config.quotes_file.display()
    );

    if !config.has_api_key() {
        tracing::warn!("API_KEY is not set; every request will be rejected with 401");
    }

    let metrics = Arc::new(Metrics::new());
    let tracker = AllocationTracker::new(Arc::new(quotes));
    let gate = ApiKeyGate::new(config.api_key.clone());

    let reset_task = DailyReset::spawn(tracker.clone(), metrics.clone());

    let state = Arc::new(AppState::new(tracker, gate, metrics));

    tracing::info!(
        "Starting QuoteCrab HTTP transport on {}:{}",
        config.http.host,
        config.http.port
    );
    let transport = HttpTransport::new(&config.http.host, config.http.port);
    let result = transport.start(state).await;

    reset_task.abort();

    if let Err(e) = &result {
        tracing::error!("HTTP transport failed: {}", e);
    }
    result
}
