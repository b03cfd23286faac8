//! Lia Relay - server entry point

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lia_relay::api::create_router;
use lia_relay::generation::{GeminiClient, GenerationClient};
use lia_relay::speech::{GoogleSpeechClient, SpeechToText};
use lia_relay::{spawn_sweep_task, AppState, Config};

/// Main entry point for the relay.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the generation backend and, if configured, speech-to-text
/// 4. Create the shared content cache and start the expiry sweep
/// 5. Serve the router until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lia_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Lia relay");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, ttl={}s, sweep_interval={}s, model={}",
        config.cache_max_entries,
        config.cache_ttl_secs,
        config.sweep_interval_secs,
        config.gemini_model
    );

    let api_key = config
        .gemini_api_key
        .clone()
        .context("GEMINI_API_KEY must be set")?;
    let generator: Arc<dyn GenerationClient> = Arc::new(GeminiClient::new(
        api_key,
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
    ));

    let transcriber: Option<Arc<dyn SpeechToText>> = match &config.speech_api_key {
        Some(key) => {
            info!("Speech-to-text enabled");
            Some(Arc::new(GoogleSpeechClient::new(key.clone())))
        }
        None => {
            warn!("GOOGLE_SPEECH_API_KEY not set, voice payloads will be ignored");
            None
        }
    };

    let state = AppState::from_config(&config, generator, transcriber);
    let sweep_handle = spawn_sweep_task(state.cache().clone(), config.sweep_interval_secs);

    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Relay listening on ws://{}/ws/lia", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("server error")?;

    info!("Relay shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sweep task.
async fn shutdown_signal(sweep_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    sweep_handle.abort();
    info!("Expiry sweep aborted");
}
