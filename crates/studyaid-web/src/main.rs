use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use studyaid_core::{GoogleTts, RuleTokenizer, Settings, VoiceSynthesizer, assets, config_file};
use studyaid_pdf_mupdf::MupdfBackend;

mod handlers;
mod models;
mod routes;
mod state;
mod upload;

use state::AppState;

const DEFAULT_LOG_FILTER: &str = "studyaid_core=info,studyaid_web=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let settings = Settings::from_file(&config_file::load_config())
        .apply_env(|key| std::env::var(key).ok())
        .context("invalid environment configuration")?;
    tracing::debug!(?settings, "resolved settings");

    let client = reqwest::Client::new();

    // Tokenizer data must be in place before the first request is accepted.
    let tokenizer_assets = assets::provision(
        &settings.tokenizer_data_dir,
        settings.abbreviations_url.as_deref(),
        &client,
    )
    .await
    .context("failed to provision tokenizer data")?;
    tracing::info!(
        path = %tokenizer_assets.path.display(),
        abbreviations = tokenizer_assets.abbreviations.len(),
        "tokenizer ready"
    );

    let tokenizer = RuleTokenizer::from_assets(&tokenizer_assets)
        .with_max_input_bytes(settings.max_tokenizer_input_bytes);
    let tts = GoogleTts::new(client)
        .with_endpoint(settings.tts_endpoint.clone())
        .with_timeout(settings.tts_timeout);
    let voice = VoiceSynthesizer::new(Arc::new(tts), settings.audio_dir.clone())
        .with_retention(settings.audio_retention);

    let state = Arc::new(AppState::new(
        Arc::new(MupdfBackend::new()),
        Arc::new(tokenizer),
        voice,
        &settings,
    ));

    let app = routes::app_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", settings.host, settings.port))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
