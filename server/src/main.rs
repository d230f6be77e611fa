use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use server::config::ServerConfig;
use server::routes::START_TIME;
use server::{app, AppState};
use tts_core::piper::PiperEngine;
use tts_core::{SilenceEngine, SynthesisEngine, VoiceRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _ = dotenv::dotenv();

    info!("Starting TTS server...");
    let config = ServerConfig::from_env();

    let registry = VoiceRegistry::from_mapfile(&config.voices_map).unwrap_or_else(|e| {
        warn!(
            "Could not load {}: {e}, using built-in voice mapping.",
            config.voices_map
        );
        VoiceRegistry::openai_defaults()
    });
    info!("Loaded {} voices", registry.len());

    let voice_configs = registry.voice_configs();
    let engine: Arc<dyn SynthesisEngine> = if voice_configs.is_empty() {
        warn!("No voice models configured, falling back to the silence engine.");
        Arc::new(SilenceEngine::default())
    } else {
        let engine = PiperEngine::new(voice_configs);
        if let Err(e) = engine.preload() {
            warn!("Model preload failed: {e}, models will load on first use.");
        }
        Arc::new(engine)
    };

    let _ = START_TIME.get_or_init(std::time::Instant::now);

    info!(
        "Server configuration loaded: port={}, max_total_chars={}, max_chars_per_chunk={}, chunking_enabled={}",
        config.port, config.max_total_chars, config.max_chars_per_chunk, config.chunking_enabled
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let state = AppState::new(engine, registry, config);
    let app = app(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}. Try a different PORT."))?;

    info!("Server listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
