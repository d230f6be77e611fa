//! Common utilities for integration tests

use std::sync::Arc;

use axum::Router;
use server::config::ServerConfig;
use server::{app, AppState};
use tts_core::{SilenceEngine, SynthesisEngine, VoiceRegistry};

/// Samples the fake engine returns for every chunk.
pub const SAMPLES_PER_CHUNK: usize = 1000;
pub const SAMPLE_RATE: u32 = 22_050;

pub fn test_config() -> ServerConfig {
    ServerConfig {
        max_total_chars: 4000,
        max_chars_per_chunk: 1200,
        chunking_enabled: true,
        silence_gap_ms: 100,
        // Generous so the rate limiter never trips a test run.
        rate_limit_per_minute: 6000,
        ..ServerConfig::default()
    }
}

/// Create a test app instance backed by the deterministic silence engine.
pub fn create_test_app() -> Router {
    create_test_app_with_config(test_config())
}

pub fn create_test_app_with_config(config: ServerConfig) -> Router {
    let engine: Arc<dyn SynthesisEngine> = Arc::new(SilenceEngine {
        samples_per_chunk: SAMPLES_PER_CHUNK,
        sample_rate: SAMPLE_RATE,
    });
    let registry = VoiceRegistry::openai_defaults();
    app(AppState::new(engine, registry, config))
}
