use std::collections::BTreeMap;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use tts_core::{synthesize_speech, AudioFormat, SpeechRequest};

use crate::error::ApiError;
use crate::metrics::{MetricsResponse, SystemMetrics};
use crate::AppState;

pub static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// OpenAI-compatible speech request body.
#[derive(Deserialize)]
pub struct SpeechApiRequest {
    /// Accepted for API compatibility; a single local model serves all of them.
    #[serde(default = "default_model")]
    pub model: String,
    pub input: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default)]
    pub response_format: AudioFormat,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_model() -> String {
    "tts-1-hd".to_string()
}

fn default_voice() -> String {
    "alloy".to_string()
}

fn default_speed() -> f32 {
    1.0
}

/// POST /v1/audio/speech
///
/// Runs the full synthesis pipeline and returns the encoded audio bytes.
/// Chunk count and input length are surfaced as response headers for
/// diagnostics.
pub async fn create_speech(
    State(state): State<AppState>,
    Json(req): Json<SpeechApiRequest>,
) -> Result<Response, ApiError> {
    let started = Instant::now();

    let format = req.response_format;
    info!(
        model = %req.model,
        voice = %req.voice,
        chars = req.input.chars().count(),
        speed = req.speed,
        %format,
        "speech request"
    );

    let speech = SpeechRequest {
        text: req.input,
        voice: req.voice,
        speed: req.speed,
        format,
    };

    let engine = state.engine.clone();
    let registry = state.registry.clone();
    let pipeline = state.pipeline.clone();

    // Synthesis is CPU-bound and can run for seconds; keep it off the
    // async runtime.
    let result = tokio::task::spawn_blocking(move || {
        synthesize_speech(engine.as_ref(), &registry, &pipeline, &speech)
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("Task join error: {e}")))?;

    let latency_ms = started.elapsed().as_millis() as u64;
    let result = match result {
        Ok(result) => {
            state.metrics.speech.record_request(latency_ms);
            state.metrics.synthesis.record(
                result.chunk_count as u64,
                result.char_count as u64,
                result.duration_ms,
            );
            result
        }
        Err(e) => {
            state.metrics.speech.record_error();
            return Err(e.into());
        }
    };

    info!(
        chunks = result.chunk_count,
        bytes = result.payload.len(),
        latency_ms,
        "speech generated"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, result.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=speech.{}", format.extension()),
        )
        .header("X-Chunks-Processed", result.chunk_count.to_string())
        .header("X-Text-Length", result.char_count.to_string())
        .body(Body::from(result.payload))
        .map_err(|e| ApiError::InternalError(format!("Response build error: {e}")))
}

#[derive(Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub object: &'static str,
    pub created: u64,
    pub owned_by: &'static str,
}

#[derive(Serialize)]
pub struct ModelList {
    pub object: &'static str,
    pub data: Vec<ModelInfo>,
}

/// GET /v1/models — static OpenAI-compatible model listing.
pub async fn list_models() -> Json<ModelList> {
    let model = |id| ModelInfo {
        id,
        object: "model",
        created: 1_677_610_602,
        owned_by: "local-tts",
    };
    Json(ModelList {
        object: "list",
        data: vec![model("tts-1"), model("tts-1-hd")],
    })
}

#[derive(Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<String>,
    pub mapping: BTreeMap<String, String>,
    pub total_voices: usize,
}

/// GET /v1/audio/voices — public names and their engine-native identifiers.
pub async fn list_voices(State(state): State<AppState>) -> Json<VoicesResponse> {
    let mapping: BTreeMap<String, String> = state
        .registry
        .iter()
        .map(|(name, entry)| (name.clone(), entry.voice_id.clone()))
        .collect();
    Json(VoicesResponse {
        voices: state.registry.public_names(),
        total_voices: mapping.len(),
        mapping,
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub voices_available: usize,
    pub supported_formats: Vec<&'static str>,
    pub config: HealthConfig,
}

#[derive(Serialize)]
pub struct HealthConfig {
    pub max_total_chars: usize,
    pub max_chars_per_chunk: usize,
    pub chunking_enabled: bool,
    pub silence_gap_ms: u32,
}

/// GET /health — liveness plus the active pipeline limits.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        voices_available: state.registry.len(),
        supported_formats: vec!["wav", "mp3"],
        config: HealthConfig {
            max_total_chars: state.pipeline.max_total_chars,
            max_chars_per_chunk: state.pipeline.max_chars_per_chunk,
            chunking_enabled: state.pipeline.chunking_enabled,
            silence_gap_ms: state.pipeline.silence_gap_ms,
        },
    })
}

/// GET /metrics
pub async fn metrics_endpoint(State(state): State<AppState>) -> Json<MetricsResponse> {
    let mut system = sysinfo::System::new();
    system.refresh_cpu();
    system.refresh_memory();

    let uptime = START_TIME
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0);

    Json(MetricsResponse {
        timestamp: chrono::Utc::now(),
        system: SystemMetrics {
            cpu_usage_percent: system.global_cpu_info().cpu_usage(),
            memory_used_mb: system.used_memory() / 1024 / 1024,
            memory_total_mb: system.total_memory() / 1024 / 1024,
            uptime_seconds: uptime,
        },
        speech: state.metrics.speech.stats(),
        synthesis: state.metrics.synthesis.stats(),
    })
}
