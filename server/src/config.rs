// Runtime configuration, sourced from the environment.

use std::time::Duration;

use tts_core::PipelineConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub max_total_chars: usize,
    pub max_chars_per_chunk: usize,
    pub chunking_enabled: bool,
    pub silence_gap_ms: u32,
    pub rate_limit_per_minute: u32,
    pub request_timeout_secs: u64,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub voices_map: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8001,
            max_total_chars: 4000,
            max_chars_per_chunk: 1200,
            chunking_enabled: true,
            silence_gap_ms: 100,
            rate_limit_per_minute: 60,
            request_timeout_secs: 60,
            cors_allowed_origins: None,
            voices_map: "models/voices.json".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            port: env_parsed("PORT").unwrap_or(defaults.port),
            max_total_chars: env_parsed("MAX_TOTAL_CHARS").unwrap_or(defaults.max_total_chars),
            max_chars_per_chunk: env_parsed("MAX_CHARS_PER_CHUNK")
                .unwrap_or(defaults.max_chars_per_chunk),
            chunking_enabled: env_parsed("CHUNKING_ENABLED").unwrap_or(defaults.chunking_enabled),
            silence_gap_ms: env_parsed("SILENCE_GAP_MS").unwrap_or(defaults.silence_gap_ms),
            rate_limit_per_minute: env_parsed("RATE_LIMIT_PER_MINUTE")
                .unwrap_or(defaults.rate_limit_per_minute),
            request_timeout_secs: env_parsed("REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            cors_allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS").ok().map(|origins| {
                origins.split(',').map(|s| s.trim().to_string()).collect()
            }),
            voices_map: std::env::var("VOICES_MAP").unwrap_or(defaults.voices_map),
        }
    }

    /// The immutable per-invocation pipeline configuration.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            max_total_chars: self.max_total_chars,
            max_chars_per_chunk: self.max_chars_per_chunk,
            chunking_enabled: self.chunking_enabled,
            silence_gap_ms: self.silence_gap_ms,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
