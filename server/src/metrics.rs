// Request and synthesis metrics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Latency and error tracking for one endpoint.
#[derive(Debug, Clone, Default)]
pub struct EndpointMetrics {
    pub request_count: Arc<AtomicU64>,
    pub error_count: Arc<AtomicU64>,
    pub total_latency_ms: Arc<AtomicU64>,
    pub max_latency_ms: Arc<AtomicU64>,
}

impl EndpointMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, latency_ms: u64) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.max_latency_ms.fetch_max(latency_ms, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_latency_ms(&self) -> f64 {
        let count = self.request_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.total_latency_ms.load(Ordering::Relaxed) as f64 / count as f64
    }

    pub fn stats(&self) -> EndpointStats {
        EndpointStats {
            request_count: self.request_count.load(Ordering::Relaxed),
            error_count: self.error_count.load(Ordering::Relaxed),
            avg_latency_ms: self.avg_latency_ms(),
            max_latency_ms: self.max_latency_ms.load(Ordering::Relaxed),
        }
    }
}

/// Totals across all synthesis pipeline runs.
#[derive(Debug, Clone, Default)]
pub struct SynthesisMetrics {
    pub synthesis_count: Arc<AtomicU64>,
    pub total_chunks: Arc<AtomicU64>,
    pub total_chars: Arc<AtomicU64>,
    pub total_audio_ms: Arc<AtomicU64>,
}

impl SynthesisMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, chunks: u64, chars: u64, audio_ms: u64) {
        self.synthesis_count.fetch_add(1, Ordering::Relaxed);
        self.total_chunks.fetch_add(chunks, Ordering::Relaxed);
        self.total_chars.fetch_add(chars, Ordering::Relaxed);
        self.total_audio_ms.fetch_add(audio_ms, Ordering::Relaxed);
    }

    pub fn stats(&self) -> SynthesisStats {
        SynthesisStats {
            synthesis_count: self.synthesis_count.load(Ordering::Relaxed),
            total_chunks: self.total_chunks.load(Ordering::Relaxed),
            total_chars: self.total_chars.load(Ordering::Relaxed),
            total_audio_ms: self.total_audio_ms.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppMetrics {
    pub speech: EndpointMetrics,
    pub synthesis: SynthesisMetrics,
}

impl AppMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub timestamp: DateTime<Utc>,
    pub system: SystemMetrics,
    pub speech: EndpointStats,
    pub synthesis: SynthesisStats,
}

#[derive(Serialize)]
pub struct SystemMetrics {
    pub cpu_usage_percent: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub uptime_seconds: u64,
}

#[derive(Serialize)]
pub struct EndpointStats {
    pub request_count: u64,
    pub error_count: u64,
    pub avg_latency_ms: f64,
    pub max_latency_ms: u64,
}

#[derive(Serialize)]
pub struct SynthesisStats {
    pub synthesis_count: u64,
    pub total_chunks: u64,
    pub total_chars: u64,
    pub total_audio_ms: u64,
}
