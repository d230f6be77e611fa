//! The seam between the pipeline and the acoustic model.
//!
//! The pipeline never talks to a concrete model; it drives anything that
//! implements [`SynthesisEngine`]. The production implementation lives in
//! [`crate::piper`]; [`SilenceEngine`] is a deterministic stand-in used by
//! the test suites.

use thiserror::Error;

/// Failure inside the synthesis engine, opaque to the pipeline.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct SynthesisError(#[from] anyhow::Error);

impl SynthesisError {
    pub fn new(msg: impl Into<String>) -> Self {
        SynthesisError(anyhow::anyhow!(msg.into()))
    }
}

/// Raw audio produced for a single chunk of text.
#[derive(Debug, Clone)]
pub struct EngineAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// An opaque text-to-speech model.
///
/// Implementations may hold a stateful singleton model; they are responsible
/// for serializing access to it internally. `synthesize` is expected to be
/// deterministic for identical inputs, which makes a failed pipeline run
/// safely retriable by the caller. The `speed` factor is applied by the
/// engine, so downstream stages see an already speed-adjusted sample stream.
pub trait SynthesisEngine: Send + Sync {
    fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        speed: f32,
    ) -> Result<EngineAudio, SynthesisError>;
}

/// Deterministic engine that returns fixed-length silence for any input.
///
/// Exists so the pipeline can be exercised with exact assertions on sample
/// counts and chunk ordering without loading an acoustic model.
#[derive(Debug, Clone)]
pub struct SilenceEngine {
    pub samples_per_chunk: usize,
    pub sample_rate: u32,
}

impl Default for SilenceEngine {
    fn default() -> Self {
        Self {
            samples_per_chunk: 2400,
            sample_rate: 24_000,
        }
    }
}

impl SynthesisEngine for SilenceEngine {
    fn synthesize(
        &self,
        _text: &str,
        _voice_id: &str,
        _speed: f32,
    ) -> Result<EngineAudio, SynthesisError> {
        Ok(EngineAudio {
            samples: vec![0.0; self.samples_per_chunk],
            sample_rate: self.sample_rate,
        })
    }
}
