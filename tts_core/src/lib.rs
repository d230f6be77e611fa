//! Chunked text-to-speech synthesis pipeline.
//!
//! Takes an arbitrarily long input string, splits it into model-sized chunks
//! along natural boundaries, drives the synthesis engine once per chunk in
//! textual order, stitches the per-chunk audio back together with silence
//! gaps, and wraps the result in the requested container format.
//!
//! The pipeline is a pure function of its inputs: configuration is passed in
//! per invocation, the engine is an injected [`engine::SynthesisEngine`], and
//! every intermediate value lives and dies within a single call.

pub mod assemble;
pub mod encode;
pub mod engine;
pub mod error;
pub mod piper;
pub mod segment;
pub mod synth;
pub mod voices;

use tracing::info;

pub use crate::assemble::AssembledAudio;
pub use crate::encode::{AudioFormat, PipelineResult};
pub use crate::engine::{EngineAudio, SilenceEngine, SynthesisEngine, SynthesisError};
pub use crate::error::PipelineError;
pub use crate::segment::TextChunk;
pub use crate::voices::VoiceRegistry;

pub const MIN_SPEED: f32 = 0.25;
pub const MAX_SPEED: f32 = 4.0;

/// Pipeline knobs, supplied by the boundary layer per invocation.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Hard reject inputs longer than this many characters.
    pub max_total_chars: usize,
    /// Soft ceiling per chunk; a lone oversized token is hard-cut.
    pub max_chars_per_chunk: usize,
    pub chunking_enabled: bool,
    /// Zero-sample gap inserted between adjacent chunks.
    pub silence_gap_ms: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_total_chars: 4000,
            max_chars_per_chunk: 1200,
            chunking_enabled: true,
            silence_gap_ms: 100,
        }
    }
}

/// One synthesis request as seen by the pipeline.
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: String,
    pub speed: f32,
    pub format: AudioFormat,
}

/// Run the full pipeline: validate, segment, synthesize, assemble, encode.
///
/// All validation errors surface before the first engine call; mid-pipeline
/// errors abort the request with no partial audio. Retrying is the caller's
/// job and means a fresh invocation from the start.
pub fn synthesize_speech(
    engine: &dyn SynthesisEngine,
    registry: &VoiceRegistry,
    config: &PipelineConfig,
    request: &SpeechRequest,
) -> Result<PipelineResult, PipelineError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    let char_count = text.chars().count();
    if char_count > config.max_total_chars {
        return Err(PipelineError::TextTooLarge {
            len: char_count,
            max: config.max_total_chars,
        });
    }
    if !request.speed.is_finite() || !(MIN_SPEED..=MAX_SPEED).contains(&request.speed) {
        return Err(PipelineError::InvalidSpeed(request.speed));
    }
    let voice_id = registry.resolve(&request.voice)?;

    let chunks = segment::segment(text, config.max_chars_per_chunk, config.chunking_enabled);
    let chunk_count = chunks.len();

    let synthesized = synth::synthesize_all(engine, &chunks, voice_id, request.speed)?;
    let audio = assemble::assemble(synthesized, config.silence_gap_ms);

    info!(
        chunk_count,
        char_count,
        samples = audio.samples.len(),
        sample_rate = audio.sample_rate,
        format = %request.format,
        "synthesis pipeline complete"
    );

    encode::encode(&audio, request.format, chunk_count, char_count)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::engine::EngineAudio;

    /// Counts engine invocations on top of fixed-length silence output.
    struct CountingEngine {
        inner: SilenceEngine,
        calls: AtomicUsize,
    }

    impl CountingEngine {
        fn new() -> Self {
            Self {
                inner: SilenceEngine {
                    samples_per_chunk: 1000,
                    sample_rate: 22_050,
                },
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl SynthesisEngine for CountingEngine {
        fn synthesize(
            &self,
            text: &str,
            voice_id: &str,
            speed: f32,
        ) -> Result<EngineAudio, SynthesisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.synthesize(text, voice_id, speed)
        }
    }

    fn request(text: &str) -> SpeechRequest {
        SpeechRequest {
            text: text.to_string(),
            voice: "alloy".to_string(),
            speed: 1.0,
            format: AudioFormat::Wav,
        }
    }

    #[test]
    fn short_input_synthesizes_as_a_single_chunk() {
        let engine = CountingEngine::new();
        let registry = VoiceRegistry::openai_defaults();
        let config = PipelineConfig::default();

        let result =
            synthesize_speech(&engine, &registry, &config, &request("Hello world.")).unwrap();

        assert_eq!(result.chunk_count, 1);
        assert_eq!(result.char_count, 12);
        assert_eq!(result.content_type, "audio/wav");
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
        // One chunk means no silence gap: header + 1000 samples.
        assert_eq!(result.payload.len(), 44 + 1000 * 2);
    }

    #[test]
    fn long_input_is_chunked_and_gapped() {
        let engine = CountingEngine::new();
        let registry = VoiceRegistry::openai_defaults();
        let config = PipelineConfig {
            max_chars_per_chunk: 1200,
            silence_gap_ms: 100,
            ..PipelineConfig::default()
        };

        let text = "The quick brown fox jumps over the lazy dog. ".repeat(66);
        let result = synthesize_speech(&engine, &registry, &config, &request(&text)).unwrap();

        assert_eq!(result.chunk_count, 3);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
        // 100 ms at 22050 Hz is 2205 silence samples per gap, two gaps.
        let expected_samples = 3 * 1000 + 2 * 2205;
        assert_eq!(result.payload.len(), 44 + expected_samples * 2);
    }

    #[test]
    fn empty_input_is_rejected_before_synthesis() {
        let engine = CountingEngine::new();
        let registry = VoiceRegistry::openai_defaults();
        let err = synthesize_speech(
            &engine,
            &registry,
            &PipelineConfig::default(),
            &request("   \n  "),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn oversized_input_is_rejected_before_synthesis() {
        let engine = CountingEngine::new();
        let registry = VoiceRegistry::openai_defaults();
        let config = PipelineConfig {
            max_total_chars: 100,
            ..PipelineConfig::default()
        };
        let err = synthesize_speech(&engine, &registry, &config, &request(&"a".repeat(200)))
            .unwrap_err();
        match err {
            PipelineError::TextTooLarge { len, max } => {
                assert_eq!(len, 200);
                assert_eq!(max, 100);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn out_of_range_speed_is_rejected_before_synthesis() {
        let engine = CountingEngine::new();
        let registry = VoiceRegistry::openai_defaults();
        let mut req = request("Hello");
        req.speed = 5.0;
        let err =
            synthesize_speech(&engine, &registry, &PipelineConfig::default(), &req).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidSpeed(s) if s == 5.0));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn boundary_speeds_are_accepted() {
        let engine = CountingEngine::new();
        let registry = VoiceRegistry::openai_defaults();
        for speed in [MIN_SPEED, 1.0, MAX_SPEED] {
            let mut req = request("Hello");
            req.speed = speed;
            synthesize_speech(&engine, &registry, &PipelineConfig::default(), &req)
                .unwrap_or_else(|e| panic!("speed {speed} rejected: {e}"));
        }
    }

    #[test]
    fn unknown_voice_is_rejected_before_synthesis() {
        let engine = CountingEngine::new();
        let registry = VoiceRegistry::openai_defaults();
        let mut req = request("Hello");
        req.voice = "castafiore".to_string();
        let err =
            synthesize_speech(&engine, &registry, &PipelineConfig::default(), &req).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownVoice(_)));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn chunking_disabled_makes_one_engine_call_even_for_long_text() {
        let engine = CountingEngine::new();
        let registry = VoiceRegistry::openai_defaults();
        let config = PipelineConfig {
            max_chars_per_chunk: 50,
            chunking_enabled: false,
            ..PipelineConfig::default()
        };
        let text = "word ".repeat(100);
        let result = synthesize_speech(&engine, &registry, &config, &request(&text)).unwrap();
        assert_eq!(result.chunk_count, 1);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn engine_failure_mid_stream_returns_no_payload() {
        struct FailAt {
            n: usize,
            calls: AtomicUsize,
        }
        impl SynthesisEngine for FailAt {
            fn synthesize(
                &self,
                _text: &str,
                _voice_id: &str,
                _speed: f32,
            ) -> Result<EngineAudio, SynthesisError> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == self.n {
                    return Err(SynthesisError::new("engine fault"));
                }
                Ok(EngineAudio {
                    samples: vec![0.0; 10],
                    sample_rate: 22_050,
                })
            }
        }

        let engine = FailAt {
            n: 2,
            calls: AtomicUsize::new(0),
        };
        let registry = VoiceRegistry::openai_defaults();
        let config = PipelineConfig {
            max_chars_per_chunk: 50,
            ..PipelineConfig::default()
        };
        let text = "A sentence that repeats itself for length. ".repeat(10);
        let err = synthesize_speech(&engine, &registry, &config, &request(&text)).unwrap_err();
        match err {
            PipelineError::ChunkSynthesis { index, .. } => assert_eq!(index, 2),
            other => panic!("unexpected error: {other}"),
        }
        // Fail-fast: exactly three calls, nothing past the failing chunk.
        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
    }
}
