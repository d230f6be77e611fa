use thiserror::Error;

use crate::encode::AudioFormat;
use crate::engine::SynthesisError;

/// Everything that can go wrong inside one pipeline invocation.
///
/// Validation variants are raised before any synthesis work starts; the
/// remaining variants abort an in-progress request. No partial audio is ever
/// returned alongside an error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input text is empty")]
    EmptyInput,

    #[error("input text too long: {len} characters (maximum {max})")]
    TextTooLarge { len: usize, max: usize },

    #[error("unknown voice: {0}")]
    UnknownVoice(String),

    #[error("speed {0} outside supported range {min}..={max}", min = crate::MIN_SPEED, max = crate::MAX_SPEED)]
    InvalidSpeed(f32),

    #[error("synthesis failed on chunk {index}: {source}")]
    ChunkSynthesis {
        index: usize,
        source: SynthesisError,
    },

    #[error("chunk {index} reported sample rate {got}, expected {expected}")]
    InconsistentAudioFormat {
        index: usize,
        expected: u32,
        got: u32,
    },

    #[error("no encoder available for format {0}")]
    UnsupportedFormat(AudioFormat),

    #[error("audio encoding failed: {0}")]
    Encode(String),
}

impl PipelineError {
    /// True for errors detected before any engine call is made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PipelineError::EmptyInput
                | PipelineError::TextTooLarge { .. }
                | PipelineError::UnknownVoice(_)
                | PipelineError::InvalidSpeed(_)
        )
    }
}
