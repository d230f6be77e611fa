//! Sequential chunk synthesis.

use tracing::debug;

use crate::engine::SynthesisEngine;
use crate::error::PipelineError;
use crate::segment::TextChunk;

/// Raw audio for one chunk, tagged with its position in the input.
#[derive(Debug, Clone)]
pub struct SynthesizedChunk {
    pub index: usize,
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Invoke the engine once per chunk, strictly in index order.
///
/// Ordering is a correctness requirement: assembly relies on receiving audio
/// in original textual order. The policy on engine failure is fail-fast —
/// the first error aborts the whole request with the offending chunk index,
/// and no further chunks are synthesized. Partial speech with arbitrary
/// sentences missing would be worse than a clear error.
///
/// A well-behaved engine reports one sample rate for every chunk; a mismatch
/// is a contract violation surfaced as [`PipelineError::InconsistentAudioFormat`].
pub fn synthesize_all(
    engine: &dyn SynthesisEngine,
    chunks: &[TextChunk],
    voice_id: &str,
    speed: f32,
) -> Result<Vec<SynthesizedChunk>, PipelineError> {
    let mut synthesized = Vec::with_capacity(chunks.len());
    let mut expected_rate: Option<u32> = None;

    for chunk in chunks {
        let audio = engine
            .synthesize(&chunk.content, voice_id, speed)
            .map_err(|source| PipelineError::ChunkSynthesis {
                index: chunk.index,
                source,
            })?;

        match expected_rate {
            None => expected_rate = Some(audio.sample_rate),
            Some(expected) if expected != audio.sample_rate => {
                return Err(PipelineError::InconsistentAudioFormat {
                    index: chunk.index,
                    expected,
                    got: audio.sample_rate,
                });
            }
            Some(_) => {}
        }

        debug!(
            index = chunk.index,
            chars = chunk.content.chars().count(),
            samples = audio.samples.len(),
            "chunk synthesized"
        );

        synthesized.push(SynthesizedChunk {
            index: chunk.index,
            samples: audio.samples,
            sample_rate: audio.sample_rate,
        });
    }

    Ok(synthesized)
}
