//! Sample-accurate concatenation of per-chunk audio.

use crate::synth::SynthesizedChunk;

/// The single continuous PCM stream for one request.
#[derive(Debug, Clone)]
pub struct AssembledAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AssembledAudio {
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }
}

/// Number of zero samples for a silence gap of `gap_ms` at `sample_rate`.
pub fn silence_samples(gap_ms: u32, sample_rate: u32) -> usize {
    ((gap_ms as u64 * sample_rate as u64 + 500) / 1000) as usize
}

/// Concatenate chunk audio in index order, inserting `silence_gap_ms` of
/// zero samples between adjacent chunks. No gap is added before the first
/// or after the last chunk; a single chunk passes through untouched.
///
/// All chunks share one sample rate (enforced upstream); no resampling
/// happens here. Total length is `sum(chunk samples) + (n-1) * gap samples`.
pub fn assemble(chunks: Vec<SynthesizedChunk>, silence_gap_ms: u32) -> AssembledAudio {
    let sample_rate = chunks.first().map(|c| c.sample_rate).unwrap_or(0);

    if chunks.len() == 1 {
        let chunk = chunks.into_iter().next().expect("one chunk");
        return AssembledAudio {
            samples: chunk.samples,
            sample_rate,
        };
    }

    let gap = silence_samples(silence_gap_ms, sample_rate);
    let total: usize =
        chunks.iter().map(|c| c.samples.len()).sum::<usize>() + gap * chunks.len().saturating_sub(1);

    let mut samples = Vec::with_capacity(total);
    let last = chunks.len().saturating_sub(1);
    for (i, chunk) in chunks.into_iter().enumerate() {
        samples.extend(chunk.samples);
        if i < last {
            samples.extend(std::iter::repeat(0.0f32).take(gap));
        }
    }

    AssembledAudio {
        samples,
        sample_rate,
    }
}
