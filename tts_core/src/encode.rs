//! Container encoding for the assembled PCM stream.

use std::fmt;
use std::io::Cursor;

use serde::Deserialize;

use crate::assemble::AssembledAudio;
use crate::error::PipelineError;

/// Supported output containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    #[default]
    Mp3,
}

impl AudioFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Terminal artifact of one pipeline run. Immutable once produced.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub payload: Vec<u8>,
    pub content_type: &'static str,
    pub chunk_count: usize,
    pub char_count: usize,
    pub duration_ms: u64,
}

/// Wrap the PCM stream in the requested container.
///
/// WAV is lossless 16-bit PCM; MP3 requires the `mp3` feature and fails with
/// [`PipelineError::UnsupportedFormat`] when compiled out — never a silent
/// fallback to another container.
pub fn encode(
    audio: &AssembledAudio,
    format: AudioFormat,
    chunk_count: usize,
    char_count: usize,
) -> Result<PipelineResult, PipelineError> {
    let payload = match format {
        AudioFormat::Wav => encode_wav(&audio.samples, audio.sample_rate)?,
        AudioFormat::Mp3 => encode_mp3(&audio.samples, audio.sample_rate)?,
    };

    Ok(PipelineResult {
        payload,
        content_type: format.content_type(),
        chunk_count,
        char_count,
        duration_ms: audio.duration_ms(),
    })
}

/// Encode mono f32 PCM as a 16-bit RIFF/WAV byte payload.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, PipelineError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    // 44-byte RIFF header plus two bytes per sample.
    let mut cursor = Cursor::new(Vec::<u8>::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| PipelineError::Encode(format!("wav writer: {e}")))?;
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(v)
                .map_err(|e| PipelineError::Encode(format!("wav sample: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| PipelineError::Encode(format!("wav finalize: {e}")))?;
    }

    Ok(cursor.into_inner())
}

/// Encode mono f32 PCM as MP3 at 192 kbps.
#[cfg(feature = "mp3")]
pub fn encode_mp3(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, PipelineError> {
    use mp3lame_encoder::{Builder, FlushNoGap, MonoPcm};

    let err = |msg: String| PipelineError::Encode(msg);

    let mut builder = Builder::new().ok_or_else(|| err("lame init failed".into()))?;
    builder
        .set_num_channels(1)
        .map_err(|e| err(format!("lame channels: {e:?}")))?;
    builder
        .set_sample_rate(sample_rate)
        .map_err(|e| err(format!("lame sample rate: {e:?}")))?;
    builder
        .set_brate(mp3lame_encoder::Bitrate::Kbps192)
        .map_err(|e| err(format!("lame bitrate: {e:?}")))?;
    builder
        .set_quality(mp3lame_encoder::Quality::Best)
        .map_err(|e| err(format!("lame quality: {e:?}")))?;
    let mut encoder = builder
        .build()
        .map_err(|e| err(format!("lame build: {e:?}")))?;

    let pcm_i16: Vec<i16> = samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect();
    let pcm = MonoPcm(&pcm_i16);

    let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(pcm_i16.len()));
    let encoded = encoder
        .encode(pcm, out.spare_capacity_mut())
        .map_err(|e| err(format!("lame encode: {e:?}")))?;
    // SAFETY: `encode` initialized exactly `encoded` bytes of spare capacity.
    unsafe { out.set_len(out.len() + encoded) };

    let flushed = encoder
        .flush::<FlushNoGap>(out.spare_capacity_mut())
        .map_err(|e| err(format!("lame flush: {e:?}")))?;
    // SAFETY: `flush` initialized exactly `flushed` bytes of spare capacity.
    unsafe { out.set_len(out.len() + flushed) };

    Ok(out)
}

#[cfg(not(feature = "mp3"))]
pub fn encode_mp3(_samples: &[f32], _sample_rate: u32) -> Result<Vec<u8>, PipelineError> {
    Err(PipelineError::UnsupportedFormat(AudioFormat::Mp3))
}
