//! Production synthesis engine backed by Piper ONNX voices.
//!
//! One model is loaded (and cached) per engine voice id; access to the
//! synthesizers is serialized behind a mutex since a single model instance
//! is not assumed safe for concurrent calls.

use std::{
    collections::HashMap,
    fs,
    path::Path,
    sync::Mutex,
};

use anyhow::Context;
use piper_rs::synth::{PiperSpeechStreamParallel, PiperSpeechSynthesizer};
use tracing::info;

use crate::engine::{EngineAudio, SynthesisEngine, SynthesisError};

struct CachedSynth {
    synth: PiperSpeechSynthesizer,
    sample_rate: u32,
}

pub struct PiperEngine {
    /// engine voice id -> model config path
    voice_configs: HashMap<String, String>,
    cache: Mutex<HashMap<String, CachedSynth>>,
}

impl PiperEngine {
    pub fn new(voice_configs: HashMap<String, String>) -> Self {
        Self {
            voice_configs,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Load every configured model up front instead of on first use.
    pub fn preload(&self) -> anyhow::Result<()> {
        for voice_id in self.voice_configs.keys() {
            let (_, sample_rate) = self
                .with_synth(voice_id, |_, _| Ok(Vec::new()))
                .map_err(|e| anyhow::anyhow!("preload of {voice_id} failed: {e}"))?;
            info!(voice = %voice_id, sample_rate, "voice model loaded");
        }
        Ok(())
    }

    /// Read the output sample rate from a Piper model config.
    fn read_sample_rate<P: AsRef<Path>>(cfg_path: P) -> anyhow::Result<u32> {
        let text = fs::read_to_string(cfg_path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", cfg_path.as_ref().display()))?;
        let json: serde_json::Value =
            serde_json::from_str(&text).with_context(|| "Config file is not valid JSON")?;

        let sample_rate = json
            .get("audio")
            .and_then(|a| a.get("sample_rate"))
            .and_then(|sr| sr.as_u64())
            .ok_or_else(|| anyhow::anyhow!("Missing or invalid 'audio.sample_rate' in config"))?;

        Ok(sample_rate as u32)
    }

    fn load_synth(&self, voice_id: &str) -> anyhow::Result<CachedSynth> {
        let cfg_path = self
            .voice_configs
            .get(voice_id)
            .ok_or_else(|| anyhow::anyhow!("no model configured for voice '{voice_id}'"))?;

        let sample_rate = Self::read_sample_rate(cfg_path)?;
        let model = piper_rs::from_config_path(Path::new(cfg_path))
            .map_err(|e| anyhow::anyhow!("piper load error: {e}"))?;
        let synth = PiperSpeechSynthesizer::new(model)
            .map_err(|e| anyhow::anyhow!("piper synthesizer error: {e}"))?;

        Ok(CachedSynth { synth, sample_rate })
    }

    /// Run `f` with the cached synthesizer for `voice_id`, loading it on
    /// first use. The cache lock is held for the duration of the call, which
    /// also serializes synthesis on the single model instance.
    fn with_synth<F>(&self, voice_id: &str, f: F) -> Result<(Vec<f32>, u32), SynthesisError>
    where
        F: FnOnce(&PiperSpeechSynthesizer, u32) -> anyhow::Result<Vec<f32>>,
    {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| SynthesisError::new("synthesizer lock poisoned"))?;

        if !cache.contains_key(voice_id) {
            let loaded = self.load_synth(voice_id).map_err(SynthesisError::from)?;
            cache.insert(voice_id.to_string(), loaded);
        }
        let cached = cache.get(voice_id).expect("just inserted");

        let samples = f(&cached.synth, cached.sample_rate).map_err(SynthesisError::from)?;
        Ok((samples, cached.sample_rate))
    }
}

impl SynthesisEngine for PiperEngine {
    fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        speed: f32,
    ) -> Result<EngineAudio, SynthesisError> {
        let (samples, sample_rate) = self.with_synth(voice_id, |synth, _| {
            let stream: PiperSpeechStreamParallel = synth
                .synthesize_parallel(text.to_string(), None)
                .map_err(|e| anyhow::anyhow!("piper synth error: {e}"))?;

            let mut samples: Vec<f32> = Vec::new();
            for part in stream {
                samples.extend(
                    part.map_err(|e| anyhow::anyhow!("piper part error: {e}"))?
                        .into_vec(),
                );
            }
            Ok(samples)
        })?;

        Ok(EngineAudio {
            samples: apply_speed(samples, speed),
            sample_rate,
        })
    }
}

/// Time-stretch by linear-interpolation resampling. Piper has no native
/// speed input, so a factor of 2.0 halves the sample count (faster speech)
/// and 0.5 doubles it. Deterministic for identical inputs.
fn apply_speed(samples: Vec<f32>, speed: f32) -> Vec<f32> {
    if samples.is_empty() || (speed - 1.0).abs() < 1e-6 {
        return samples;
    }

    let out_len = ((samples.len() as f64 / speed as f64).round() as usize).max(1);
    let step = samples.len() as f64 / out_len as f64;
    let last = samples.len() - 1;

    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * step;
        let base = (pos.floor() as usize).min(last);
        let frac = (pos - base as f64) as f32;
        let a = samples[base];
        let b = samples[(base + 1).min(last)];
        out.push(a + (b - a) * frac);
    }
    out
}
