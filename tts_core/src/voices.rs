//! Public voice names and their engine-native identifiers.

use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceEntry {
    /// Engine-native identifier handed to the synthesis engine.
    pub voice_id: String,
    /// Model config path for engines that load per-voice models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Static map from public voice names to engine voice identifiers.
#[derive(Debug, Clone, Default)]
pub struct VoiceRegistry {
    entries: HashMap<String, VoiceEntry>,
}

impl VoiceRegistry {
    pub fn new(entries: HashMap<String, VoiceEntry>) -> Self {
        Self { entries }
    }

    /// The OpenAI-compatible voice set mapped onto the bundled model voices.
    pub fn openai_defaults() -> Self {
        let mapping = [
            ("alloy", "expr-voice-5-m"),
            ("echo", "expr-voice-2-m"),
            ("fable", "expr-voice-3-f"),
            ("onyx", "expr-voice-4-m"),
            ("nova", "expr-voice-5-f"),
            ("shimmer", "expr-voice-2-f"),
        ];
        let entries = mapping
            .into_iter()
            .map(|(public, native)| {
                (
                    public.to_string(),
                    VoiceEntry {
                        voice_id: native.to_string(),
                        config: None,
                        display_name: None,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Load from a voices map JSON file.
    ///
    /// Each key is a public voice name; the value is either an object
    /// (`{ "voice_id": ..., "config": ... }`) or, in the short form, a bare
    /// string holding the engine voice id.
    pub fn from_mapfile<P: AsRef<Path>>(p: P) -> anyhow::Result<Self> {
        let text = fs::read_to_string(p.as_ref())
            .with_context(|| format!("Failed to load {}", p.as_ref().display()))?;
        let json: serde_json::Value =
            serde_json::from_str(&text).with_context(|| "voices map is not valid JSON")?;

        let obj = json
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("voices map must be a JSON object"))?;

        let mut entries = HashMap::new();
        for (name, value) in obj {
            let entry = match value {
                serde_json::Value::String(voice_id) => VoiceEntry {
                    voice_id: voice_id.clone(),
                    config: None,
                    display_name: None,
                },
                serde_json::Value::Object(_) => serde_json::from_value(value.clone())
                    .with_context(|| format!("invalid entry for voice {name}"))?,
                _ => {
                    return Err(anyhow::anyhow!(
                        "invalid entry for voice {} (expected string or object)",
                        name
                    ));
                }
            };
            entries.insert(name.clone(), entry);
        }

        Ok(Self { entries })
    }

    /// Map a public voice name to its engine identifier.
    pub fn resolve(&self, public_name: &str) -> Result<&str, PipelineError> {
        self.entries
            .get(public_name)
            .map(|e| e.voice_id.as_str())
            .ok_or_else(|| PipelineError::UnknownVoice(public_name.to_string()))
    }

    /// Sorted public names, for listing endpoints.
    pub fn public_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VoiceEntry)> {
        self.entries.iter()
    }

    /// Engine voice id -> model config path, for engines that load a model
    /// per voice. Entries without a config path are skipped.
    pub fn voice_configs(&self) -> HashMap<String, String> {
        self.entries
            .values()
            .filter_map(|e| e.config.clone().map(|cfg| (e.voice_id.clone(), cfg)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
