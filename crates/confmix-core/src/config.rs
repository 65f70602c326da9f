//! Persistent mixer configuration
//!
//! Stores the conference output format, buffering sizes, simulator tone
//! settings and the security message texts in a JSON file. Every field has a
//! default, so partial files are accepted.

use crate::audio::format::AudioFormat;
use crate::security::messages::SecurityMessages;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_frame_samples() -> usize {
    crate::DEFAULT_FRAME_SAMPLES
}

fn default_source_capacity() -> usize {
    crate::DEFAULT_FRAME_SAMPLES * 8
}

fn default_handoff_capacity() -> usize {
    4
}

fn default_sample_rate() -> u32 {
    crate::DEFAULT_SAMPLE_RATE
}

fn default_tone_amplitude() -> f64 {
    0.25
}

fn default_base_frequency() -> f64 {
    300.0
}

/// Mixing pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerConfig {
    /// Output format shared by every listener stream
    #[serde(default)]
    pub format: AudioFormat,
    /// Samples each buffered source contributes per cycle
    #[serde(default = "default_frame_samples")]
    pub frame_samples: usize,
    /// Ring buffer capacity of each buffered source, in samples
    #[serde(default = "default_source_capacity")]
    pub source_capacity: usize,
    /// Queue length of channel transfer handlers
    #[serde(default = "default_handoff_capacity")]
    pub handoff_capacity: usize,
    /// Sample rate of simulated participants in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Peak of simulated tones as a fraction of full scale
    #[serde(default = "default_tone_amplitude")]
    pub tone_amplitude: f64,
    /// Tone of the first simulated participant in Hz; later ones step up
    #[serde(default = "default_base_frequency")]
    pub base_frequency: f64,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            format: AudioFormat::default(),
            frame_samples: default_frame_samples(),
            source_capacity: default_source_capacity(),
            handoff_capacity: default_handoff_capacity(),
            sample_rate: default_sample_rate(),
            tone_amplitude: default_tone_amplitude(),
            base_frequency: default_base_frequency(),
        }
    }
}

/// Complete configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mixer: MixerConfig,
    #[serde(default)]
    pub messages: SecurityMessages,
}

impl Config {
    /// Load config from `path`, falling back to defaults on any error
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "Loaded config from disk");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save config to `path`, creating parent directories if needed
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Config saved to disk");
        Ok(())
    }
}
