//! Confmix - N-way conference audio mixer
//!
//! This library re-exports the mixing engine, the ZRTP security-event
//! handling, configuration and statistics from `confmix-core`.

pub use confmix_core::audio;
pub use confmix_core::config;
pub use confmix_core::security;
pub use confmix_core::stats;

pub use confmix_core::{
    AudioFormat, BufferedSource, CallModel, Config, KeyAgreementCallback, ListenerStream,
    MixerConfig, MixerCore, SecurityEventManager, StatsStore, ToneGenerator,
};
pub use confmix_core::{DEFAULT_FRAME_SAMPLES, DEFAULT_SAMPLE_RATE, VERSION};
