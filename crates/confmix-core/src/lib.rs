//! Confmix Core - Conference mixing and ZRTP security events
//!
//! This library provides the media-plane core of a conference call: an
//! N-way additive mixer that produces one personalised mix per participant
//! (everyone except the listener), and the callback that turns ZRTP
//! key-agreement events into call-level security state.

pub mod audio;
pub mod config;
pub mod security;
pub mod stats;

pub use audio::{
    format::AudioFormat, mixer::MixerCore, signal::ToneGenerator, source::BufferedSource,
    stream::ListenerStream,
};
pub use config::{Config, MixerConfig};
pub use security::callback::{CallModel, KeyAgreementCallback, SecurityEventManager};
pub use stats::store::StatsStore;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default sample rate of simulated participants (narrowband telephony)
pub const DEFAULT_SAMPLE_RATE: u32 = 8000;

/// Default samples per mix cycle (20 ms at 8 kHz)
pub const DEFAULT_FRAME_SAMPLES: usize = 160;
