//! Integer test tone generation
//!
//! Produces deterministic sine tones in the integer sample domain of an
//! [`AudioFormat`], used to simulate conference participants and to drive
//! tests and benchmarks of the mixer.

use super::format::{AudioFormat, FormatError};
use std::f64::consts::TAU;

/// Sine tone generator producing integer PCM
///
/// # Example
/// ```
/// use confmix_core::audio::format::AudioFormat;
/// use confmix_core::audio::signal::ToneGenerator;
///
/// let mut gen = ToneGenerator::new(440.0, 8000, 0.5, AudioFormat::pcm16_mono()).unwrap();
/// let frame = gen.next_frame(160);
/// assert_eq!(frame.len(), 160);
/// assert!(frame.iter().all(|s| s.abs() <= 16384));
/// ```
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    /// Tone frequency in Hz
    frequency: f64,
    /// Sample rate in Hz
    sample_rate: u32,
    /// Peak amplitude in sample units
    peak: f64,
    /// Samples generated since the last reset
    position: u64,
}

impl ToneGenerator {
    /// Create a tone generator
    ///
    /// # Arguments
    /// * `frequency` - Tone frequency in Hz
    /// * `sample_rate` - Sample rate in Hz
    /// * `amplitude` - Peak amplitude as a fraction of the format maximum,
    ///   clamped to 0.0..=1.0
    /// * `format` - Format whose maximum sample value scales the tone
    pub fn new(
        frequency: f64,
        sample_rate: u32,
        amplitude: f64,
        format: AudioFormat,
    ) -> Result<Self, FormatError> {
        let max = format.validate()?;
        Ok(Self {
            frequency,
            sample_rate: sample_rate.max(1),
            peak: amplitude.clamp(0.0, 1.0) * max as f64,
            position: 0,
        })
    }

    /// Get the next sample
    pub fn next_sample(&mut self) -> i32 {
        let t = self.position as f64 / self.sample_rate as f64;
        self.position += 1;
        (self.peak * (TAU * self.frequency * t).sin()).round() as i32
    }

    /// Generate the next `len` samples
    pub fn next_frame(&mut self, len: usize) -> Vec<i32> {
        (0..len).map(|_| self.next_sample()).collect()
    }

    /// Samples generated since creation or the last reset
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Restart the tone at phase zero
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Tone frequency in Hz
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Peak amplitude in sample units
    pub fn peak(&self) -> f64 {
        self.peak
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tone_starts_at_zero() {
        let mut gen = ToneGenerator::new(1000.0, 8000, 1.0, AudioFormat::pcm16_mono()).unwrap();
        assert_eq!(gen.next_sample(), 0);
    }

    #[test]
    fn test_quarter_period_hits_peak() {
        // 1 kHz at 8 kHz: sample 2 is a quarter period
        let mut gen = ToneGenerator::new(1000.0, 8000, 1.0, AudioFormat::pcm16_mono()).unwrap();
        let frame = gen.next_frame(3);
        assert_eq!(frame[2], 32767);
    }

    #[test]
    fn test_amplitude_is_clamped() {
        let gen = ToneGenerator::new(440.0, 48000, 3.0, AudioFormat::pcm16_mono()).unwrap();
        assert_relative_eq!(gen.peak(), 32767.0);
    }

    #[test]
    fn test_reset_repeats_frame() {
        let mut gen = ToneGenerator::new(300.0, 8000, 0.25, AudioFormat::pcm16_mono()).unwrap();
        let first = gen.next_frame(80);
        assert_eq!(gen.position(), 80);
        gen.reset();
        assert_eq!(gen.next_frame(80), first);
    }

    #[test]
    fn test_unusable_format_is_rejected() {
        assert!(ToneGenerator::new(440.0, 8000, 0.5, AudioFormat::linear(24, 1)).is_err());
    }
}
