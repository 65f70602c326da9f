//! Additive soft mixing of integer sample sets
//!
//! Each contributing sample is folded into the running output with
//!
//! ```text
//! out = in + out - round(in * (out / max))
//! ```
//!
//! At low amplitudes this approximates plain addition. As `out` approaches
//! `max`, same-signed contributions are attenuated so the sum bends towards the
//! limit instead of wrapping. The product is evaluated in single precision and
//! rounded half-up, so results are reproducible bit-for-bit for a given fold
//! order.

use super::format::{AudioFormat, FormatError};

/// Fold one input sample into one output sample
///
/// The result is saturated to `[-max, max]`; inside that range it is exactly
/// the additive soft mix.
#[inline]
pub fn mix_sample(input: i32, output: i32, max: i32) -> i32 {
    let scaled = input as f32 * (output as f32 / max as f32);
    let rounded = (scaled + 0.5).floor() as i64;
    let mixed = input as i64 + output as i64 - rounded;
    mixed.clamp(-(max as i64), max as i64) as i32
}

/// Mix a collection of sample sets into one sample set
///
/// # Arguments
/// * `inputs` - Per-source sample sets, folded in iteration order. Empty sets
///   are skipped.
/// * `format` - Output format, supplies the maximum sample magnitude
/// * `output_sample_count` - Length of the produced sample set
///
/// # Returns
/// A vector of exactly `output_sample_count` samples. A source shorter than
/// the output only contributes over its own length; samples past
/// `output_sample_count` are ignored. With no contributing source the result
/// is all zeros.
///
/// # Example
/// ```
/// use confmix_core::audio::format::AudioFormat;
/// use confmix_core::audio::mixing::mix;
///
/// let a = vec![100, -200, 300];
/// let mixed = mix([&a[..]], &AudioFormat::pcm16_mono(), 4).unwrap();
/// assert_eq!(mixed, vec![100, -200, 300, 0]);
/// ```
pub fn mix<I>(
    inputs: I,
    format: &AudioFormat,
    output_sample_count: usize,
) -> Result<Vec<i32>, FormatError>
where
    I: IntoIterator,
    I::Item: AsRef<[i32]>,
{
    let max = format.validate()?;
    let mut output = vec![0i32; output_sample_count];

    for input in inputs {
        let input = input.as_ref();
        if input.is_empty() {
            continue;
        }

        for (out, &sample) in output.iter_mut().zip(input) {
            *out = mix_sample(sample, *out, max);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX16: i32 = i16::MAX as i32;

    #[test]
    fn test_first_contribution_is_identity() {
        for sample in [-MAX16, -1234, -1, 0, 1, 999, MAX16] {
            assert_eq!(mix_sample(sample, 0, MAX16), sample);
        }
    }

    #[test]
    fn test_two_sources_low_amplitude_near_sum() {
        // 1000 + 2000 - round(2000 * 1000 / 32767) = 3000 - 61
        assert_eq!(mix_sample(2000, 1000, MAX16), 2939);
    }

    #[test]
    fn test_positive_saturation_bends_to_max() {
        assert_eq!(mix_sample(MAX16, MAX16, MAX16), MAX16);
        assert_eq!(mix_sample(30000, 30000, MAX16), 32533);
    }

    #[test]
    fn test_negative_pair_is_clamped() {
        assert_eq!(mix_sample(-MAX16, -MAX16, MAX16), -MAX16);
    }

    #[test]
    fn test_empty_collection_yields_zeros() {
        let inputs: Vec<Vec<i32>> = Vec::new();
        let mixed = mix(&inputs, &AudioFormat::pcm16_mono(), 8).unwrap();
        assert_eq!(mixed, vec![0; 8]);
    }

    #[test]
    fn test_empty_sources_are_skipped() {
        let inputs = vec![vec![], vec![5, 6], vec![]];
        let mixed = mix(&inputs, &AudioFormat::pcm16_mono(), 2).unwrap();
        assert_eq!(mixed, vec![5, 6]);
    }

    #[test]
    fn test_short_source_only_touches_its_prefix() {
        let inputs = vec![vec![10, 10, 10, 10], vec![20]];
        let mixed = mix(&inputs, &AudioFormat::pcm16_mono(), 4).unwrap();
        assert_eq!(mixed, vec![30, 10, 10, 10]);
    }

    #[test]
    fn test_long_source_is_truncated() {
        let inputs = vec![vec![1, 2, 3, 4, 5]];
        let mixed = mix(&inputs, &AudioFormat::pcm16_mono(), 3).unwrap();
        assert_eq!(mixed, vec![1, 2, 3]);
    }

    #[test]
    fn test_unsupported_format_propagates() {
        let inputs = vec![vec![1]];
        let err = mix(&inputs, &AudioFormat::linear(24, 1), 1).unwrap_err();
        assert_eq!(err, FormatError::UnsupportedFormat { bits: 24 });
    }

    #[test]
    fn test_32_bit_does_not_wrap() {
        let inputs = vec![vec![i32::MAX], vec![i32::MAX], vec![-i32::MAX], vec![-i32::MAX]];
        let mixed = mix(&inputs, &AudioFormat::linear(32, 1), 1).unwrap();
        assert!(mixed[0] >= -i32::MAX);
    }
}
