//! PCM format descriptors and sample/byte conversion
//!
//! An [`AudioFormat`] fixes the bit depth, byte order and channel count of the
//! integer samples flowing through the mixer. It determines:
//! - the maximum sample magnitude used by the mixing formula ([`AudioFormat::max_value`])
//! - the byte layout produced for output sinks ([`encode`])
//! - the byte layout accepted from input sources ([`decode`])

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by format lookups and sample conversion
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Unsupported sample size: {bits} bits")]
    UnsupportedFormat { bits: u16 },

    #[error("Unsupported operation: {operation} for {bits}-bit samples")]
    UnsupportedOperation {
        operation: &'static str,
        bits: u16,
    },

    #[error("Format maximum sample value must be positive, got {0}")]
    NonPositiveMaxValue(i32),

    #[error("Byte buffer of length {len} is not a multiple of {bytes_per_sample}")]
    TruncatedSample { len: usize, bytes_per_sample: usize },
}

/// Byte order of encoded samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    Little,
    Big,
}

/// Sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Signed linear PCM
    SignedLinear,
}

/// Immutable description of an integer PCM stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Sample size in bits (8, 16 or 32 are usable)
    pub sample_size_bits: u16,
    /// Byte order of the encoded samples
    pub byte_order: ByteOrder,
    /// Number of interleaved channels
    pub channels: u16,
    /// Sample encoding
    pub encoding: Encoding,
}

impl AudioFormat {
    /// Signed little-endian linear PCM with the given depth and channel count
    pub fn linear(sample_size_bits: u16, channels: u16) -> Self {
        Self {
            sample_size_bits,
            byte_order: ByteOrder::Little,
            channels,
            encoding: Encoding::SignedLinear,
        }
    }

    /// 16-bit little-endian mono, the usual telephony mix format
    pub fn pcm16_mono() -> Self {
        Self::linear(16, 1)
    }

    /// Maximum representable sample magnitude for this bit depth
    ///
    /// Only 8, 16 and 32-bit depths are supported. 24-bit and every other
    /// depth fail with [`FormatError::UnsupportedFormat`].
    ///
    /// # Example
    /// ```
    /// use confmix_core::audio::format::AudioFormat;
    ///
    /// assert_eq!(AudioFormat::pcm16_mono().max_value(), Ok(i16::MAX as i32));
    /// assert!(AudioFormat::linear(24, 1).max_value().is_err());
    /// ```
    pub fn max_value(&self) -> Result<i32, FormatError> {
        match self.sample_size_bits {
            8 => Ok(i8::MAX as i32),
            16 => Ok(i16::MAX as i32),
            32 => Ok(i32::MAX),
            bits => Err(FormatError::UnsupportedFormat { bits }),
        }
    }

    /// Check that this format can drive the mixing formula
    pub fn validate(&self) -> Result<i32, FormatError> {
        let max = self.max_value()?;
        if max <= 0 {
            return Err(FormatError::NonPositiveMaxValue(max));
        }
        Ok(max)
    }

    /// Size of one encoded sample in bytes
    pub fn bytes_per_sample(&self) -> usize {
        (self.sample_size_bits as usize).div_ceil(8)
    }

    fn check_codec(&self, operation: &'static str) -> Result<usize, FormatError> {
        let unsupported = FormatError::UnsupportedOperation {
            operation,
            bits: self.sample_size_bits,
        };
        if self.byte_order != ByteOrder::Little {
            return Err(unsupported);
        }
        match self.sample_size_bits {
            16 => Ok(2),
            32 => Ok(4),
            _ => Err(unsupported),
        }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::pcm16_mono()
    }
}

/// Serialize integer samples into the byte layout of `format`
///
/// Supports signed 16-bit and 32-bit little-endian output. Samples are
/// truncated to the target width. Any other layout fails with
/// [`FormatError::UnsupportedOperation`].
pub fn encode(samples: &[i32], format: &AudioFormat) -> Result<Vec<u8>, FormatError> {
    let width = format.check_codec("encode")?;
    let mut output = Vec::with_capacity(samples.len() * width);

    match width {
        2 => {
            for &sample in samples {
                output.extend_from_slice(&(sample as i16).to_le_bytes());
            }
        }
        _ => {
            for &sample in samples {
                output.extend_from_slice(&sample.to_le_bytes());
            }
        }
    }

    Ok(output)
}

/// Parse bytes in the layout of `format` into integer samples
///
/// The inverse of [`encode`], used by input sources that receive decoded
/// audio as raw bytes.
pub fn decode(bytes: &[u8], format: &AudioFormat) -> Result<Vec<i32>, FormatError> {
    let width = format.check_codec("decode")?;
    if bytes.len() % width != 0 {
        return Err(FormatError::TruncatedSample {
            len: bytes.len(),
            bytes_per_sample: width,
        });
    }

    let samples = match width {
        2 => bytes
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]) as i32)
            .collect(),
        _ => bytes
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    };

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_value_supported_depths() {
        assert_eq!(AudioFormat::linear(8, 1).max_value(), Ok(127));
        assert_eq!(AudioFormat::linear(16, 1).max_value(), Ok(32767));
        assert_eq!(AudioFormat::linear(32, 2).max_value(), Ok(2147483647));
    }

    #[test]
    fn test_max_value_rejects_24_bit() {
        assert_eq!(
            AudioFormat::linear(24, 1).max_value(),
            Err(FormatError::UnsupportedFormat { bits: 24 })
        );
    }

    #[test]
    fn test_max_value_rejects_odd_depths() {
        for bits in [0, 1, 12, 20, 64] {
            assert!(
                matches!(
                    AudioFormat::linear(bits, 1).max_value(),
                    Err(FormatError::UnsupportedFormat { .. })
                ),
                "{} bits should be rejected",
                bits
            );
        }
    }

    #[test]
    fn test_encode_16_bit_little_endian() {
        let bytes = encode(&[1, -1, 0x1234], &AudioFormat::pcm16_mono()).unwrap();
        assert_eq!(bytes, vec![0x01, 0x00, 0xFF, 0xFF, 0x34, 0x12]);
    }

    #[test]
    fn test_encode_32_bit_little_endian() {
        let bytes = encode(&[0x0102_0304, -2], &AudioFormat::linear(32, 1)).unwrap();
        assert_eq!(bytes, vec![0x04, 0x03, 0x02, 0x01, 0xFE, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_encode_rejects_8_and_24_bit() {
        for bits in [8, 24] {
            let err = encode(&[0, 1], &AudioFormat::linear(bits, 1)).unwrap_err();
            assert!(matches!(err, FormatError::UnsupportedOperation { .. }));
        }
    }

    #[test]
    fn test_encode_rejects_big_endian() {
        let format = AudioFormat {
            byte_order: ByteOrder::Big,
            ..AudioFormat::pcm16_mono()
        };
        assert!(encode(&[1], &format).is_err());
    }

    #[test]
    fn test_decode_matches_encoded_layout() {
        let format = AudioFormat::pcm16_mono();
        let samples = decode(&[0x01, 0x00, 0xFF, 0xFF], &format).unwrap();
        assert_eq!(samples, vec![1, -1]);
    }

    #[test]
    fn test_decode_rejects_partial_sample() {
        let err = decode(&[0x01, 0x00, 0x02], &AudioFormat::pcm16_mono()).unwrap_err();
        assert_eq!(
            err,
            FormatError::TruncatedSample {
                len: 3,
                bytes_per_sample: 2
            }
        );
    }

    #[test]
    fn test_bytes_per_sample() {
        assert_eq!(AudioFormat::linear(8, 1).bytes_per_sample(), 1);
        assert_eq!(AudioFormat::linear(16, 1).bytes_per_sample(), 2);
        assert_eq!(AudioFormat::linear(24, 1).bytes_per_sample(), 3);
    }

    #[test]
    fn test_format_serde_names() {
        let json = serde_json::to_string(&AudioFormat::pcm16_mono()).unwrap();
        assert!(json.contains("\"little\""));
        assert!(json.contains("\"signed_linear\""));
    }
}
