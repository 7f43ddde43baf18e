//! Audio device access
//!
//! Capture and playback are exposed as traits so the dialogue engine can be
//! exercised against fakes without audio hardware. The cpal-backed
//! implementations live here alongside WAV/MP3 format helpers.

mod capture;
mod playback;

pub use capture::{CaptureSource, CaptureStream, MicSource};
pub use playback::{PlaybackSink, SpeakerSink, decode_mp3};

use crate::{Error, Result};

/// Fixed-size block of raw audio produced by the capture device
///
/// Contents are little-endian PCM at the configured sample rate, channel
/// count, and bit depth. Frames are owned by the producer until handed to
/// the transcript channel.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw PCM bytes
    pub bytes: Vec<u8>,
}

/// Convert f32 samples to WAV bytes
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            writer
                .write_sample(f32_to_i16(sample))
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Convert an f32 sample in [-1.0, 1.0] to i16
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_magic() {
        let samples = vec![0.0f32, 0.5, -0.5, 0.25];
        let wav = samples_to_wav(&samples, 16_000).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert!(wav.len() > 44);
    }

    #[test]
    fn sample_conversion_clamps() {
        assert_eq!(f32_to_i16(2.0), 32767);
        assert_eq!(f32_to_i16(-2.0), -32768);
        assert_eq!(f32_to_i16(0.0), 0);
    }
}
