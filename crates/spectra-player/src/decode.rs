//! Decoding raw audio bytes into playable PCM.
//!
//! Both file paths (drop and picker) reduce to a byte buffer before they
//! get here. The whole stream is drained up front so the duration is exact
//! and later seeks are a matter of indexing, not re-decoding.

use std::io::Cursor;
use std::sync::Arc;

use rodio::{Decoder, Source};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unsupported or corrupt audio data: {0}")]
    Unsupported(#[from] rodio::decoder::DecoderError),
    #[error("audio stream contained no samples")]
    Empty,
}

/// A decoded source: interleaved f32 PCM with a fixed duration. Cheap to
/// clone; the sample buffer is shared.
#[derive(Clone, Debug)]
pub struct DecodedAudio {
    samples: Arc<Vec<f32>>,
    channels: u16,
    sample_rate: u32,
}

impl DecodedAudio {
    pub fn from_parts(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples: Arc::new(samples),
            channels: channels.max(1),
            sample_rate: sample_rate.max(1),
        }
    }

    pub fn samples(&self) -> &Arc<Vec<f32>> {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Frame index for an offset in seconds, clamped to the track.
    pub fn frame_at(&self, seconds: f64) -> usize {
        let frame = (seconds.max(0.0) * f64::from(self.sample_rate)) as usize;
        frame.min(self.frames())
    }

    /// Fill `out` with mono frames (channel average) ending at `seconds`,
    /// zero-padded on the left when the track has not played that long yet.
    pub fn mono_window(&self, seconds: f64, out: &mut [f32]) {
        let end = self.frame_at(seconds);
        let start = end.saturating_sub(out.len());
        let pad = out.len() - (end - start);
        out[..pad].fill(0.0);

        let channels = self.channels as usize;
        for (slot, frame) in out[pad..].iter_mut().zip(start..end) {
            let base = frame * channels;
            let sum: f32 = self.samples[base..base + channels].iter().sum();
            *slot = sum / channels as f32;
        }
    }
}

/// Decode a raw byte buffer into PCM. Fails loudly on malformed data so
/// the UI can report it instead of staying disabled.
///
/// # Errors
/// `Unsupported` when the container/codec is unrecognized or corrupt,
/// `Empty` when it decodes to zero samples.
pub fn decode_bytes(bytes: Vec<u8>) -> Result<DecodedAudio, DecodeError> {
    let decoder = Decoder::new(Cursor::new(bytes))?;
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<f32> = decoder.convert_samples().collect();
    if samples.is_empty() {
        return Err(DecodeError::Empty);
    }
    log::debug!(
        "decoded {} frames, {} ch @ {} Hz",
        samples.len() / channels.max(1) as usize,
        channels,
        sample_rate
    );
    Ok(DecodedAudio::from_parts(samples, channels, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One second of a 440 Hz sine, mono 16-bit WAV, built in memory.
    pub(crate) fn wav_fixture(sample_rate: u32, seconds: f64) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            let frames = (seconds * f64::from(sample_rate)) as usize;
            for i in 0..frames {
                let t = i as f64 / f64::from(sample_rate);
                let v = (t * 440.0 * std::f64::consts::TAU).sin();
                writer.write_sample((v * 0.5 * f64::from(i16::MAX)) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decodes_wav_with_exact_duration() {
        let audio = decode_bytes(wav_fixture(8000, 2.0)).unwrap();
        assert_eq!(audio.channels(), 1);
        assert_eq!(audio.sample_rate(), 8000);
        assert_eq!(audio.frames(), 16000);
        assert!((audio.duration() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_bytes_are_an_error() {
        let err = decode_bytes(vec![0x00, 0x01, 0x02, 0x03]).unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported(_)));
    }

    #[test]
    fn frame_at_clamps() {
        let audio = DecodedAudio::from_parts(vec![0.0; 100], 2, 10);
        assert_eq!(audio.frames(), 50);
        assert_eq!(audio.frame_at(-1.0), 0);
        assert_eq!(audio.frame_at(2.0), 20);
        assert_eq!(audio.frame_at(1e9), 50);
    }

    #[test]
    fn mono_window_averages_and_pads() {
        // Two channels, constant 0.2 / 0.6 -> mono 0.4.
        let frames = 8;
        let mut samples = Vec::new();
        for _ in 0..frames {
            samples.push(0.2);
            samples.push(0.6);
        }
        let audio = DecodedAudio::from_parts(samples, 2, 8);

        let mut out = [1.0f32; 4];
        audio.mono_window(0.5, &mut out); // 4 frames in
        for v in out {
            assert!((v - 0.4).abs() < 1e-6);
        }

        // Near the start the left side pads with silence.
        let mut out = [1.0f32; 4];
        audio.mono_window(0.25, &mut out); // only 2 frames available
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.0);
        assert!((out[2] - 0.4).abs() < 1e-6);
        assert!((out[3] - 0.4).abs() < 1e-6);
    }
}
