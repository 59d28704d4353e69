//! Audio output: at most one source is ever wired to the device.

use std::sync::Arc;
use std::time::Duration;

use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

use crate::decode::DecodedAudio;

/// Streams shared PCM starting at an arbitrary frame offset, so a seek is
/// an index computation rather than a re-decode.
pub struct PcmSource {
    samples: Arc<Vec<f32>>,
    cursor: usize,
    channels: u16,
    sample_rate: u32,
}

impl PcmSource {
    pub fn starting_at(audio: &DecodedAudio, seconds: f64) -> Self {
        let cursor = audio.frame_at(seconds) * audio.channels() as usize;
        Self {
            samples: Arc::clone(audio.samples()),
            cursor,
            channels: audio.channels(),
            sample_rate: audio.sample_rate(),
        }
    }

    fn remaining_frames(&self) -> usize {
        (self.samples.len() - self.cursor.min(self.samples.len())) / self.channels as usize
    }
}

impl Iterator for PcmSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.samples.get(self.cursor).copied();
        self.cursor += 1;
        sample
    }
}

impl Source for PcmSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f64(
            self.remaining_frames() as f64 / f64::from(self.sample_rate),
        ))
    }
}

/// The one connection between decoded audio and the output device.
///
/// `connect` tears down whatever was playing before wiring the new source,
/// so two calls in a row can never leave two audible sources behind.
pub struct AudioLink {
    stream: Option<(OutputStream, OutputStreamHandle)>,
    sink: Option<Sink>,
    device_failed: bool,
}

impl AudioLink {
    pub fn new() -> Self {
        Self {
            stream: None,
            sink: None,
            device_failed: false,
        }
    }

    fn ensure_stream(&mut self) -> Option<OutputStreamHandle> {
        if self.stream.is_none() && !self.device_failed {
            match OutputStream::try_default() {
                Ok(pair) => self.stream = Some(pair),
                Err(e) => {
                    // Keep the widget usable without a device; the
                    // transport still tracks position.
                    log::warn!("audio output unavailable: {e}");
                    self.device_failed = true;
                }
            }
        }
        self.stream.as_ref().map(|(_, handle)| handle.clone())
    }

    pub fn connect(&mut self, audio: &DecodedAudio, position: f64) {
        self.disconnect();
        let Some(handle) = self.ensure_stream() else {
            return;
        };
        match Sink::try_new(&handle) {
            Ok(sink) => {
                sink.append(PcmSource::starting_at(audio, position));
                sink.play();
                self.sink = Some(sink);
            }
            Err(e) => log::warn!("failed to open audio sink: {e}"),
        }
    }

    pub fn disconnect(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.sink.is_some()
    }
}

impl Default for AudioLink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_ramp(frames: usize, sample_rate: u32) -> DecodedAudio {
        let mut samples = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            samples.push(i as f32);
            samples.push(-(i as f32));
        }
        DecodedAudio::from_parts(samples, 2, sample_rate)
    }

    #[test]
    fn source_starts_at_the_requested_offset() {
        let audio = stereo_ramp(100, 10);
        // 3.0 s at 10 Hz -> frame 30.
        let mut src = PcmSource::starting_at(&audio, 3.0);
        assert_eq!(src.channels(), 2);
        assert_eq!(src.sample_rate(), 10);
        assert_eq!(src.next(), Some(30.0));
        assert_eq!(src.next(), Some(-30.0));
        assert_eq!(src.next(), Some(31.0));
    }

    #[test]
    fn source_is_finite_and_reports_remainder() {
        let audio = stereo_ramp(100, 10);
        let src = PcmSource::starting_at(&audio, 6.0);
        assert_eq!(src.total_duration(), Some(Duration::from_secs(4)));
        assert_eq!(src.count(), 40 * 2);
    }

    #[test]
    fn offset_past_the_end_yields_nothing() {
        let audio = stereo_ramp(10, 10);
        let mut src = PcmSource::starting_at(&audio, 99.0);
        assert_eq!(src.total_duration(), Some(Duration::ZERO));
        assert_eq!(src.next(), None);
    }
}
