//! Frequency analysis: fixed-size byte magnitudes, one per bin.
//!
//! Matches the byte-frequency contract of a Web Audio analyser node: a
//! Blackman-windowed forward FFT normalized by the window length, an
//! exponential smoothing filter over successive frames, then dB conversion
//! mapped onto `0..=255` between `min_db` and `max_db`. Feeding silence
//! (what the render loop does while paused) lets the bars decay through
//! the smoothing filter instead of freezing.

use std::f32::consts::TAU;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

#[derive(Debug, Clone, Copy)]
pub struct AnalyserConfig {
    /// Time-domain window length; bin count is half of this.
    pub fft_size: usize,
    /// Exponential smoothing constant applied between frames.
    pub smoothing: f32,
    /// Magnitude mapped to byte 0.
    pub min_db: f32,
    /// Magnitude mapped to byte 255.
    pub max_db: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 512,
            smoothing: 0.9,
            min_db: -90.0,
            max_db: -10.0,
        }
    }
}

pub struct SpectrumAnalyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
}

impl SpectrumAnalyser {
    pub fn new(config: AnalyserConfig) -> Self {
        let n = config.fft_size;
        let fft = FftPlanner::new().plan_fft_forward(n);
        // Blackman window.
        let window = (0..n)
            .map(|i| {
                let x = i as f32 / n as f32;
                0.42 - 0.5 * (TAU * x).cos() + 0.08 * (2.0 * TAU * x).cos()
            })
            .collect();
        Self {
            config,
            fft,
            window,
            scratch: vec![Complex::new(0.0, 0.0); n],
            smoothed: vec![0.0; n / 2],
            bytes: vec![0; n / 2],
        }
    }

    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.config.fft_size / 2
    }

    /// Forget all accumulated state, as when a new source is loaded.
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
        self.bytes.fill(0);
    }

    /// Latest byte magnitudes, one per frequency bin.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Analyse one time-domain window of `fft_size` mono frames and
    /// refresh the byte magnitudes.
    pub fn process(&mut self, frames: &[f32]) -> &[u8] {
        debug_assert_eq!(frames.len(), self.config.fft_size);
        for ((slot, sample), coeff) in self.scratch.iter_mut().zip(frames).zip(&self.window) {
            *slot = Complex::new(sample * coeff, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let n = self.config.fft_size as f32;
        let tau = self.config.smoothing;
        let span = self.config.max_db - self.config.min_db;
        for (k, (smooth, byte)) in self
            .smoothed
            .iter_mut()
            .zip(&mut self.bytes)
            .enumerate()
        {
            let magnitude = self.scratch[k].norm() / n;
            *smooth = tau * *smooth + (1.0 - tau) * magnitude;
            let db = 20.0 * smooth.max(f32::MIN_POSITIVE).log10();
            let scaled = 255.0 * (db - self.config.min_db) / span;
            *byte = scaled.clamp(0.0, 255.0) as u8;
        }
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_window(n: usize, cycles: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (TAU * cycles as f32 * i as f32 / n as f32).sin())
            .collect()
    }

    #[test]
    fn silence_stays_at_zero() {
        let mut a = SpectrumAnalyser::new(AnalyserConfig::default());
        let silence = vec![0.0; a.fft_size()];
        for _ in 0..5 {
            a.process(&silence);
        }
        assert!(a.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn sine_concentrates_in_its_bin() {
        let mut a = SpectrumAnalyser::new(AnalyserConfig::default());
        let window = sine_window(a.fft_size(), 8);
        // Run to steady state through the smoothing filter.
        for _ in 0..60 {
            a.process(&window);
        }
        let bytes = a.bytes();
        let peak = bytes
            .iter()
            .enumerate()
            .max_by_key(|&(_, &b)| b)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 8);
        assert!(bytes[8] > 200, "peak bin too quiet: {}", bytes[8]);
        // Far-away bins carry only leakage.
        assert!(bytes[128] < bytes[8] / 2);
    }

    #[test]
    fn magnitudes_decay_after_the_signal_stops() {
        let mut a = SpectrumAnalyser::new(AnalyserConfig::default());
        let window = sine_window(a.fft_size(), 8);
        for _ in 0..60 {
            a.process(&window);
        }
        let loud = a.bytes()[8];
        let silence = vec![0.0; a.fft_size()];
        let mut last = loud;
        for _ in 0..80 {
            a.process(&silence);
            let now = a.bytes()[8];
            assert!(now <= last);
            last = now;
        }
        assert!(last < loud / 2, "smoothing never decayed: {last} vs {loud}");
    }

    #[test]
    fn reset_clears_accumulated_state() {
        let mut a = SpectrumAnalyser::new(AnalyserConfig::default());
        let window = sine_window(a.fft_size(), 4);
        for _ in 0..10 {
            a.process(&window);
        }
        assert!(a.bytes().iter().any(|&b| b > 0));
        a.reset();
        assert!(a.bytes().iter().all(|&b| b == 0));
    }
}
