//! Widget tuning knobs, fixed at construction.

use eframe::egui::Color32;

use crate::analyser::AnalyserConfig;

#[derive(Debug, Clone, Copy)]
pub struct PlayerConfig {
    pub analyser: AnalyserConfig,
    pub track_height: f32,
    pub scrubber_radius: f32,
    /// Height of the spectrum surface; bar heights peak at half a byte.
    pub spectrum_height: f32,
    pub bar_width_factor: f32,
    pub bar_gap: f32,
    pub track_color: Color32,
    pub progress_color: Color32,
    pub scrubber_color: Color32,
    pub spectrum_backdrop: Color32,
    pub drop_hint_color: Color32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            analyser: AnalyserConfig::default(),
            track_height: 6.0,
            scrubber_radius: 7.0,
            spectrum_height: 128.0,
            bar_width_factor: 2.5,
            bar_gap: 1.0,
            track_color: Color32::from_rgb(60, 60, 66),
            progress_color: Color32::from_rgb(120, 220, 140),
            scrubber_color: Color32::from_rgb(235, 235, 235),
            spectrum_backdrop: Color32::BLACK,
            drop_hint_color: Color32::from_rgb(120, 220, 140),
        }
    }
}
