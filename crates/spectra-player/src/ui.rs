//! Drawing and pointer handling, in painter terms.

use eframe::egui::{self, Color32, CornerRadius, Pos2, Rect, Sense, StrokeKind};

use crate::app::{DragState, PlayerApp};

/// Convert a scrubber pixel offset on a track to a playback time.
pub(crate) fn time_for_offset(offset_px: f32, track_width: f32, duration: f64) -> f64 {
    if track_width <= 0.0 {
        0.0
    } else {
        f64::from(offset_px / track_width) * duration
    }
}

impl PlayerApp {
    pub(crate) fn draw_widget(&mut self, ui: &mut egui::Ui, hovering_files: bool) {
        self.draw_header(ui);
        ui.add_space(4.0);
        self.draw_transport(ui);
        ui.add_space(8.0);
        self.draw_spectrum(ui);
        if let Some(message) = self.load_error.clone() {
            ui.add_space(4.0);
            ui.colored_label(Color32::from_rgb(230, 90, 90), message);
        }
        if hovering_files {
            self.draw_drop_hint(ui);
        }
    }

    fn draw_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!self.busy(), egui::Button::new("Open…"))
                .clicked()
            {
                self.pick_file();
            }
            match (&self.file_name, self.busy()) {
                (Some(name), false) => ui.label(name),
                (Some(name), true) => ui.label(format!("{name} — decoding…")),
                (None, true) => ui.label("decoding…"),
                (None, false) => ui.label("drop an audio file anywhere, or open one"),
            };
        });
    }

    fn draw_transport(&mut self, ui: &mut egui::Ui) {
        let enabled = self.controls_enabled();
        ui.horizontal(|ui| {
            let glyph = if self.frame.playing { "⏸" } else { "▶" };
            let button = egui::Button::new(glyph).min_size(egui::vec2(30.0, 30.0));
            if ui.add_enabled(enabled, button).clicked() {
                self.toggle();
            }
            self.draw_track(ui, enabled);
        });
    }

    /// The track with its progress fill and draggable scrubber handle.
    fn draw_track(&mut self, ui: &mut egui::Ui, enabled: bool) {
        let radius = self.config.scrubber_radius;
        let row_height = (radius * 2.0).max(self.config.track_height) + 4.0;
        let (outer, response) =
            ui.allocate_exact_size(egui::vec2(ui.available_width(), row_height), Sense::click());

        // Inset by the handle radius so the handle never leaves the row.
        let track = Rect::from_min_max(
            Pos2::new(
                outer.left() + radius,
                outer.center().y - self.config.track_height / 2.0,
            ),
            Pos2::new(
                outer.right() - radius,
                outer.center().y + self.config.track_height / 2.0,
            ),
        );
        let track_w = track.width();

        ui.painter()
            .rect_filled(track, CornerRadius::same(3), self.config.track_color);
        let progress_px = self.frame.progress * track_w;
        if progress_px > 0.0 {
            let fill =
                Rect::from_min_max(track.min, Pos2::new(track.left() + progress_px, track.bottom()));
            ui.painter()
                .rect_filled(fill, CornerRadius::same(3), self.config.progress_color);
        }

        // The transport render owns the handle position only while no drag
        // holds it.
        if self.drag.is_none() {
            self.scrubber_px = progress_px;
        }

        let handle_center = Pos2::new(track.left() + self.scrubber_px, track.center().y);
        let handle_rect =
            Rect::from_center_size(handle_center, egui::vec2(radius * 2.0, radius * 2.0));
        let handle = ui.interact(handle_rect, ui.id().with("scrubber"), Sense::drag());

        if enabled {
            if handle.drag_started() {
                if let Some(pos) = handle.interact_pointer_pos() {
                    self.drag = Some(DragState {
                        origin_x: pos.x,
                        origin_offset: self.scrubber_px,
                    });
                }
            }
            if let Some(drag) = &self.drag {
                if let Some(pos) = handle.interact_pointer_pos() {
                    self.scrubber_px =
                        (drag.origin_offset + (pos.x - drag.origin_x)).clamp(0.0, track_w);
                }
            }
            if handle.drag_stopped() && self.drag.take().is_some() {
                let duration = self.transport.duration().unwrap_or(0.0);
                self.seek(time_for_offset(self.scrubber_px, track_w, duration));
            }
            // A click on the bare track (not the handle) jumps straight there.
            if response.clicked() && !handle.hovered() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let offset = (pos.x - track.left()).clamp(0.0, track_w);
                    self.scrubber_px = offset;
                    let duration = self.transport.duration().unwrap_or(0.0);
                    self.seek(time_for_offset(offset, track_w, duration));
                }
            }
        }

        let handle_center = Pos2::new(track.left() + self.scrubber_px, track.center().y);
        ui.painter()
            .circle_filled(handle_center, radius, self.config.scrubber_color);
    }

    /// One bar per frequency bin, white fading to green with magnitude.
    fn draw_spectrum(&mut self, ui: &mut egui::Ui) {
        let (rect, _) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), self.config.spectrum_height),
            Sense::hover(),
        );
        ui.painter()
            .rect_filled(rect, CornerRadius::ZERO, self.config.spectrum_backdrop);
        if self.audio.is_none() {
            return;
        }

        let bytes = self.analyser.bytes();
        let bar_w = rect.width() / bytes.len() as f32 * self.config.bar_width_factor;
        let mut x = rect.left();
        for &magnitude in bytes {
            if x >= rect.right() {
                break;
            }
            let bar_h = f32::from(magnitude) / 2.0;
            if bar_h > 0.0 {
                let fade = 255 - magnitude;
                let bar = Rect::from_min_max(
                    Pos2::new(x, rect.bottom() - bar_h),
                    Pos2::new((x + bar_w).min(rect.right()), rect.bottom()),
                );
                ui.painter()
                    .rect_filled(bar, CornerRadius::ZERO, Color32::from_rgb(fade, 255, fade));
            }
            x += bar_w + self.config.bar_gap;
        }
    }

    fn draw_drop_hint(&self, ui: &egui::Ui) {
        ui.painter().rect_stroke(
            ui.clip_rect().shrink(2.0),
            CornerRadius::same(4),
            egui::Stroke::new(2.0, self.config.drop_hint_color),
            StrokeKind::Inside,
        );
    }
}
