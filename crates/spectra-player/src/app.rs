//! Widget state and the per-frame update loop.

use std::fs;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui;

use crate::analyser::SpectrumAnalyser;
use crate::config::PlayerConfig;
use crate::decode::{decode_bytes, DecodeError, DecodedAudio};
use crate::playback::AudioLink;
use crate::transport::{Frame, MonotonicClock, Transport};

/// Result of one background decode, delivered over the worker channel.
struct DecodeOutcome {
    name: String,
    result: Result<DecodedAudio, DecodeError>,
}

/// A scrubber drag in progress: where the pointer and the handle were
/// when the drag began. Exists only while the button is held.
pub(crate) struct DragState {
    pub origin_x: f32,
    pub origin_offset: f32,
}

pub struct PlayerApp {
    pub(crate) config: PlayerConfig,
    clock: MonotonicClock,
    pub(crate) transport: Transport,
    link: AudioLink,
    pub(crate) audio: Option<DecodedAudio>,
    pub(crate) analyser: SpectrumAnalyser,
    window_buf: Vec<f32>,
    decode_rx: Option<Receiver<DecodeOutcome>>,
    pub(crate) file_name: Option<String>,
    pub(crate) load_error: Option<String>,
    pub(crate) drag: Option<DragState>,
    pub(crate) scrubber_px: f32,
    /// Most recent transport evaluation, what this frame paints.
    pub(crate) frame: Frame,
}

impl PlayerApp {
    pub fn new(config: PlayerConfig) -> Self {
        let analyser = SpectrumAnalyser::new(config.analyser);
        let window_buf = vec![0.0; analyser.fft_size()];
        Self {
            config,
            clock: MonotonicClock::new(),
            transport: Transport::new(),
            link: AudioLink::new(),
            audio: None,
            analyser,
            window_buf,
            decode_rx: None,
            file_name: None,
            load_error: None,
            drag: None,
            scrubber_px: 0.0,
            frame: Frame {
                position: 0.0,
                progress: 0.0,
                playing: false,
                just_finished: false,
            },
        }
    }

    /// A decode is in flight; the controls stay disabled until it lands.
    pub(crate) fn busy(&self) -> bool {
        self.decode_rx.is_some()
    }

    pub(crate) fn controls_enabled(&self) -> bool {
        self.audio.is_some() && !self.busy()
    }

    // ----- transport commands -------------------------------------------

    pub(crate) fn play(&mut self, from: Option<f64>) {
        let now = self.clock.now();
        match self.transport.play(now, from) {
            Ok(offset) => {
                if let Some(audio) = &self.audio {
                    self.link.connect(audio, offset);
                }
            }
            Err(e) => log::debug!("play ignored: {e}"),
        }
    }

    pub(crate) fn pause(&mut self) {
        self.transport.pause(self.clock.now());
        self.link.disconnect();
    }

    pub(crate) fn toggle(&mut self) {
        if self.transport.is_playing() {
            self.pause();
        } else {
            self.play(None);
        }
    }

    pub(crate) fn seek(&mut self, seconds: f64) {
        let now = self.clock.now();
        match self.transport.seek(now, seconds) {
            Ok(()) => {
                if self.transport.is_playing() {
                    if let Some(audio) = &self.audio {
                        // Rewire; connect() drops the old sink so only one
                        // source is ever audible.
                        self.link.connect(audio, self.transport.position(now));
                    }
                }
            }
            Err(e) => log::debug!("seek ignored: {e}"),
        }
    }

    // ----- file acquisition & decode ------------------------------------

    pub(crate) fn submit_bytes(&mut self, name: String, bytes: Vec<u8>) {
        if self.busy() {
            log::debug!("decode already in flight, ignoring {name:?}");
            return;
        }
        log::info!("decoding {name:?} ({} bytes)", bytes.len());
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = decode_bytes(bytes);
            let _ = tx.send(DecodeOutcome { name, result });
        });
        self.decode_rx = Some(rx);
    }

    fn poll_decode(&mut self) {
        let Some(rx) = &self.decode_rx else { return };
        match rx.try_recv() {
            Ok(outcome) => {
                self.decode_rx = None;
                match outcome.result {
                    Ok(audio) => self.install(outcome.name, audio),
                    Err(e) => {
                        log::warn!("decode of {:?} failed: {e}", outcome.name);
                        self.load_error = Some(format!("could not decode {}: {e}", outcome.name));
                    }
                }
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.decode_rx = None;
                self.load_error = Some("decoder crashed".to_owned());
            }
        }
    }

    /// New source decoded: swap it in, reset position and spectrum, then
    /// start playing right away.
    fn install(&mut self, name: String, audio: DecodedAudio) {
        let duration = audio.duration();
        log::info!(
            "loaded {name:?}: {duration:.2}s, {} ch @ {} Hz",
            audio.channels(),
            audio.sample_rate()
        );
        self.transport.load(duration);
        self.analyser.reset();
        self.audio = Some(audio);
        self.file_name = Some(name);
        self.load_error = None;
        self.scrubber_px = 0.0;
        self.play(None);
    }

    fn collect_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };
        let name = if file.name.is_empty() {
            file.path
                .as_deref()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or("audio")
                .to_owned()
        } else {
            file.name.clone()
        };
        let bytes = if let Some(bytes) = file.bytes {
            bytes.to_vec()
        } else if let Some(path) = &file.path {
            match fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("failed to read dropped file {path:?}: {e}");
                    self.load_error = Some(format!("could not read {name}: {e}"));
                    return;
                }
            }
        } else {
            return;
        };
        self.submit_bytes(name, bytes);
    }

    pub(crate) fn pick_file(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Audio", &["mp3", "wav", "ogg", "flac"])
            .set_title("Select an audio file")
            .pick_file()
        else {
            return;
        };
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio")
            .to_owned();
        match fs::read(&path) {
            Ok(bytes) => self.submit_bytes(name, bytes),
            Err(e) => {
                log::warn!("failed to read {path:?}: {e}");
                self.load_error = Some(format!("could not read {name}: {e}"));
            }
        }
    }

    // ----- per-frame analysis -------------------------------------------

    fn analyse(&mut self) {
        let Some(audio) = &self.audio else { return };
        if self.frame.playing {
            audio.mono_window(self.frame.position, &mut self.window_buf);
        } else {
            // Silence while paused; the smoothing filter decays the bars.
            self.window_buf.fill(0.0);
        }
        self.analyser.process(&self.window_buf);
    }
}

impl Default for PlayerApp {
    fn default() -> Self {
        Self::new(PlayerConfig::default())
    }
}

impl eframe::App for PlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_decode();
        self.collect_dropped_files(ctx);

        self.frame = self.transport.frame(self.clock.now());
        if self.frame.just_finished {
            log::debug!("end of track");
            self.link.disconnect();
        }
        self.analyse();

        let hovering_files = ctx.input(|i| !i.raw.hovered_files.is_empty());
        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_widget(ui, hovering_files);
        });

        // Keep the frame loop going; eframe owns it and tears it down
        // with the window.
        ctx.request_repaint();
    }
}
