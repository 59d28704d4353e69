//! Playback transport: the play/pause/seek state machine.
//!
//! Position is tracked in one of two forms. While paused it is a plain
//! offset in seconds; while playing it is derived from the audio clock as
//! `now - since`, where `since` is the clock timestamp at which offset
//! zero would have played. Exactly one form exists at a time, so the two
//! can never disagree.

use std::time::Instant;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("no audio loaded")]
    NoSourceLoaded,
}

/// Monotonic clock in f64 seconds, the shape the audio hardware clock has.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Playback offset, authoritative in whichever form it currently holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    /// Not advancing; the offset in seconds.
    Fixed(f64),
    /// Advancing; `since` is the clock time at which offset zero played.
    Running { since: f64 },
}

impl Position {
    pub fn derive(self, now: f64) -> f64 {
        match self {
            Position::Fixed(offset) => offset,
            Position::Running { since } => now - since,
        }
    }

    fn is_running(self) -> bool {
        matches!(self, Position::Running { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    /// No source loaded yet.
    Idle,
    Paused,
    Playing,
}

/// One per-frame evaluation of the transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Derived playback offset in seconds, clamped to `[0, duration]`.
    pub position: f64,
    /// `position / duration`, 0.0 when nothing is loaded.
    pub progress: f32,
    pub playing: bool,
    /// True on the frame that ran the end-of-track auto-stop.
    pub just_finished: bool,
}

impl Frame {
    const IDLE: Frame = Frame {
        position: 0.0,
        progress: 0.0,
        playing: false,
        just_finished: false,
    };
}

pub struct Transport {
    duration: Option<f64>,
    position: Position,
}

impl Transport {
    pub fn new() -> Self {
        Self {
            duration: None,
            position: Position::Fixed(0.0),
        }
    }

    /// Replace the loaded source. The old one is discarded wholesale and
    /// the offset resets to zero.
    pub fn load(&mut self, duration: f64) {
        self.duration = Some(duration.max(0.0));
        self.position = Position::Fixed(0.0);
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn status(&self) -> TransportStatus {
        if self.duration.is_none() {
            TransportStatus::Idle
        } else if self.position.is_running() {
            TransportStatus::Playing
        } else {
            TransportStatus::Paused
        }
    }

    pub fn is_playing(&self) -> bool {
        self.status() == TransportStatus::Playing
    }

    pub fn position(&self, now: f64) -> f64 {
        self.position.derive(now)
    }

    /// Start (or restart) playback. `from` seeds the offset; without it
    /// playback resumes from the last known position. Returns the offset
    /// the audio link must start its source at.
    ///
    /// # Errors
    /// `NoSourceLoaded` if nothing has been decoded yet.
    pub fn play(&mut self, now: f64, from: Option<f64>) -> Result<f64, TransportError> {
        let duration = self.duration.ok_or(TransportError::NoSourceLoaded)?;
        let offset = from
            .unwrap_or_else(|| self.position.derive(now))
            .clamp(0.0, duration);
        self.position = Position::Running { since: now - offset };
        Ok(offset)
    }

    /// Stop advancing and capture the current offset. A no-op when not
    /// playing, so pausing twice is harmless.
    pub fn pause(&mut self, now: f64) {
        if let Position::Running { since } = self.position {
            self.position = Position::Fixed(now - since);
        }
    }

    /// Jump to `seconds` (clamped to the track). While playing the
    /// transport keeps running from the new offset; the caller must rewire
    /// its audio source, which is what makes the jump audible.
    ///
    /// # Errors
    /// `NoSourceLoaded` if nothing has been decoded yet.
    pub fn seek(&mut self, now: f64, seconds: f64) -> Result<(), TransportError> {
        let duration = self.duration.ok_or(TransportError::NoSourceLoaded)?;
        let offset = seconds.clamp(0.0, duration);
        self.position = if self.position.is_running() {
            Position::Running { since: now - offset }
        } else {
            Position::Fixed(offset)
        };
        Ok(())
    }

    /// Dispatch to `play` or `pause` based on the current state. Returns
    /// the start offset when this resulted in a play.
    ///
    /// # Errors
    /// `NoSourceLoaded` if nothing has been decoded yet.
    pub fn toggle(&mut self, now: f64) -> Result<Option<f64>, TransportError> {
        if self.is_playing() {
            self.pause(now);
            Ok(None)
        } else {
            self.play(now, None).map(Some)
        }
    }

    /// Per-frame evaluation: derive the position and run the end-of-track
    /// transition (back to paused at offset zero) when playback has
    /// reached or passed the duration.
    pub fn frame(&mut self, now: f64) -> Frame {
        let Some(duration) = self.duration else {
            return Frame::IDLE;
        };

        let derived = self.position.derive(now);
        if self.position.is_running() && derived >= duration {
            self.position = Position::Fixed(0.0);
            return Frame {
                position: 0.0,
                progress: 0.0,
                playing: false,
                just_finished: true,
            };
        }

        let position = derived.clamp(0.0, duration);
        let progress = if duration > 0.0 {
            (position / duration) as f32
        } else {
            0.0
        };
        Frame {
            position,
            progress,
            playing: self.position.is_running(),
            just_finished: false,
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}
