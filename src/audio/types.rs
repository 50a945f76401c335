//! Audio-related small types.
//!
//! This module defines the enums and value types shared by the engine,
//! the decoder and the output device (repeat mode, playback state, stream
//! format, gain and the polled `PlaybackInfo` snapshot).

use std::time::Duration;

use crate::library::Track;

/// Volumes at or below this are treated as silence by the gain mapping.
pub const SILENCE_THRESHOLD: f64 = 0.0001;
/// Gain level used for volumes at or below `SILENCE_THRESHOLD`.
pub const GAIN_FLOOR: f64 = -10.0;
/// The gain level is an exponent of this base.
pub const GAIN_BASE: f64 = 2.0;

const NANOS_PER_SEC: u128 = 1_000_000_000;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RepeatMode {
    /// Stop after the last track of the current ordering.
    #[default]
    Off,
    /// Replay the current track when it ends.
    One,
    /// Wrap around to the start of the current ordering.
    All,
}

impl RepeatMode {
    /// Cycle `Off -> One -> All -> Off`.
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::One,
            Self::One => Self::All,
            Self::All => Self::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "Repeat: Off",
            Self::One => "Repeat: One",
            Self::All => "Repeat: All",
        }
    }
}

/// The playback state of the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Sample rate and channel layout of a decoded stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl StreamFormat {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Wall-clock time covered by `frames` frames.
    pub fn frames_to_duration(&self, frames: u64) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let nanos = frames as u128 * NANOS_PER_SEC / self.sample_rate as u128;
        Duration::from_nanos(nanos.min(u64::MAX as u128) as u64)
    }

    /// Frame index closest to `d`.
    pub fn duration_to_frames(&self, d: Duration) -> u64 {
        let frames = (d.as_nanos() * self.sample_rate as u128 + NANOS_PER_SEC / 2) / NANOS_PER_SEC;
        frames.min(u64::MAX as u128) as u64
    }
}

/// Attenuation applied to decoded samples, derived from the linear volume.
///
/// `level` is an exponent of `GAIN_BASE`: 0.0 leaves samples untouched and
/// every -1.0 halves their amplitude.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Gain {
    pub level: f64,
    pub silent: bool,
}

impl Gain {
    /// Map a volume in `[0, 1]` to a gain: `(v - 1) * 5` above the silence
    /// threshold, `GAIN_FLOOR` at or below it.
    pub fn from_volume(volume: f64) -> Self {
        let level = if volume <= SILENCE_THRESHOLD {
            GAIN_FLOOR
        } else {
            (volume - 1.0) * 5.0
        };
        Self {
            level,
            silent: volume < SILENCE_THRESHOLD,
        }
    }

    /// Linear multiplier to apply to each sample.
    pub fn amplitude(&self) -> f32 {
        if self.silent {
            0.0
        } else {
            GAIN_BASE.powf(self.level) as f32
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Runtime playback information polled by the UI.
pub struct PlaybackInfo {
    pub state: PlaybackState,
    /// Cursor into the current ordering.
    pub index: usize,
    /// Position of the cued track in the natural catalog order.
    pub catalog_index: Option<usize>,
    pub track: Option<Track>,
    pub elapsed: Duration,
    pub total: Duration,
    pub progress: f64,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub volume: f64,
}

impl PlaybackInfo {
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }
}
