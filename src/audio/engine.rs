//! Engine state and its transitions.
//!
//! Everything in here runs with the engine lock held. Transitions compose
//! by calling each other directly on `&mut Engine`, never through the public
//! `AudioPlayer` surface, so no path ever tries to take the lock twice.

use std::fs::File;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use crate::library::Track;

use super::decode::{AudioFormat, Decode};
use super::device::{ActiveStream, CompletionSignal, OutputDevice};
use super::error::{PlayerError, Result};
use super::order::PlayOrder;
use super::player::PlayerSettings;
use super::types::{Gain, PlaybackInfo, PlaybackState, RepeatMode, StreamFormat};

/// The decode stream currently attached to the device.
struct Loaded {
    active: Box<dyn ActiveStream>,
    format: StreamFormat,
    len_frames: u64,
}

impl Loaded {
    fn position(&self) -> Duration {
        self.format.frames_to_duration(self.active.position_frames())
    }
}

pub(crate) struct Engine {
    order: PlayOrder,
    cursor: usize,
    state: PlaybackState,
    repeat: RepeatMode,
    volume: f64,
    stream: Option<Loaded>,
    /// Last known elapsed time; refreshed from the decoder while playing.
    current_time: Duration,
    total_time: Duration,
    /// Bumped by every play and stop. Completion signals carry the value
    /// current when they were armed.
    generation: u64,
    /// A completion for the live stream arrived while paused.
    finished_while_paused: bool,
    device_claimed: bool,
    completions: Sender<u64>,
    device: Arc<dyn OutputDevice>,
    decoder: Arc<dyn Decode>,
    settings: PlayerSettings,
}

impl Engine {
    pub(crate) fn new(
        tracks: Vec<Track>,
        device: Arc<dyn OutputDevice>,
        decoder: Arc<dyn Decode>,
        settings: PlayerSettings,
        completions: Sender<u64>,
    ) -> Self {
        Self {
            order: PlayOrder::new(tracks),
            cursor: 0,
            state: PlaybackState::Stopped,
            repeat: RepeatMode::Off,
            volume: 1.0,
            stream: None,
            current_time: Duration::ZERO,
            total_time: Duration::ZERO,
            generation: 0,
            finished_while_paused: false,
            device_claimed: false,
            completions,
            device,
            decoder,
            settings,
        }
    }

    fn refresh_time(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        if let Some(loaded) = &self.stream {
            self.current_time = loaded.position();
        }
    }

    pub(crate) fn stop(&mut self) {
        if let Some(mut loaded) = self.stream.take() {
            loaded.active.detach();
        }
        self.state = PlaybackState::Stopped;
        self.current_time = Duration::ZERO;
        self.finished_while_paused = false;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Open the cued track and start it. On failure nothing stays attached
    /// and the cursor is left where it was.
    pub(crate) fn play(&mut self) -> Result<()> {
        if self.stream.is_some() {
            self.stop();
        }
        self.total_time = Duration::ZERO;

        let Some(track) = self.order.get(self.cursor) else {
            return Ok(());
        };
        let path = track.path.clone();

        let file = File::open(&path).map_err(|source| PlayerError::FileOpen {
            path: path.clone(),
            source,
        })?;
        let format = AudioFormat::from_path(&path)?;
        let stream = self.decoder.decode(&path, file, format)?;
        let stream_format = stream.format();
        let len_frames = stream.len_frames();

        if !self.device_claimed {
            self.device.initialize(stream_format, self.settings.buffer)?;
            self.device_claimed = true;
        }

        let generation = self.generation.wrapping_add(1);
        let done = CompletionSignal::new(generation, self.completions.clone());
        let active = self
            .device
            .attach(stream, Gain::from_volume(self.volume), done)?;

        self.generation = generation;
        self.stream = Some(Loaded {
            active,
            format: stream_format,
            len_frames,
        });
        self.total_time = stream_format.frames_to_duration(len_frames);
        self.current_time = Duration::ZERO;
        self.finished_while_paused = false;
        self.state = PlaybackState::Playing;
        Ok(())
    }

    pub(crate) fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.refresh_time();
        if let Some(loaded) = &self.stream {
            loaded.active.set_paused(true);
        }
        self.state = PlaybackState::Paused;
    }

    pub(crate) fn resume(&mut self) -> Result<()> {
        if self.state != PlaybackState::Paused {
            return Ok(());
        }
        if let Some(loaded) = &self.stream {
            loaded.active.set_paused(false);
        }
        self.state = PlaybackState::Playing;

        if self.finished_while_paused {
            self.finished_while_paused = false;
            return self.react_to_end();
        }
        Ok(())
    }

    pub(crate) fn next(&mut self) -> Result<()> {
        if self.order.is_empty() {
            return Ok(());
        }
        self.stop();
        self.cursor = (self.cursor + 1) % self.order.len();
        if self.order.is_shuffled() && self.cursor == 0 && self.repeat == RepeatMode::All {
            self.order.shuffle();
        }
        self.play()
    }

    pub(crate) fn previous(&mut self) -> Result<()> {
        if self.order.is_empty() {
            return Ok(());
        }
        self.stop();
        let len = self.order.len();
        self.cursor = (self.cursor % len + len - 1) % len;
        self.play()
    }

    /// Jump to `index`, given in natural catalog order.
    pub(crate) fn skip(&mut self, index: usize) -> Result<()> {
        let len = self.order.len();
        let Some(target) = self.order.tracks().get(index) else {
            return Err(PlayerError::IndexOutOfRange { index, len });
        };
        let path = target.path.clone();

        self.stop();
        if self.order.is_shuffled() {
            if let Some(pos) = self.order.position_of(&path) {
                self.cursor = pos;
            }
        } else {
            self.cursor = index;
        }
        self.play()
    }

    /// Flip shuffle, keeping the cued track cued.
    pub(crate) fn toggle_shuffle(&mut self) -> bool {
        let cued = self.order.get(self.cursor).map(|t| t.path.clone());

        if self.order.is_shuffled() {
            self.order.unshuffle();
        } else {
            self.order.shuffle();
        }

        if let Some(pos) = cued.and_then(|path| self.order.position_of(&path)) {
            self.cursor = pos;
        }
        self.order.is_shuffled()
    }

    pub(crate) fn toggle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.next();
        self.repeat
    }

    pub(crate) fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    pub(crate) fn set_volume(&mut self, volume: f64) {
        if volume.is_nan() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(loaded) = &self.stream {
            loaded.active.set_gain(Gain::from_volume(self.volume));
        }
    }

    /// Move the elapsed position by `step`, clamped to `[0, total]`. A stream
    /// of unknown length has no upper bound.
    pub(crate) fn seek_by(&mut self, step: Duration, forward: bool) -> Result<()> {
        let Some(loaded) = &self.stream else {
            return Err(PlayerError::NotPlaying);
        };

        let current = loaded.position();
        let mut target = if forward {
            current.saturating_add(step)
        } else {
            current.saturating_sub(step)
        };
        if !self.total_time.is_zero() {
            target = target.min(self.total_time);
        }

        let mut frame = loaded.format.duration_to_frames(target);
        if loaded.len_frames > 0 {
            frame = frame.min(loaded.len_frames - 1);
        }
        loaded.active.seek_frames(frame)?;

        self.current_time = target;
        Ok(())
    }

    pub(crate) fn seek_forward(&mut self) -> Result<()> {
        self.seek_by(self.settings.seek_step, true)
    }

    pub(crate) fn seek_backward(&mut self) -> Result<()> {
        self.seek_by(self.settings.seek_step, false)
    }

    /// Jump to `ratio` of the stream length.
    pub(crate) fn seek_to_position(&mut self, ratio: f64) -> Result<()> {
        let Some(loaded) = &self.stream else {
            return Err(PlayerError::NotPlaying);
        };

        let ratio = if ratio.is_nan() {
            0.0
        } else {
            ratio.clamp(0.0, 1.0)
        };
        let frame = ((ratio * loaded.len_frames as f64) as u64).min(loaded.len_frames);
        loaded.active.seek_frames(frame)?;

        self.current_time = loaded.format.frames_to_duration(frame);
        Ok(())
    }

    /// Replace the catalog wholesale. Playback stops and the cursor returns
    /// to the top; shuffle stays on if it was on.
    pub(crate) fn replace_catalog(&mut self, tracks: Vec<Track>) {
        self.stop();
        let shuffled = self.order.is_shuffled();
        self.order = PlayOrder::new(tracks);
        if shuffled {
            self.order.shuffle();
        }
        self.cursor = 0;
        self.total_time = Duration::ZERO;
    }

    /// React to a drained stream armed at `generation`.
    pub(crate) fn on_stream_finished(&mut self, generation: u64) -> Result<()> {
        if generation != self.generation || self.stream.is_none() {
            return Ok(());
        }
        match self.state {
            PlaybackState::Playing => self.react_to_end(),
            PlaybackState::Paused => {
                self.finished_while_paused = true;
                Ok(())
            }
            PlaybackState::Stopped => Ok(()),
        }
    }

    fn react_to_end(&mut self) -> Result<()> {
        match self.repeat {
            RepeatMode::One => {
                self.stop();
                self.play()
            }
            RepeatMode::All => self.next(),
            RepeatMode::Off => {
                if self.cursor + 1 < self.order.len() {
                    self.next()
                } else {
                    self.stop();
                    Ok(())
                }
            }
        }
    }

    pub(crate) fn current_track(&self) -> Option<Track> {
        self.order.get(self.cursor).cloned()
    }

    pub(crate) fn current_time(&mut self) -> Duration {
        self.refresh_time();
        self.current_time
    }

    pub(crate) fn total_time(&self) -> Duration {
        self.total_time
    }

    /// Elapsed over total. Not clamped: a decoder that under-reports its
    /// length can push this past 1.0.
    pub(crate) fn progress(&mut self) -> f64 {
        self.refresh_time();
        if self.total_time.is_zero() {
            return 0.0;
        }
        self.current_time.as_secs_f64() / self.total_time.as_secs_f64()
    }

    pub(crate) fn state(&self) -> PlaybackState {
        self.state
    }

    pub(crate) fn shuffle(&self) -> bool {
        self.order.is_shuffled()
    }

    pub(crate) fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    pub(crate) fn volume(&self) -> f64 {
        self.volume
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    #[cfg(test)]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn catalog(&self) -> &[Track] {
        self.order.tracks()
    }

    pub(crate) fn order(&self) -> Vec<usize> {
        self.order.indices()
    }

    pub(crate) fn info(&mut self) -> PlaybackInfo {
        let progress = self.progress();
        let elapsed = self.current_time();
        PlaybackInfo {
            state: self.state,
            index: self.cursor,
            catalog_index: self.order.natural_index(self.cursor),
            track: self.current_track(),
            elapsed,
            total: self.total_time,
            progress,
            shuffle: self.shuffle(),
            repeat: self.repeat,
            volume: self.volume,
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}
