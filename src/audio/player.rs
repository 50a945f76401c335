use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::AudioSettings;
use crate::library::Track;

use super::decode::{Decode, RodioDecoder};
use super::device::{OutputDevice, RodioDevice};
use super::engine::Engine;
use super::error::Result;
use super::types::{PlaybackInfo, PlaybackState, RepeatMode};
use super::watcher::spawn_completion_watcher;

/// Tunables the engine reads when opening and seeking streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerSettings {
    /// Device buffer length requested when the output is first opened.
    pub buffer: Duration,
    /// Distance covered by `seek_forward` / `seek_backward`.
    pub seek_step: Duration,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            buffer: Duration::from_millis(100),
            seek_step: Duration::from_secs(10),
        }
    }
}

impl From<&AudioSettings> for PlayerSettings {
    fn from(audio: &AudioSettings) -> Self {
        Self {
            buffer: Duration::from_millis(audio.buffer_ms),
            seek_step: Duration::from_secs(audio.seek_seconds),
        }
    }
}

/// Thread-safe handle to the playback engine.
///
/// Clones share one engine. Every method takes the engine lock for the
/// duration of its own work and releases it before returning. A background
/// watcher thread reacts to streams running dry.
#[derive(Clone)]
pub struct AudioPlayer {
    engine: Arc<Mutex<Engine>>,
}

impl AudioPlayer {
    /// Engine on the shared default system output.
    pub fn new(tracks: Vec<Track>, settings: PlayerSettings) -> Self {
        Self::with_backend(
            tracks,
            RodioDevice::shared(),
            Arc::new(RodioDecoder),
            settings,
        )
    }

    /// Engine on an explicit device and decoder. The device may be shared
    /// with other engines.
    pub fn with_backend(
        tracks: Vec<Track>,
        device: Arc<dyn OutputDevice>,
        decoder: Arc<dyn Decode>,
        settings: PlayerSettings,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<u64>();
        let engine = Arc::new(Mutex::new(Engine::new(tracks, device, decoder, settings, tx)));
        spawn_completion_watcher(rx, Arc::downgrade(&engine));
        Self { engine }
    }

    pub(super) fn from_shared(engine: Arc<Mutex<Engine>>) -> Self {
        Self { engine }
    }

    fn lock(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the cued track from the beginning.
    pub fn play(&self) -> Result<()> {
        self.lock().play()
    }

    pub fn stop(&self) {
        self.lock().stop();
    }

    /// No-op unless playing.
    pub fn pause(&self) {
        self.lock().pause();
    }

    /// No-op unless paused.
    pub fn resume(&self) -> Result<()> {
        self.lock().resume()
    }

    pub fn next(&self) -> Result<()> {
        self.lock().next()
    }

    pub fn previous(&self) -> Result<()> {
        self.lock().previous()
    }

    /// Play the track at `index` in natural catalog order, whatever the
    /// shuffle state.
    pub fn skip(&self, index: usize) -> Result<()> {
        self.lock().skip(index)
    }

    /// Returns the new shuffle state.
    pub fn toggle_shuffle(&self) -> bool {
        self.lock().toggle_shuffle()
    }

    /// Returns the new repeat mode.
    pub fn toggle_repeat(&self) -> RepeatMode {
        self.lock().toggle_repeat()
    }

    pub fn set_repeat_mode(&self, mode: RepeatMode) {
        self.lock().set_repeat_mode(mode);
    }

    pub fn set_volume(&self, volume: f64) {
        self.lock().set_volume(volume);
    }

    pub fn seek_forward(&self) -> Result<()> {
        self.lock().seek_forward()
    }

    pub fn seek_backward(&self) -> Result<()> {
        self.lock().seek_backward()
    }

    pub fn seek_to_position(&self, ratio: f64) -> Result<()> {
        self.lock().seek_to_position(ratio)
    }

    pub fn replace_catalog(&self, tracks: Vec<Track>) {
        self.lock().replace_catalog(tracks);
    }

    pub fn current_track(&self) -> Option<Track> {
        self.lock().current_track()
    }

    pub fn current_time(&self) -> Duration {
        self.lock().current_time()
    }

    pub fn total_time(&self) -> Duration {
        self.lock().total_time()
    }

    pub fn progress(&self) -> f64 {
        self.lock().progress()
    }

    pub fn is_playing(&self) -> bool {
        self.lock().state() == PlaybackState::Playing
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.lock().state()
    }

    pub fn shuffle(&self) -> bool {
        self.lock().shuffle()
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.lock().repeat_mode()
    }

    pub fn volume(&self) -> f64 {
        self.lock().volume()
    }

    pub fn current_index(&self) -> usize {
        self.lock().cursor()
    }

    pub fn catalog(&self) -> Vec<Track> {
        self.lock().catalog().to_vec()
    }

    /// Natural catalog indices in the order playback will visit them.
    pub fn order(&self) -> Vec<usize> {
        self.lock().order()
    }

    /// Everything the UI redraws each tick, read under one lock.
    pub fn info(&self) -> PlaybackInfo {
        self.lock().info()
    }

    /// Handle a completion signal armed at `generation`. Stale generations
    /// are ignored.
    pub(crate) fn on_stream_finished(&self, generation: u64) -> Result<()> {
        self.lock().on_stream_finished(generation)
    }

    #[cfg(test)]
    pub(crate) fn generation(&self) -> u64 {
        self.lock().generation()
    }
}
