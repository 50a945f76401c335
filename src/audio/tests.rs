use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use super::*;
use crate::library::Track;

const RATE: u32 = 44_100;
const TRACK_SECS: u64 = 30;
const TRACK_FRAMES: u64 = RATE as u64 * TRACK_SECS;

struct FakeStream {
    format: StreamFormat,
    len_frames: u64,
}

impl Iterator for FakeStream {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        None
    }
}

impl SampleStream for FakeStream {
    fn format(&self) -> StreamFormat {
        self.format
    }

    fn len_frames(&self) -> u64 {
        self.len_frames
    }

    fn seek_frames(&mut self, _frame: u64) -> Result<()> {
        Ok(())
    }
}

/// Decoder that never reads the file; names listed in `corrupt` fail and
/// names in `unknown_length` report no length.
#[derive(Default)]
struct FakeDecoder {
    corrupt: HashSet<String>,
    unknown_length: HashSet<String>,
}

impl Decode for FakeDecoder {
    fn decode(&self, path: &Path, _file: File, _format: AudioFormat) -> Result<Box<dyn SampleStream>> {
        let name = path.file_name().and_then(|s| s.to_str()).unwrap_or_default();
        if self.corrupt.contains(name) {
            return Err(PlayerError::CorruptFormat {
                path: path.to_path_buf(),
                reason: "bad header".to_string(),
            });
        }
        let len_frames = if self.unknown_length.contains(name) {
            0
        } else {
            TRACK_FRAMES
        };
        Ok(Box::new(FakeStream {
            format: StreamFormat::new(RATE, 2),
            len_frames,
        }))
    }
}

#[derive(Default)]
struct FakeHandle {
    paused: AtomicBool,
    detached: AtomicBool,
    position: AtomicU64,
    gain: Mutex<Option<Gain>>,
    seeks: Mutex<Vec<u64>>,
}

struct FakeActive {
    handle: Arc<FakeHandle>,
    open: Arc<AtomicUsize>,
}

impl ActiveStream for FakeActive {
    fn set_paused(&self, paused: bool) {
        self.handle.paused.store(paused, Ordering::SeqCst);
    }

    fn set_gain(&self, gain: Gain) {
        *self.handle.gain.lock().unwrap() = Some(gain);
    }

    fn position_frames(&self) -> u64 {
        self.handle.position.load(Ordering::SeqCst)
    }

    fn seek_frames(&self, frame: u64) -> Result<()> {
        self.handle.seeks.lock().unwrap().push(frame);
        self.handle.position.store(frame, Ordering::SeqCst);
        Ok(())
    }

    fn detach(&mut self) {
        if !self.handle.detached.swap(true, Ordering::SeqCst) {
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for FakeActive {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Output device that records what the engine asks of it. Completion
/// signals are held back so tests decide when a stream "ends".
#[derive(Default)]
struct FakeDevice {
    init_calls: AtomicUsize,
    attach_calls: AtomicUsize,
    open: Arc<AtomicUsize>,
    max_open: AtomicUsize,
    current: Mutex<Option<Arc<FakeHandle>>>,
    signal: Mutex<Option<CompletionSignal>>,
}

impl FakeDevice {
    fn handle(&self) -> Arc<FakeHandle> {
        self.current.lock().unwrap().clone().expect("no stream attached")
    }

    fn take_signal(&self) -> CompletionSignal {
        self.signal.lock().unwrap().take().expect("no completion armed")
    }

    fn set_position(&self, d: Duration) {
        let frames = StreamFormat::new(RATE, 2).duration_to_frames(d);
        self.handle().position.store(frames, Ordering::SeqCst);
    }
}

impl OutputDevice for FakeDevice {
    fn initialize(&self, _format: StreamFormat, _buffer: Duration) -> Result<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn attach(
        &self,
        _stream: Box<dyn SampleStream>,
        gain: Gain,
        done: CompletionSignal,
    ) -> Result<Box<dyn ActiveStream>> {
        self.attach_calls.fetch_add(1, Ordering::SeqCst);
        let open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_open.fetch_max(open, Ordering::SeqCst);

        let handle = Arc::new(FakeHandle::default());
        *handle.gain.lock().unwrap() = Some(gain);
        *self.current.lock().unwrap() = Some(handle.clone());
        *self.signal.lock().unwrap() = Some(done);

        Ok(Box::new(FakeActive {
            handle,
            open: self.open.clone(),
        }))
    }
}

struct Fixture {
    player: AudioPlayer,
    device: Arc<FakeDevice>,
    tracks: Vec<Track>,
    _dir: TempDir,
}

fn fixture_with(names: &[&str], corrupt: &[&str]) -> Fixture {
    let decoder = FakeDecoder {
        corrupt: corrupt.iter().map(|s| s.to_string()).collect(),
        ..FakeDecoder::default()
    };
    fixture_on(names, decoder)
}

fn fixture_on(names: &[&str], decoder: FakeDecoder) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let tracks: Vec<Track> = names
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            std::fs::write(&path, b"not really audio").unwrap();
            Track::new(path)
        })
        .collect();

    let device = Arc::new(FakeDevice::default());
    let player = AudioPlayer::with_backend(
        tracks.clone(),
        device.clone(),
        Arc::new(decoder),
        PlayerSettings::default(),
    );

    Fixture {
        player,
        device,
        tracks,
        _dir: dir,
    }
}

fn fixture(n: usize) -> Fixture {
    let names: Vec<String> = (0..n).map(|i| format!("{i}.mp3")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    fixture_with(&refs, &[])
}

/// Deliver the pending completion straight to the engine.
fn finish_current(f: &Fixture) {
    let generation = f.device.take_signal().generation();
    f.player.on_stream_finished(generation).unwrap();
}

fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

fn current_path(f: &Fixture) -> PathBuf {
    f.player.current_track().unwrap().path
}

#[test]
fn stream_format_converts_between_frames_and_time() {
    let fmt = StreamFormat::new(RATE, 2);
    assert_eq!(fmt.frames_to_duration(44_100), Duration::from_secs(1));
    assert_eq!(fmt.duration_to_frames(Duration::from_millis(1500)), 66_150);
    for frames in [0, 1, 7, 12_345, TRACK_FRAMES] {
        assert_eq!(fmt.duration_to_frames(fmt.frames_to_duration(frames)), frames);
    }
}

#[test]
fn gain_follows_linear_exponent_mapping_with_silence_floor() {
    let full = Gain::from_volume(1.0);
    assert_eq!(full.level, 0.0);
    assert!(!full.silent);
    assert_eq!(full.amplitude(), 1.0);

    assert_eq!(Gain::from_volume(0.5).level, -2.5);
    assert!((Gain::from_volume(0.8).amplitude() - 0.5).abs() < 1e-6);

    let zero = Gain::from_volume(0.0);
    assert_eq!(zero.level, GAIN_FLOOR);
    assert!(zero.silent);
    assert_eq!(zero.amplitude(), 0.0);

    // Exactly at the threshold: floored, but still audible.
    let edge = Gain::from_volume(SILENCE_THRESHOLD);
    assert_eq!(edge.level, GAIN_FLOOR);
    assert!(!edge.silent);
}

#[test]
fn audio_format_dispatches_on_extension() {
    assert_eq!(AudioFormat::from_path(Path::new("a.MP3")).unwrap(), AudioFormat::Mp3);
    assert_eq!(AudioFormat::from_path(Path::new("a.wav")).unwrap(), AudioFormat::Wav);
    assert_eq!(AudioFormat::from_path(Path::new("a.flac")).unwrap(), AudioFormat::Flac);
    let err = AudioFormat::from_path(Path::new("a.ogg")).unwrap_err();
    assert!(err.is_format_error());
    assert_eq!(err.to_string(), "unsupported audio format: .ogg");
}

#[test]
fn new_engine_starts_stopped_with_full_volume() {
    let f = fixture(3);
    assert_eq!(f.player.playback_state(), PlaybackState::Stopped);
    assert!(!f.player.is_playing());
    assert_eq!(f.player.volume(), 1.0);
    assert_eq!(f.player.repeat_mode(), RepeatMode::Off);
    assert!(!f.player.shuffle());
    assert_eq!(f.player.current_index(), 0);
    assert_eq!(f.player.current_time(), Duration::ZERO);
}

#[test]
fn play_opens_cued_track_and_claims_device_once() {
    let f = fixture(3);
    f.player.play().unwrap();
    assert!(f.player.is_playing());
    assert_eq!(f.player.total_time(), Duration::from_secs(TRACK_SECS));
    assert_eq!(current_path(&f), f.tracks[0].path);

    f.player.next().unwrap();
    f.player.skip(0).unwrap();
    assert_eq!(f.device.init_calls.load(Ordering::SeqCst), 1);
    assert_eq!(f.device.attach_calls.load(Ordering::SeqCst), 3);
}

#[test]
fn never_more_than_one_stream_attached() {
    let f = fixture(4);
    f.player.play().unwrap();
    f.player.play().unwrap();
    f.player.next().unwrap();
    f.player.previous().unwrap();
    f.player.skip(3).unwrap();
    f.player.toggle_shuffle();
    f.player.next().unwrap();
    assert_eq!(f.device.max_open.load(Ordering::SeqCst), 1);
    assert_eq!(f.device.open.load(Ordering::SeqCst), 1);

    f.player.stop();
    assert_eq!(f.device.open.load(Ordering::SeqCst), 0);
}

#[test]
fn corrupt_file_leaves_nothing_attached() {
    let f = fixture_with(&["0.mp3", "1.mp3"], &["1.mp3"]);
    f.player.play().unwrap();

    let err = f.player.skip(1).unwrap_err();
    assert!(matches!(err, PlayerError::CorruptFormat { .. }));
    assert!(err.is_format_error());
    assert_eq!(f.player.playback_state(), PlaybackState::Stopped);
    assert_eq!(f.device.open.load(Ordering::SeqCst), 0);
    assert_eq!(f.player.current_time(), Duration::ZERO);
    assert_eq!(f.player.progress(), 0.0);

    // The caller decides what to do next; the engine is still usable.
    f.player.skip(0).unwrap();
    assert!(f.player.is_playing());
}

#[test]
fn unsupported_extension_is_rejected() {
    let f = fixture_with(&["song.ogg"], &[]);
    let err = f.player.play().unwrap_err();
    assert!(matches!(err, PlayerError::UnsupportedFormat { .. }));
    assert_eq!(f.player.playback_state(), PlaybackState::Stopped);
    assert_eq!(f.device.attach_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn missing_file_reports_open_failure() {
    let device = Arc::new(FakeDevice::default());
    let player = AudioPlayer::with_backend(
        vec![Track::new(PathBuf::from("/definitely/not/here.mp3"))],
        device.clone(),
        Arc::new(FakeDecoder::default()),
        PlayerSettings::default(),
    );

    let err = player.play().unwrap_err();
    assert!(matches!(err, PlayerError::FileOpen { .. }));
    assert_eq!(player.playback_state(), PlaybackState::Stopped);
    assert_eq!(player.current_index(), 0);
    assert_eq!(device.init_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn stop_is_idempotent_and_resets_elapsed() {
    let f = fixture(2);
    f.player.stop();
    f.player.play().unwrap();
    f.device.set_position(Duration::from_secs(12));
    assert_eq!(f.player.current_time(), Duration::from_secs(12));

    let handle = f.device.handle();
    f.player.stop();
    f.player.stop();
    assert!(handle.detached.load(Ordering::SeqCst));
    assert_eq!(f.player.playback_state(), PlaybackState::Stopped);
    assert_eq!(f.player.current_time(), Duration::ZERO);
}

#[test]
fn pause_and_resume_only_act_in_matching_states() {
    let f = fixture(2);
    f.player.pause();
    assert_eq!(f.player.playback_state(), PlaybackState::Stopped);
    f.player.resume().unwrap();
    assert_eq!(f.player.playback_state(), PlaybackState::Stopped);

    f.player.play().unwrap();
    f.player.resume().unwrap();
    assert_eq!(f.player.playback_state(), PlaybackState::Playing);

    f.player.pause();
    assert_eq!(f.player.playback_state(), PlaybackState::Paused);
    assert!(f.device.handle().paused.load(Ordering::SeqCst));

    f.player.resume().unwrap();
    assert_eq!(f.player.playback_state(), PlaybackState::Playing);
    assert!(!f.device.handle().paused.load(Ordering::SeqCst));
}

#[test]
fn elapsed_time_is_frozen_while_paused() {
    let f = fixture(1);
    f.player.play().unwrap();
    f.device.set_position(Duration::from_secs(4));
    f.player.pause();

    f.device.set_position(Duration::from_secs(9));
    assert_eq!(f.player.current_time(), Duration::from_secs(4));

    f.player.resume().unwrap();
    assert_eq!(f.player.current_time(), Duration::from_secs(9));
}

#[test]
fn next_and_previous_wrap_around() {
    let f = fixture(3);
    f.player.play().unwrap();
    f.player.previous().unwrap();
    assert_eq!(f.player.current_index(), 2);
    f.player.next().unwrap();
    assert_eq!(f.player.current_index(), 0);
    f.player.next().unwrap();
    assert_eq!(f.player.current_index(), 1);
    assert!(f.player.is_playing());
}

#[test]
fn empty_catalog_commands_are_no_ops() {
    let f = fixture(0);
    f.player.play().unwrap();
    f.player.next().unwrap();
    f.player.previous().unwrap();
    assert!(f.player.toggle_shuffle());
    assert!(f.player.current_track().is_none());
    assert_eq!(f.player.playback_state(), PlaybackState::Stopped);
    assert!(matches!(
        f.player.skip(0),
        Err(PlayerError::IndexOutOfRange { index: 0, len: 0 })
    ));
}

#[test]
fn set_volume_clamps_and_updates_live_gain() {
    let f = fixture(1);
    for (input, stored) in [(-1.0, 0.0), (0.0, 0.0), (0.25, 0.25), (1.0, 1.0), (7.5, 1.0)] {
        f.player.set_volume(input);
        assert_eq!(f.player.volume(), stored);
    }

    f.player.set_volume(0.6);
    f.player.set_volume(f64::NAN);
    assert_eq!(f.player.volume(), 0.6);

    f.player.play().unwrap();
    assert_eq!(
        *f.device.handle().gain.lock().unwrap(),
        Some(Gain::from_volume(0.6))
    );

    f.player.set_volume(0.0);
    let gain = f.device.handle().gain.lock().unwrap().unwrap();
    assert!(gain.silent);

    // Volume survives track changes.
    f.player.next().unwrap();
    assert_eq!(f.player.volume(), 0.0);
}

#[test]
fn seek_while_stopped_reports_not_playing() {
    let f = fixture(2);
    assert!(matches!(f.player.seek_forward(), Err(PlayerError::NotPlaying)));
    assert!(matches!(f.player.seek_backward(), Err(PlayerError::NotPlaying)));
    assert!(matches!(
        f.player.seek_to_position(0.5),
        Err(PlayerError::NotPlaying)
    ));
    assert_eq!(f.player.current_time(), Duration::ZERO);
}

#[test]
fn seek_steps_ten_seconds_and_clamps_to_track_bounds() {
    let f = fixture(1);
    f.player.play().unwrap();

    f.player.seek_forward().unwrap();
    assert_eq!(f.player.current_time(), Duration::from_secs(10));

    f.device.set_position(Duration::from_secs(25));
    f.player.seek_forward().unwrap();
    assert_eq!(*f.device.handle().seeks.lock().unwrap().last().unwrap(), TRACK_FRAMES - 1);
    assert!(f.player.current_time() <= f.player.total_time());

    f.device.set_position(Duration::from_secs(4));
    f.player.seek_backward().unwrap();
    assert_eq!(f.player.current_time(), Duration::ZERO);
}

#[test]
fn stream_of_unknown_length_still_reports_and_seeks() {
    let decoder = FakeDecoder {
        unknown_length: HashSet::from(["live.mp3".to_string()]),
        ..FakeDecoder::default()
    };
    let f = fixture_on(&["live.mp3"], decoder);
    f.player.play().unwrap();
    assert_eq!(f.player.total_time(), Duration::ZERO);

    f.device.set_position(Duration::from_secs(42));
    let info = f.player.info();
    assert_eq!(info.elapsed, Duration::from_secs(42));
    assert_eq!(info.progress, 0.0);
    assert_eq!(f.player.current_time(), info.elapsed);

    f.player.seek_forward().unwrap();
    let expected = StreamFormat::new(RATE, 2).duration_to_frames(Duration::from_secs(52));
    assert_eq!(*f.device.handle().seeks.lock().unwrap().last().unwrap(), expected);
    assert_eq!(f.player.current_time(), Duration::from_secs(52));

    f.player.seek_backward().unwrap();
    assert_eq!(f.player.current_time(), Duration::from_secs(42));
}

#[test]
fn seek_is_allowed_while_paused() {
    let f = fixture(1);
    f.player.play().unwrap();
    f.player.pause();
    f.player.seek_forward().unwrap();
    assert_eq!(f.player.current_time(), Duration::from_secs(10));
    assert_eq!(f.player.playback_state(), PlaybackState::Paused);
}

#[test]
fn seek_to_position_uses_ratio_of_stream_length() {
    let f = fixture(1);
    f.player.play().unwrap();

    f.player.seek_to_position(0.5).unwrap();
    assert_eq!(f.player.current_time(), Duration::from_secs(15));
    assert!((f.player.progress() - 0.5).abs() < 1e-9);

    f.player.seek_to_position(3.0).unwrap();
    assert_eq!(*f.device.handle().seeks.lock().unwrap().last().unwrap(), TRACK_FRAMES);

    f.player.seek_to_position(-1.0).unwrap();
    assert_eq!(f.player.current_time(), Duration::ZERO);
}

#[test]
fn toggle_shuffle_builds_permutation_and_keeps_current_track() {
    let f = fixture(12);
    f.player.skip(5).unwrap();
    let before = current_path(&f);

    assert!(f.player.toggle_shuffle());
    assert_eq!(current_path(&f), before);

    let order = f.player.order();
    assert_eq!(order.len(), 12);
    let unique: HashSet<usize> = order.iter().copied().collect();
    assert_eq!(unique.len(), 12);

    assert!(!f.player.toggle_shuffle());
    assert_eq!(current_path(&f), before);
    assert_eq!(f.player.current_index(), 5);
    assert_eq!(f.player.order(), (0..12).collect::<Vec<_>>());
}

#[test]
fn toggle_shuffle_does_not_interrupt_playback() {
    let f = fixture(4);
    f.player.play().unwrap();
    let handle = f.device.handle();
    f.player.toggle_shuffle();
    assert!(f.player.is_playing());
    assert!(!handle.detached.load(Ordering::SeqCst));
}

#[test]
fn toggle_repeat_cycles_back_after_three_steps() {
    let f = fixture(1);
    let start = f.player.repeat_mode();
    assert_eq!(f.player.toggle_repeat(), RepeatMode::One);
    assert_eq!(f.player.toggle_repeat(), RepeatMode::All);
    assert_eq!(f.player.toggle_repeat(), RepeatMode::Off);
    assert_eq!(f.player.repeat_mode(), start);
}

#[test]
fn skip_out_of_range_leaves_current_track_alone() {
    let f = fixture(3);
    f.player.skip(1).unwrap();
    let handle = f.device.handle();

    let err = f.player.skip(3).unwrap_err();
    assert!(matches!(err, PlayerError::IndexOutOfRange { index: 3, len: 3 }));
    assert_eq!(current_path(&f), f.tracks[1].path);
    assert!(f.player.is_playing());
    assert!(!handle.detached.load(Ordering::SeqCst));
}

#[test]
fn skip_under_shuffle_plays_the_requested_catalog_track() {
    let f = fixture(8);
    f.player.toggle_shuffle();
    f.player.skip(2).unwrap();
    assert_eq!(current_path(&f), f.tracks[2].path);

    let info = f.player.info();
    assert_eq!(info.catalog_index, Some(2));
    assert!(info.shuffle);
}

#[test]
fn repeat_off_stops_after_the_last_track() {
    let f = fixture(3);
    f.player.play().unwrap();

    finish_current(&f);
    assert_eq!(f.player.current_index(), 1);
    assert!(f.player.is_playing());

    finish_current(&f);
    assert_eq!(f.player.current_index(), 2);
    assert!(f.player.is_playing());

    finish_current(&f);
    assert_eq!(f.player.playback_state(), PlaybackState::Stopped);
    assert_eq!(f.player.current_index(), 2);
    assert_eq!(f.device.open.load(Ordering::SeqCst), 0);
}

#[test]
fn repeat_all_wraps_back_to_the_first_track() {
    let f = fixture(3);
    f.player.set_repeat_mode(RepeatMode::All);
    f.player.play().unwrap();

    for _ in 0..3 {
        finish_current(&f);
    }
    assert_eq!(f.player.current_index(), 0);
    assert!(f.player.is_playing());
}

#[test]
fn repeat_all_reshuffles_on_wrap() {
    let f = fixture(6);
    f.player.set_repeat_mode(RepeatMode::All);
    f.player.toggle_shuffle();
    f.player.skip(0).unwrap();
    let start = f.player.current_index();

    for _ in 0..(6 - start) {
        finish_current(&f);
    }
    assert_eq!(f.player.current_index(), 0);
    assert!(f.player.shuffle());
    let unique: HashSet<usize> = f.player.order().into_iter().collect();
    assert_eq!(unique.len(), 6);
}

#[test]
fn repeat_one_restarts_the_same_track() {
    let f = fixture(3);
    f.player.set_repeat_mode(RepeatMode::One);
    f.player.skip(1).unwrap();
    f.device.set_position(Duration::from_secs(29));
    let first = f.device.handle();

    finish_current(&f);
    assert_eq!(f.player.current_index(), 1);
    assert!(f.player.is_playing());
    assert!(first.detached.load(Ordering::SeqCst));
    assert_eq!(f.player.current_time(), Duration::ZERO);
    assert_eq!(f.device.attach_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn stale_completion_is_discarded() {
    let f = fixture(4);
    f.player.play().unwrap();
    let stale = f.device.take_signal().generation();

    f.player.next().unwrap();
    f.player.on_stream_finished(stale).unwrap();
    assert_eq!(f.player.current_index(), 1);

    f.player.stop();
    let after_stop = f.player.generation();
    f.player.on_stream_finished(after_stop).unwrap();
    assert_eq!(f.player.playback_state(), PlaybackState::Stopped);
}

#[test]
fn completion_while_paused_is_handled_on_resume() {
    let f = fixture(3);
    f.player.play().unwrap();
    let generation = f.device.take_signal().generation();

    f.player.pause();
    f.player.on_stream_finished(generation).unwrap();
    assert_eq!(f.player.current_index(), 0);
    assert_eq!(f.player.playback_state(), PlaybackState::Paused);

    f.player.resume().unwrap();
    assert_eq!(f.player.current_index(), 1);
    assert!(f.player.is_playing());
}

#[test]
fn watcher_thread_advances_on_real_signal() {
    let f = fixture(3);
    f.player.play().unwrap();

    f.device.take_signal().notify();
    assert!(wait_until(|| f.player.current_index() == 1 && f.player.is_playing()));
}

#[test]
fn concurrent_callers_leave_a_consistent_cursor() {
    let f = fixture(5);
    f.player.play().unwrap();

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let player = f.player.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    if i % 2 == 0 {
                        player.next().unwrap();
                    } else {
                        player.previous().unwrap();
                    }
                    let _ = player.info();
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    assert!(f.player.current_index() < 5);
    assert!(f.player.is_playing());
    assert_eq!(f.device.max_open.load(Ordering::SeqCst), 1);
}

#[test]
fn replace_catalog_stops_and_resets_cursor() {
    let f = fixture(3);
    f.player.toggle_shuffle();
    f.player.skip(2).unwrap();

    let extra = f.tracks[..2].to_vec();
    f.player.replace_catalog(extra);
    assert_eq!(f.player.playback_state(), PlaybackState::Stopped);
    assert_eq!(f.player.current_index(), 0);
    assert_eq!(f.player.catalog().len(), 2);
    assert!(f.player.shuffle());
    assert_eq!(f.player.order().len(), 2);
    assert_eq!(f.player.total_time(), Duration::ZERO);
}

#[test]
fn dropping_the_last_handle_detaches_the_stream() {
    let f = fixture(2);
    f.player.play().unwrap();
    let handle = f.device.handle();
    let Fixture { player, device, .. } = f;
    drop(player);
    assert!(handle.detached.load(Ordering::SeqCst));
    assert_eq!(device.open.load(Ordering::SeqCst), 0);
}
