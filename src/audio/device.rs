//! Output device capability and its `rodio` implementation.
//!
//! The device is a process-wide resource: it is opened once and every engine
//! attaches at most one stream to it at a time. An attached stream reports
//! natural exhaustion through a one-shot `CompletionSignal`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread;
use std::time::Duration;

use rodio::mixer::Mixer;
use rodio::source::SeekError;
use rodio::{OutputStream, OutputStreamBuilder, Sink, Source};

use super::decode::SampleStream;
use super::error::{PlayerError, Result};
use super::types::{Gain, StreamFormat};

/// One-shot "stream drained" notification, tagged with the engine generation
/// that armed it.
#[derive(Debug)]
pub struct CompletionSignal {
    generation: u64,
    tx: Sender<u64>,
}

impl CompletionSignal {
    pub(crate) fn new(generation: u64, tx: Sender<u64>) -> Self {
        Self { generation, tx }
    }

    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn notify(self) {
        // The engine may already be gone; nobody is left to care.
        let _ = self.tx.send(self.generation);
    }
}

/// A stream currently attached to the output device.
pub trait ActiveStream: Send {
    fn set_paused(&self, paused: bool);
    fn set_gain(&self, gain: Gain);
    /// Decoder sample cursor, in frames.
    fn position_frames(&self) -> u64;
    fn seek_frames(&self, frame: u64) -> Result<()>;
    /// Halt output and release the decoder and its file. A detached stream
    /// never fires its completion signal.
    fn detach(&mut self);
}

pub trait OutputDevice: Send + Sync {
    /// Open the device. Only the first successful call has any effect.
    fn initialize(&self, format: StreamFormat, buffer: Duration) -> Result<()>;

    fn attach(
        &self,
        stream: Box<dyn SampleStream>,
        gain: Gain,
        done: CompletionSignal,
    ) -> Result<Box<dyn ActiveStream>>;
}

/// The default system output, driven by `rodio`.
#[derive(Default)]
pub struct RodioDevice {
    mixer: OnceLock<Mixer>,
    init: Mutex<()>,
}

impl RodioDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default output. Every engine built by
    /// `AudioPlayer::new` attaches to this one device.
    pub fn shared() -> Arc<RodioDevice> {
        static DEVICE: OnceLock<Arc<RodioDevice>> = OnceLock::new();
        DEVICE.get_or_init(|| Arc::new(RodioDevice::new())).clone()
    }
}

fn open_stream(format: StreamFormat, buffer: Duration) -> std::result::Result<OutputStream, String> {
    let buffer_frames = format.duration_to_frames(buffer).clamp(1, u32::MAX as u64) as u32;

    let mut stream = OutputStreamBuilder::from_default_device()
        .map_err(|e| e.to_string())?
        .with_sample_rate(format.sample_rate)
        .with_buffer_size(rodio::cpal::BufferSize::Fixed(buffer_frames))
        .open_stream_or_fallback()
        .map_err(|e| e.to_string())?;
    // rodio logs to stderr when the stream is dropped, which garbles the TUI.
    stream.log_on_drop(false);
    Ok(stream)
}

impl OutputDevice for RodioDevice {
    fn initialize(&self, format: StreamFormat, buffer: Duration) -> Result<()> {
        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if self.mixer.get().is_some() {
            return Ok(());
        }

        // The output stream lives on its own thread for the rest of the
        // process; only its mixer handle is shared.
        let (tx, rx) = mpsc::channel::<std::result::Result<Mixer, String>>();
        thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let stream = match open_stream(format, buffer) {
                    Ok(s) => s,
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        return;
                    }
                };
                let _ = tx.send(Ok(stream.mixer().clone()));
                loop {
                    thread::park();
                }
            })
            .map_err(|e| PlayerError::DeviceInit(e.to_string()))?;

        let mixer = rx
            .recv()
            .map_err(|_| PlayerError::DeviceInit("output thread exited".to_string()))?
            .map_err(PlayerError::DeviceInit)?;
        let _ = self.mixer.set(mixer);
        Ok(())
    }

    fn attach(
        &self,
        stream: Box<dyn SampleStream>,
        gain: Gain,
        done: CompletionSignal,
    ) -> Result<Box<dyn ActiveStream>> {
        let mixer = self
            .mixer
            .get()
            .ok_or_else(|| PlayerError::DeviceInit("device not initialized".to_string()))?;

        let format = stream.format();
        let control = Arc::new(StreamControl::default());
        let source = DeviceSource {
            stream,
            format,
            samples: 0,
            control: control.clone(),
            done: Some(done),
        };

        let sink = Sink::connect_new(mixer);
        sink.set_volume(gain.amplitude());
        sink.append(source);

        Ok(Box::new(RodioStream {
            sink,
            format,
            control,
        }))
    }
}

/// State shared between the engine-side handle and the mixer-side source.
#[derive(Default)]
struct StreamControl {
    /// Interleaved samples handed to the mixer so far.
    samples: AtomicU64,
    detached: AtomicBool,
    seek_error: Mutex<Option<String>>,
}

impl StreamControl {
    fn take_seek_error(&self) -> Option<String> {
        self.seek_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Adapter feeding a `SampleStream` into the rodio mixer while tracking its
/// position and firing the completion signal on exhaustion.
struct DeviceSource {
    stream: Box<dyn SampleStream>,
    format: StreamFormat,
    samples: u64,
    control: Arc<StreamControl>,
    done: Option<CompletionSignal>,
}

impl Iterator for DeviceSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.control.detached.load(Ordering::Acquire) {
            self.done = None;
            return None;
        }

        match self.stream.next() {
            Some(sample) => {
                self.samples += 1;
                self.control.samples.store(self.samples, Ordering::Relaxed);
                Some(sample)
            }
            None => {
                if let Some(done) = self.done.take() {
                    done.notify();
                }
                None
            }
        }
    }
}

impl Source for DeviceSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.format.channels
    }

    fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        match self.stream.len_frames() {
            0 => None,
            n => Some(self.format.frames_to_duration(n)),
        }
    }

    fn try_seek(&mut self, pos: Duration) -> std::result::Result<(), SeekError> {
        let frame = self.format.duration_to_frames(pos);
        match self.stream.seek_frames(frame) {
            Ok(()) => {
                self.samples = frame * self.format.channels as u64;
                self.control.samples.store(self.samples, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                *self
                    .control
                    .seek_error
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(e.to_string());
                Err(SeekError::NotSupported {
                    underlying_source: std::any::type_name::<Self>(),
                })
            }
        }
    }
}

struct RodioStream {
    sink: Sink,
    format: StreamFormat,
    control: Arc<StreamControl>,
}

impl ActiveStream for RodioStream {
    fn set_paused(&self, paused: bool) {
        if paused {
            self.sink.pause();
        } else {
            self.sink.play();
        }
    }

    fn set_gain(&self, gain: Gain) {
        self.sink.set_volume(gain.amplitude());
    }

    fn position_frames(&self) -> u64 {
        self.control.samples.load(Ordering::Relaxed) / self.format.channels.max(1) as u64
    }

    fn seek_frames(&self, frame: u64) -> Result<()> {
        let pos = self.format.frames_to_duration(frame);
        self.sink.try_seek(pos).map_err(|e| {
            PlayerError::Seek(self.control.take_seek_error().unwrap_or_else(|| e.to_string()))
        })?;
        self.control
            .samples
            .store(frame * self.format.channels as u64, Ordering::Relaxed);
        Ok(())
    }

    fn detach(&mut self) {
        self.control.detached.store(true, Ordering::Release);
        self.sink.stop();
    }
}

impl Drop for RodioStream {
    fn drop(&mut self) {
        self.detach();
    }
}
