//! Decoder capability: turns an open audio file into a seekable sample stream.
//!
//! Dispatch is by file extension (`mp3`, `wav`, `flac`); everything else is
//! rejected before any decoding is attempted.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rodio::Source;

use super::error::{PlayerError, Result};
use super::types::StreamFormat;

/// Container formats the engine knows how to play.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Flac,
}

impl AudioFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "mp3" => Ok(Self::Mp3),
            "wav" => Ok(Self::Wav),
            "flac" => Ok(Self::Flac),
            _ => Err(PlayerError::UnsupportedFormat {
                extension: if ext.is_empty() {
                    "(none)".to_string()
                } else {
                    format!(".{ext}")
                },
            }),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Flac => "flac",
        }
    }
}

/// A decoded, seekable stream of interleaved `f32` samples.
pub trait SampleStream: Iterator<Item = f32> + Send {
    fn format(&self) -> StreamFormat;

    /// Length in frames as reported by the decoder when the stream was opened.
    /// Zero when the decoder could not tell.
    fn len_frames(&self) -> u64;

    /// Reposition the decoder so the next sample returned belongs to `frame`.
    fn seek_frames(&mut self, frame: u64) -> Result<()>;
}

pub trait Decode: Send + Sync {
    /// Decode the header of `file` and return a stream positioned at frame 0.
    fn decode(&self, path: &Path, file: File, format: AudioFormat) -> Result<Box<dyn SampleStream>>;
}

/// `Decode` implementation backed by `rodio`'s symphonia decoders.
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioDecoder;

impl Decode for RodioDecoder {
    fn decode(&self, path: &Path, file: File, format: AudioFormat) -> Result<Box<dyn SampleStream>> {
        let byte_len = file.metadata().ok().map(|m| m.len());

        let mut builder = rodio::Decoder::builder()
            .with_data(BufReader::new(file))
            .with_hint(format.extension())
            .with_seekable(true);
        if let Some(len) = byte_len {
            builder = builder.with_byte_len(len);
        }

        let inner = builder.build().map_err(|e| PlayerError::CorruptFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let stream_format = StreamFormat::new(inner.sample_rate(), inner.channels());
        if stream_format.sample_rate == 0 || stream_format.channels == 0 {
            return Err(PlayerError::CorruptFormat {
                path: path.to_path_buf(),
                reason: "stream reports no samples".to_string(),
            });
        }

        // Computed once; some MP3 encodings report an inaccurate length.
        let len_frames = inner
            .total_duration()
            .map(|d| stream_format.duration_to_frames(d))
            .unwrap_or(0);

        Ok(Box::new(RodioStream {
            inner,
            path: path.to_path_buf(),
            format: stream_format,
            len_frames,
        }))
    }
}

struct RodioStream {
    inner: rodio::Decoder<BufReader<File>>,
    path: PathBuf,
    format: StreamFormat,
    len_frames: u64,
}

impl Iterator for RodioStream {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        self.inner.next()
    }
}

impl SampleStream for RodioStream {
    fn format(&self) -> StreamFormat {
        self.format
    }

    fn len_frames(&self) -> u64 {
        self.len_frames
    }

    fn seek_frames(&mut self, frame: u64) -> Result<()> {
        let pos = self.format.frames_to_duration(frame);
        self.inner
            .try_seek(pos)
            .map_err(|e| PlayerError::Seek(format!("{}: {e}", self.path.display())))
    }
}
