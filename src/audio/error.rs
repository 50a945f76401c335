//! Error types for the playback engine.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to open {path:?}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported audio format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("failed to decode {path:?}: {reason}")]
    CorruptFormat { path: PathBuf, reason: String },

    #[error("index out of range: {index} (catalog has {len} tracks)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no track is currently playing")]
    NotPlaying,

    #[error("failed to seek: {0}")]
    Seek(String),

    /// The output device could not be opened. Not recoverable.
    #[error("audio output device unavailable: {0}")]
    DeviceInit(String),
}

impl PlayerError {
    /// True for both unsupported and undecodable files.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. } | Self::CorruptFormat { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;
