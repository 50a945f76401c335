use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("playlist {0:?} already exists")]
    AlreadyExists(String),

    #[error("playlist {0:?} does not exist")]
    NotFound(String),

    #[error("invalid playlist name {0:?}")]
    InvalidName(String),

    #[error("{path:?} is already in playlist {playlist:?}")]
    DuplicateTrack { playlist: String, path: PathBuf },

    #[error("track index {index} out of range (playlist has {len} tracks)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("playlist I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed playlist {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, PlaylistError>;
