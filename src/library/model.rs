use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One playable file. Two tracks are the same track when their paths match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub duration: Option<Duration>,
    #[serde(default)]
    pub display: String,
}

impl Track {
    /// A track with no tags read: title and display are the file stem.
    pub fn new(path: PathBuf) -> Self {
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        Self {
            display: title.clone(),
            path,
            title,
            artist: None,
            album: None,
            year: None,
            duration: None,
        }
    }
}
