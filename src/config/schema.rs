use std::path::PathBuf;

use serde::Deserialize;

use crate::audio::RepeatMode;

use super::load::config_dir;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/encore/config.toml` or `~/.config/encore/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `ENCORE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub playback: PlaybackSettings,
    pub ui: UiSettings,
    pub controls: ControlsSettings,
    pub library: LibrarySettings,
    pub playlists: PlaylistSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Output buffer requested when the device is opened (milliseconds).
    pub buffer_ms: u64,
    /// Distance covered by one seek step (seconds).
    pub seek_seconds: u64,
    /// Volume in `[0, 1]` applied at startup.
    pub initial_volume: f64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            buffer_ms: 100,
            seek_seconds: 10,
            initial_volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Start the first track as soon as the catalog is loaded.
    pub autoplay: bool,
    /// Whether shuffle starts enabled.
    pub shuffle: bool,
    /// Repeat mode applied at startup.
    pub repeat: RepeatSetting,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            autoplay: true,
            shuffle: false,
            repeat: RepeatSetting::Off,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatSetting {
    #[default]
    #[serde(alias = "none", alias = "no-repeat", alias = "no_repeat")]
    Off,
    #[serde(
        alias = "single",
        alias = "track",
        alias = "repeat-one",
        alias = "repeat_one"
    )]
    One,
    #[serde(
        alias = "playlist",
        alias = "loop",
        alias = "repeat-all",
        alias = "repeat_all"
    )]
    All,
}

impl From<RepeatSetting> for RepeatMode {
    fn from(setting: RepeatSetting) -> Self {
        match setting {
            RepeatSetting::Off => RepeatMode::Off,
            RepeatSetting::One => RepeatMode::One,
            RepeatSetting::All => RepeatMode::All,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Redraw and poll rate of the event loop.
    pub tick_rate_hz: u64,

    /// Whether the cursor starts in "follow playback" mode.
    pub follow_playback: bool,

    /// The text rendered inside the top header box.
    pub header_text: String,

    /// Which track fields to show in the status "Song:" line, and in what order.
    ///
    /// Example: ["artist", "title", "album"]
    pub now_playing_track_fields: Vec<TrackDisplayField>,

    /// Separator used to join `now_playing_track_fields`.
    pub now_playing_track_separator: String,

    /// Which time fields to show for the status line, and in what order.
    ///
    /// Example: ["elapsed", "total", "remaining"]
    pub now_playing_time_fields: Vec<TimeField>,

    /// Separator used to join `now_playing_time_fields`.
    pub now_playing_time_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            tick_rate_hz: 30,
            follow_playback: true,
            header_text: " ~ encore ~ ".to_string(),
            now_playing_track_fields: vec![TrackDisplayField::Display],
            now_playing_track_separator: " - ".to_string(),
            now_playing_time_fields: vec![TimeField::Elapsed, TimeField::Total, TimeField::Remaining],
            now_playing_time_separator: " / ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Volume change applied by `+` / `-`.
    pub volume_step: f64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self { volume_step: 0.05 }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeField {
    Elapsed,
    Total,
    Remaining,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    /// Use `track.display` (whatever the scanner produced).
    Display,
    Title,
    Artist,
    Album,
    Year,
    Filename,
    Path,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,

    /// Which fields to use to build `Track.display` and its ordering.
    ///
    /// Example: ["artist", "title"] -> "Artist - Title"
    pub display_fields: Vec<TrackDisplayField>,
    /// Separator used to join `display_fields`.
    pub display_separator: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
            display_fields: vec![TrackDisplayField::Artist, TrackDisplayField::Title],
            display_separator: " - ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaylistSettings {
    /// Where playlist JSON files live. Defaults to `<config dir>/encore/playlists`.
    pub directory: Option<PathBuf>,
    /// Playlist that `a` adds the selected track to.
    pub default_playlist: String,
}

impl Default for PlaylistSettings {
    fn default() -> Self {
        Self {
            directory: None,
            default_playlist: "favorites".to_string(),
        }
    }
}

impl PlaylistSettings {
    pub fn resolved_directory(&self) -> Option<PathBuf> {
        self.directory
            .clone()
            .or_else(|| config_dir().map(|d| d.join("playlists")))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `encore=debug`. `ENCORE_LOG` wins.
    pub level: String,
    /// Log file. Defaults to `<config dir>/encore/encore.log`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingSettings {
    pub fn resolved_file(&self) -> Option<PathBuf> {
        self.file
            .clone()
            .or_else(|| config_dir().map(|d| d.join("encore.log")))
    }
}
