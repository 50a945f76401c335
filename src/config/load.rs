use std::{env, path::PathBuf};

use super::schema::Settings;

const ENV_PREFIX: &str = "ENCORE";
const CONFIG_PATH_VAR: &str = "ENCORE_CONFIG_PATH";

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `ENCORE__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Reject values the player cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.audio.buffer_ms == 0 {
            return Err("audio.buffer_ms must be >= 1".to_string());
        }
        if self.audio.seek_seconds == 0 {
            return Err("audio.seek_seconds must be >= 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.audio.initial_volume) {
            return Err("audio.initial_volume must be within [0, 1]".to_string());
        }
        if !(self.controls.volume_step > 0.0 && self.controls.volume_step <= 1.0) {
            return Err("controls.volume_step must be within (0, 1]".to_string());
        }
        if self.ui.tick_rate_hz == 0 {
            return Err("ui.tick_rate_hz must be >= 1".to_string());
        }
        if self.playlists.default_playlist.trim().is_empty() {
            return Err("playlists.default_playlist must not be empty".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `ENCORE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_PATH_VAR) {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// `$XDG_CONFIG_HOME/encore`, or `~/.config/encore` when `XDG_CONFIG_HOME`
/// is not set.
pub fn config_dir() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("encore"))
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}
