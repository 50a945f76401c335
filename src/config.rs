//! Configuration loader and schema types.
//!
//! This module exposes the settings that drive the player (audio buffer,
//! startup playback modes, UI, library scan, playlists, logging) and the
//! helpers that layer them from defaults, a TOML file and the environment.

mod load;
mod schema;

pub use schema::*;
