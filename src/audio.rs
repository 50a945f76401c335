//! Playback engine.
//!
//! `AudioPlayer` owns the track cursor, the shuffle ordering and at most one
//! decode stream attached to the shared output device. Commands and queries
//! are safe from any thread; a background watcher advances playback when a
//! stream runs dry.

mod decode;
mod device;
mod engine;
mod error;
mod order;
mod player;
mod types;
mod watcher;

pub use decode::{AudioFormat, Decode, RodioDecoder, SampleStream};
pub use device::{ActiveStream, CompletionSignal, OutputDevice, RodioDevice};
pub use error::{PlayerError, Result};
pub use player::{AudioPlayer, PlayerSettings};
pub use types::*;

#[cfg(test)]
mod tests;
