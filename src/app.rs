//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the catalog as shown on
//! screen, the selection, the filter and the last playback snapshot polled
//! from the engine.

mod browse;
mod model;

pub use browse::*;
pub use model::*;

#[cfg(test)]
mod tests;
