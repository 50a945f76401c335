//! Named playlists persisted as JSON files, with M3U export.

mod error;
mod m3u;
mod store;

pub use error::{PlaylistError, Result};
pub use m3u::write_m3u;
pub use store::{Playlist, PlaylistStore};
