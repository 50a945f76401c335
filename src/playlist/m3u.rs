use std::io::{self, Write};

use super::store::Playlist;

/// Write `playlist` as extended M3U. Unknown durations are written as `-1`.
pub fn write_m3u<W: Write>(playlist: &Playlist, mut out: W) -> io::Result<()> {
    writeln!(out, "#EXTM3U")?;
    for track in &playlist.tracks {
        let secs = track
            .duration
            .map(|d| d.as_secs() as i64)
            .unwrap_or(-1);
        match track.artist.as_deref().filter(|a| !a.trim().is_empty()) {
            Some(artist) => writeln!(out, "#EXTINF:{secs},{artist} - {}", track.title)?,
            None => writeln!(out, "#EXTINF:{secs},{}", track.title)?,
        }
        writeln!(out, "{}", track.path.display())?;
    }
    out.flush()
}
