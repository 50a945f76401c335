use std::path::Path;
use std::time::Duration;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::{ItemKey, Tag};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::display::display_from_fields;
use super::model::Track;

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Leading four-digit year of a date tag such as `1997` or `1997-03-01`.
pub(super) fn parse_year(raw: &str) -> Option<u32> {
    let digits: String = raw.trim().chars().take(4).collect();
    if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}

fn tag_text(tag: &Tag, key: ItemKey) -> Option<String> {
    tag.get_string(&key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Read title/artist/album/year and duration into `track`. Unreadable files
/// keep their file-stem title.
fn read_tags(track: &mut Track) {
    let tagged = match lofty::read_from_path(&track.path) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!(path = %track.path.display(), error = %e, "no readable tags");
            return;
        }
    };

    let duration: Duration = tagged.properties().duration();
    track.duration = Some(duration);

    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return;
    };
    if let Some(v) = tag_text(tag, ItemKey::TrackTitle) {
        track.title = v;
    }
    track.artist = tag_text(tag, ItemKey::TrackArtist);
    track.album = tag_text(tag, ItemKey::AlbumTitle);
    track.year = tag_text(tag, ItemKey::Year)
        .or_else(|| tag_text(tag, ItemKey::RecordingDate))
        .and_then(|v| parse_year(&v));
}

/// Walk `dir` and return every audio file it holds, sorted by display
/// string (case-insensitive).
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable library entry");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() || !is_audio_file(path, settings) {
            continue;
        }

        let mut track = Track::new(path.to_path_buf());
        read_tags(&mut track);
        track.display.clear();
        track.display =
            display_from_fields(&track, &settings.display_fields, &settings.display_separator);
        tracks.push(track);
    }

    tracks.sort_by_cached_key(|t| t.display.to_lowercase());
    tracing::info!(dir = %dir.display(), count = tracks.len(), "library scanned");
    tracks
}
