use crate::config::TrackDisplayField;

use super::model::Track;

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Compose a label for `track` from `fields`, joined by `sep`.
///
/// `Display` reuses `track.display` when it is already set, otherwise it
/// expands to artist and title. Empty fields are skipped; if nothing is
/// produced the title is returned.
pub fn display_from_fields(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        match f {
            TrackDisplayField::Display => {
                if let Some(d) = non_blank(Some(&track.display)) {
                    parts.push(d.to_string());
                } else {
                    parts.extend(non_blank(track.artist.as_deref()).map(str::to_string));
                    parts.extend(non_blank(Some(&track.title)).map(str::to_string));
                }
            }
            TrackDisplayField::Title => {
                parts.extend(non_blank(Some(&track.title)).map(str::to_string));
            }
            TrackDisplayField::Artist => {
                parts.extend(non_blank(track.artist.as_deref()).map(str::to_string));
            }
            TrackDisplayField::Album => {
                parts.extend(non_blank(track.album.as_deref()).map(str::to_string));
            }
            TrackDisplayField::Year => {
                parts.extend(track.year.map(|y| y.to_string()));
            }
            TrackDisplayField::Filename => {
                let stem = track.path.file_stem().and_then(|s| s.to_str());
                parts.extend(non_blank(stem).map(str::to_string));
            }
            TrackDisplayField::Path => {
                parts.push(track.path.display().to_string());
            }
        }
    }

    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(sep)
    }
}
