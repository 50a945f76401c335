//! Library column: saved playlists plus album and artist groupings of the
//! catalog loaded at startup.

use std::collections::HashMap;

use crate::library::Track;

const UNKNOWN_ALBUM: &str = "Unknown Album";
const UNKNOWN_ARTIST: &str = "Unknown Artist";

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Section {
    #[default]
    Playlists,
    Albums,
    Artists,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Playlists, Section::Albums, Section::Artists];

    pub fn next(self) -> Self {
        match self {
            Section::Playlists => Section::Albums,
            Section::Albums => Section::Artists,
            Section::Artists => Section::Playlists,
        }
    }

    pub fn prev(self) -> Self {
        self.next().next()
    }

    pub fn label(self) -> &'static str {
        match self {
            Section::Playlists => "Playlists",
            Section::Albums => "Albums",
            Section::Artists => "Artists",
        }
    }

    fn slot(self) -> usize {
        match self {
            Section::Playlists => 0,
            Section::Albums => 1,
            Section::Artists => 2,
        }
    }
}

/// Which pane receives movement keys.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Tracks,
    Library,
}

/// Tracks sharing an album or an artist, in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Case-folded identity.
    pub key: String,
    /// Human readable name, e.g. `Title - Artist`.
    pub title: String,
    pub tracks: Vec<Track>,
}

/// A saved playlist as listed in the library column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub name: String,
    pub len: usize,
}

/// What the highlighted library row would load.
#[derive(Debug, Clone, PartialEq)]
pub enum Pick {
    Playlist(String),
    Group { label: String, tracks: Vec<Track> },
}

fn album_title(track: &Track) -> String {
    if let Some(album) = track.album.as_deref().filter(|a| !a.trim().is_empty()) {
        return album.to_string();
    }
    track
        .path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(UNKNOWN_ALBUM)
        .to_string()
}

fn artist_name(track: &Track) -> &str {
    track
        .artist
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or(UNKNOWN_ARTIST)
}

fn collect_groups(
    tracks: &[Track],
    name: impl Fn(&Track) -> (String, String),
) -> Vec<(String, String, Vec<Track>)> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, String, Vec<Track>)> = Vec::new();
    for track in tracks {
        let (title, artist) = name(track);
        let key = format!("{title}|{artist}").to_lowercase();
        match slots.get(&key) {
            Some(&slot) => groups[slot].2.push(track.clone()),
            None => {
                slots.insert(key, groups.len());
                groups.push((title, artist, vec![track.clone()]));
            }
        }
    }
    groups
}

/// Albums keyed by album title and artist. A track without an album tag
/// falls under its parent directory name.
pub fn album_groups(tracks: &[Track]) -> Vec<Group> {
    let mut groups = collect_groups(tracks, |t| (album_title(t), artist_name(t).to_string()));
    groups.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    groups
        .into_iter()
        .map(|(title, artist, tracks)| Group {
            key: format!("{title}|{artist}").to_lowercase(),
            title: format!("{title} - {artist}"),
            tracks,
        })
        .collect()
}

pub fn artist_groups(tracks: &[Track]) -> Vec<Group> {
    let mut groups = collect_groups(tracks, |t| (artist_name(t).to_string(), String::new()));
    groups.sort_by(|a, b| a.0.cmp(&b.0));
    groups
        .into_iter()
        .map(|(name, _, tracks)| Group {
            key: name.to_lowercase(),
            title: name,
            tracks,
        })
        .collect()
}

/// State of the library column.
#[derive(Debug, Clone, Default)]
pub struct Browser {
    pub section: Section,
    pub focus: Focus,
    library: Vec<Track>,
    library_label: String,
    /// Set when the startup catalog is a saved playlist.
    library_playlist: Option<String>,
    albums: Vec<Group>,
    artists: Vec<Group>,
    playlists: Vec<PlaylistEntry>,
    cursors: [usize; 3],
    /// Section and key of the group currently handed to the engine.
    loaded: Option<(Section, String)>,
}

impl Browser {
    pub fn new(library: Vec<Track>) -> Self {
        Self {
            albums: album_groups(&library),
            artists: artist_groups(&library),
            library,
            ..Self::default()
        }
    }

    /// The startup catalog and its label.
    pub fn library(&self) -> (&[Track], &str) {
        (&self.library, &self.library_label)
    }

    pub fn set_library_label(&mut self, label: impl Into<String>) {
        self.library_label = label.into();
    }

    pub fn library_playlist(&self) -> Option<&str> {
        self.library_playlist.as_deref()
    }

    pub fn set_library_playlist(&mut self, name: Option<String>) {
        self.library_playlist = name;
    }

    pub fn set_playlists(&mut self, entries: impl IntoIterator<Item = (String, usize)>) {
        self.playlists = entries
            .into_iter()
            .map(|(name, len)| PlaylistEntry { name, len })
            .collect();
        self.clamp_cursor(Section::Playlists);
    }

    pub fn len(&self, section: Section) -> usize {
        match section {
            Section::Playlists => self.playlists.len(),
            Section::Albums => self.albums.len(),
            Section::Artists => self.artists.len(),
        }
    }

    pub fn cursor(&self, section: Section) -> usize {
        self.cursors[section.slot()]
    }

    /// Row labels for `section`, with track counts.
    pub fn rows(&self, section: Section) -> Vec<String> {
        match section {
            Section::Playlists => self
                .playlists
                .iter()
                .map(|p| format!("{} ({} tracks)", p.name, p.len))
                .collect(),
            Section::Albums => group_rows(&self.albums),
            Section::Artists => group_rows(&self.artists),
        }
    }

    /// Row index of the loaded group when it belongs to `section`.
    pub fn loaded_row(&self, section: Section) -> Option<usize> {
        let (loaded_section, key) = self.loaded.as_ref()?;
        if *loaded_section != section {
            return None;
        }
        match section {
            Section::Playlists => self.playlists.iter().position(|p| &p.name == key),
            Section::Albums => self.albums.iter().position(|g| &g.key == key),
            Section::Artists => self.artists.iter().position(|g| &g.key == key),
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Tracks => Focus::Library,
            Focus::Library => Focus::Tracks,
        };
    }

    pub fn next_section(&mut self) {
        self.section = self.section.next();
    }

    pub fn prev_section(&mut self) {
        self.section = self.section.prev();
    }

    pub fn move_down(&mut self) {
        let len = self.len(self.section);
        if len > 0 {
            let slot = &mut self.cursors[self.section.slot()];
            *slot = (*slot + 1) % len;
        }
    }

    pub fn move_up(&mut self) {
        let len = self.len(self.section);
        if len > 0 {
            let slot = &mut self.cursors[self.section.slot()];
            *slot = (*slot + len - 1) % len;
        }
    }

    pub fn select_first(&mut self) {
        self.cursors[self.section.slot()] = 0;
    }

    pub fn select_last(&mut self) {
        self.cursors[self.section.slot()] = self.len(self.section).saturating_sub(1);
    }

    /// Name of the highlighted playlist, if the playlist section has one.
    pub fn highlighted_playlist(&self) -> Option<&str> {
        self.playlists
            .get(self.cursor(Section::Playlists))
            .map(|p| p.name.as_str())
    }

    /// What the highlighted row in the current section would load.
    pub fn pick(&self) -> Option<Pick> {
        let cursor = self.cursor(self.section);
        match self.section {
            Section::Playlists => self
                .playlists
                .get(cursor)
                .map(|p| Pick::Playlist(p.name.clone())),
            Section::Albums => self.albums.get(cursor).map(|g| Pick::Group {
                label: format!("Album: {}", g.title),
                tracks: g.tracks.clone(),
            }),
            Section::Artists => self.artists.get(cursor).map(|g| Pick::Group {
                label: format!("Artist: {}", g.title),
                tracks: g.tracks.clone(),
            }),
        }
    }

    /// Remember the highlighted row as the loaded one.
    pub fn mark_loaded(&mut self) {
        let cursor = self.cursor(self.section);
        let key = match self.section {
            Section::Playlists => self.playlists.get(cursor).map(|p| p.name.clone()),
            Section::Albums => self.albums.get(cursor).map(|g| g.key.clone()),
            Section::Artists => self.artists.get(cursor).map(|g| g.key.clone()),
        };
        self.loaded = key.map(|k| (self.section, k));
    }

    pub fn clear_loaded(&mut self) {
        self.loaded = None;
    }

    fn clamp_cursor(&mut self, section: Section) {
        let last = self.len(section).saturating_sub(1);
        let slot = &mut self.cursors[section.slot()];
        *slot = (*slot).min(last);
    }
}

fn group_rows(groups: &[Group]) -> Vec<String> {
    groups
        .iter()
        .map(|g| format!("{} ({})", g.title, g.tracks.len()))
        .collect()
}
