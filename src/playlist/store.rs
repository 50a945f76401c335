use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::library::Track;

use super::error::{PlaylistError, Result};
use super::m3u::write_m3u;

const EXTENSION: &str = "json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Playlist {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tracks: Vec::new(),
        }
    }
}

/// All playlists under one directory, one `<name>.json` file each.
///
/// Every mutation is written through to disk before it returns.
#[derive(Debug)]
pub struct PlaylistStore {
    dir: PathBuf,
    playlists: BTreeMap<String, Playlist>,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PlaylistError + '_ {
    move |source| PlaylistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn validate_name(name: &str) -> Result<()> {
    let bad = name.trim().is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains(std::path::MAIN_SEPARATOR);
    if bad {
        return Err(PlaylistError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn load_file(path: &Path) -> Result<Playlist> {
    let data = fs::read(path).map_err(io_err(path))?;
    serde_json::from_slice(&data).map_err(|source| PlaylistError::Json {
        path: path.to_path_buf(),
        source,
    })
}

impl PlaylistStore {
    /// Create `dir` if needed and load every playlist in it. Files that
    /// cannot be read or parsed are skipped.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(io_err(&dir))?;

        let mut playlists = BTreeMap::new();
        for entry in fs::read_dir(&dir).map_err(io_err(&dir))? {
            let path = match entry {
                Ok(e) => e.path(),
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "skipping playlist entry");
                    continue;
                }
            };
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match load_file(&path) {
                Ok(mut playlist) => {
                    // The file name is authoritative; saves go back to the same file.
                    playlist.name = stem.to_string();
                    playlists.insert(playlist.name.clone(), playlist);
                }
                Err(e) => tracing::warn!(error = %e, "skipping unreadable playlist"),
            }
        }

        tracing::debug!(dir = %dir.display(), count = playlists.len(), "playlists loaded");
        Ok(Self { dir, playlists })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{EXTENSION}"))
    }

    fn save(&self, name: &str) -> Result<()> {
        let playlist = self.get(name)?;
        let path = self.path_for(name);
        let data = serde_json::to_vec_pretty(playlist).map_err(|source| PlaylistError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, data).map_err(io_err(&path))
    }

    pub fn create(&mut self, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.playlists.contains_key(name) {
            return Err(PlaylistError::AlreadyExists(name.to_string()));
        }
        self.playlists.insert(name.to_string(), Playlist::new(name));
        if let Err(e) = self.save(name) {
            self.playlists.remove(name);
            return Err(e);
        }
        tracing::info!(playlist = name, "playlist created");
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        if self.playlists.remove(name).is_none() {
            return Err(PlaylistError::NotFound(name.to_string()));
        }
        let path = self.path_for(name);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(&path)(e)),
        }
        tracing::info!(playlist = name, "playlist deleted");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Playlist> {
        self.playlists
            .get(name)
            .ok_or_else(|| PlaylistError::NotFound(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Playlist> {
        self.playlists
            .get_mut(name)
            .ok_or_else(|| PlaylistError::NotFound(name.to_string()))
    }

    /// Name and track count of every playlist, sorted by name.
    pub fn summaries(&self) -> Vec<(String, usize)> {
        self.playlists
            .iter()
            .map(|(name, p)| (name.clone(), p.tracks.len()))
            .collect()
    }

    /// Append `track`. A track whose path is already present is rejected.
    pub fn add_track(&mut self, name: &str, track: Track) -> Result<()> {
        let playlist = self.get_mut(name)?;
        if playlist.tracks.iter().any(|t| t.path == track.path) {
            return Err(PlaylistError::DuplicateTrack {
                playlist: name.to_string(),
                path: track.path,
            });
        }
        playlist.tracks.push(track);
        self.save(name)
    }

    pub fn remove_track(&mut self, name: &str, index: usize) -> Result<Track> {
        let playlist = self.get_mut(name)?;
        let len = playlist.tracks.len();
        if index >= len {
            return Err(PlaylistError::IndexOutOfRange { index, len });
        }
        let removed = playlist.tracks.remove(index);
        self.save(name)?;
        Ok(removed)
    }

    /// Create `name` when it does not exist yet, then add `track` to it.
    pub fn add_track_creating(&mut self, name: &str, track: Track) -> Result<()> {
        if !self.playlists.contains_key(name) {
            self.create(name)?;
        }
        self.add_track(name, track)
    }

    pub fn export_m3u(&self, name: &str, out: &Path) -> Result<()> {
        let playlist = self.get(name)?;
        let file = File::create(out).map_err(io_err(out))?;
        write_m3u(playlist, BufWriter::new(file)).map_err(io_err(out))?;
        tracing::info!(playlist = name, out = %out.display(), "playlist exported");
        Ok(())
    }
}
