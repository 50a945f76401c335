//! Natural and shuffled orderings over the track catalog.
//!
//! The shuffled ordering is a permutation of natural indices and only exists
//! while shuffle is enabled. Track identity is the path; positions are found
//! through path maps that are rebuilt whenever an ordering changes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;

use crate::library::Track;

#[derive(Debug, Clone, Default)]
pub(crate) struct PlayOrder {
    tracks: Vec<Track>,
    natural_pos: HashMap<PathBuf, usize>,
    shuffled: Option<Vec<usize>>,
    shuffled_pos: HashMap<PathBuf, usize>,
}

fn first_positions<'a>(paths: impl Iterator<Item = &'a Path>) -> HashMap<PathBuf, usize> {
    let mut map = HashMap::new();
    for (pos, path) in paths.enumerate() {
        map.entry(path.to_path_buf()).or_insert(pos);
    }
    map
}

impl PlayOrder {
    pub(crate) fn new(tracks: Vec<Track>) -> Self {
        let natural_pos = first_positions(tracks.iter().map(|t| t.path.as_path()));
        Self {
            tracks,
            natural_pos,
            shuffled: None,
            shuffled_pos: HashMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.tracks.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// The catalog in its natural order.
    pub(crate) fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub(crate) fn is_shuffled(&self) -> bool {
        self.shuffled.is_some()
    }

    /// Natural index of the track at `pos` in the current ordering.
    pub(crate) fn natural_index(&self, pos: usize) -> Option<usize> {
        match &self.shuffled {
            Some(order) => order.get(pos).copied(),
            None => (pos < self.tracks.len()).then_some(pos),
        }
    }

    /// Track at `pos` in the current ordering.
    pub(crate) fn get(&self, pos: usize) -> Option<&Track> {
        self.natural_index(pos).and_then(|i| self.tracks.get(i))
    }

    /// Natural indices listed in current-ordering sequence.
    pub(crate) fn indices(&self) -> Vec<usize> {
        match &self.shuffled {
            Some(order) => order.clone(),
            None => (0..self.tracks.len()).collect(),
        }
    }

    /// Position of `path` in the current ordering.
    pub(crate) fn position_of(&self, path: &Path) -> Option<usize> {
        if self.shuffled.is_some() {
            self.shuffled_pos.get(path).copied()
        } else {
            self.natural_pos.get(path).copied()
        }
    }

    /// Build a fresh random permutation of the whole catalog and make it current.
    pub(crate) fn shuffle(&mut self) {
        let mut order: Vec<usize> = (0..self.tracks.len()).collect();
        order.shuffle(&mut rand::rng());
        self.shuffled_pos = first_positions(order.iter().map(|&i| self.tracks[i].path.as_path()));
        self.shuffled = Some(order);
    }

    /// Drop the shuffled ordering; the natural one becomes current.
    pub(crate) fn unshuffle(&mut self) {
        self.shuffled = None;
        self.shuffled_pos.clear();
    }
}
