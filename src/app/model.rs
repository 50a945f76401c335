//! Application model: `App`.
//!
//! The engine owns playback. `App` only mirrors what the engine reported on
//! the last tick and tracks what the user is looking at.

use crate::audio::PlaybackInfo;
use crate::library::Track;

use super::browse::Browser;

/// What typed characters go to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Filter,
    /// Naming a new playlist.
    Prompt,
}

// Precompute lowercase titles for larger libraries so fuzzy filtering does
// not lowercase every title on each keystroke.
fn lower_titles_for(tracks: &[Track]) -> Option<Vec<String>> {
    (tracks.len() > 100).then(|| {
        tracks
            .iter()
            .map(|t| t.display.to_ascii_lowercase())
            .collect()
    })
}

/// The main application model.
pub struct App {
    /// Catalog in natural order, as handed to the engine.
    pub tracks: Vec<Track>,
    /// Natural catalog index of the highlighted row.
    pub selected: usize,
    /// Snapshot polled from the engine on the last tick.
    pub info: PlaybackInfo,
    /// Natural indices in the engine's current play order.
    pub order: Vec<usize>,

    lower_titles: Option<Vec<String>>,

    pub follow_playback: bool,
    pub pending_follow_index: Option<usize>,

    pub filter_mode: bool,
    pub filter_query: String,
    /// Where the catalog came from (a directory or a playlist name).
    pub source_label: Option<String>,
    pub metadata_window: bool,
    /// Last command result worth showing, e.g. an error.
    pub status_message: Option<String>,
    pub browser: Browser,
    /// Text typed so far while naming a new playlist.
    pub prompt: Option<String>,
}

impl App {
    /// Create a new `App` with the provided list of `tracks`.
    pub fn new(tracks: Vec<Track>) -> Self {
        let lower_titles = lower_titles_for(&tracks);
        let order = (0..tracks.len()).collect();
        let browser = Browser::new(tracks.clone());

        Self {
            tracks,
            selected: 0,
            info: PlaybackInfo::default(),
            order,

            lower_titles,

            follow_playback: true,
            pending_follow_index: None,

            filter_mode: false,
            filter_query: String::new(),
            source_label: None,
            metadata_window: false,
            status_message: None,
            browser,
            prompt: None,
        }
    }

    /// Swap in a new catalog, keeping the cursor on the same row when it
    /// still exists.
    pub fn replace_tracks(&mut self, tracks: Vec<Track>) {
        self.lower_titles = lower_titles_for(&tracks);
        self.order = (0..tracks.len()).collect();
        self.tracks = tracks;
        self.pending_follow_index = None;
        self.selected = self.selected.min(self.tracks.len().saturating_sub(1));
        self.ensure_selected_visible();
    }

    pub fn input_mode(&self) -> InputMode {
        if self.prompt.is_some() {
            InputMode::Prompt
        } else if self.filter_mode {
            InputMode::Filter
        } else {
            InputMode::Normal
        }
    }

    pub fn start_prompt(&mut self) {
        self.prompt = Some(String::new());
    }

    pub fn push_prompt_char(&mut self, c: char) {
        if let Some(text) = &mut self.prompt {
            text.push(c);
        }
    }

    pub fn pop_prompt_char(&mut self) {
        if let Some(text) = &mut self.prompt {
            text.pop();
        }
    }

    /// Leave prompt mode, returning what was typed.
    pub fn take_prompt(&mut self) -> Option<String> {
        self.prompt.take()
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    pub fn set_source_label(&mut self, label: String) {
        self.source_label = Some(label);
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    /// Enable following playback (cursor follows currently playing track).
    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }
    /// Disable follow-playback and clear any pending follow index.
    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
        self.pending_follow_index = None;
    }
    /// Set an index to follow once the engine reports it.
    pub fn set_pending_follow_index(&mut self, idx: usize) {
        self.pending_follow_index = Some(idx);
    }

    /// Take in the engine's latest snapshot and, in follow mode, move the
    /// cursor onto the cued track.
    ///
    /// While a pending follow index is set the cursor stays put until the
    /// engine reports that very track, so a stale tick cannot yank it back.
    pub fn sync(&mut self, info: PlaybackInfo, order: Vec<usize>) {
        self.info = info;
        if order.len() == self.tracks.len() {
            self.order = order;
        }

        let Some(idx) = self.info.catalog_index else {
            return;
        };
        if !self.follow_playback || self.filter_mode {
            return;
        }
        let pending = self.pending_follow_index;
        match pending {
            Some(pending) if pending == idx => {
                self.pending_follow_index = None;
                self.set_selected(idx);
            }
            Some(_) => {}
            None if self.selected != idx => self.set_selected(idx),
            None => {}
        }
    }

    /// True when the highlighted row is the track currently playing.
    pub fn is_playing_selected(&self) -> bool {
        self.info.is_playing() && self.info.catalog_index == Some(self.selected)
    }

    /// Return the display order of track indices: the engine's play order
    /// when shuffled, then narrowed by the active filter.
    pub fn display_indices(&self) -> Vec<usize> {
        let base: Vec<usize> = if self.info.shuffle {
            self.order.clone()
        } else {
            (0..self.tracks.len()).collect()
        };

        let query = self.filter_query.trim();
        if query.is_empty() {
            return base;
        }
        match self.lower_titles.as_deref() {
            Some(lower_titles) => {
                let query_lower = query.to_ascii_lowercase();
                base.into_iter()
                    .filter(|&i| {
                        Self::fuzzy_match_positions_lower(&lower_titles[i], &query_lower).is_some()
                    })
                    .collect()
            }
            None => base
                .into_iter()
                .filter(|&i| Self::fuzzy_match_positions(&self.tracks[i].display, query).is_some())
                .collect(),
        }
    }

    /// Return true if this `App` uses precomputed lowercase titles.
    pub fn uses_lower_titles(&self) -> bool {
        self.lower_titles.is_some()
    }

    /// Fuzzy-match `query_lower` against a specific track by index.
    ///
    /// Returns the character positions that match, or `None` when there is no match.
    pub fn fuzzy_match_positions_for_track_lower(
        &self,
        track_index: usize,
        query_lower: &str,
    ) -> Option<Vec<usize>> {
        if query_lower.is_empty() {
            return Some(Vec::new());
        }

        match self.lower_titles.as_deref() {
            Some(lower_titles) => {
                Self::fuzzy_match_positions_lower(&lower_titles[track_index], query_lower)
            }
            None => Self::fuzzy_match_positions(&self.tracks[track_index].display, query_lower),
        }
    }

    /// Next visible index after `current`, wrapping to the first.
    pub fn next_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        match display.iter().position(|&i| i == current) {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// Previous visible index before `current`, wrapping to the last.
    pub fn prev_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        let last = *display.last()?;

        match display.iter().position(|&i| i == current) {
            Some(0) | None => Some(last),
            Some(p) => Some(display[p - 1]),
        }
    }

    /// Set the selected track index and ensure it is visible in the display.
    pub fn set_selected(&mut self, idx: usize) {
        self.selected = idx;
        self.ensure_selected_visible();
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.selected)
    }

    /// Fuzzy/subsequence match: return the character positions in `title`
    /// that match `query`, or `None` if not matched.
    pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        if query.is_empty() {
            return Some(Vec::new());
        }

        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title.chars().enumerate();

        for qc in query.chars() {
            let qc_low = qc.to_ascii_lowercase();
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc.to_ascii_lowercase() == qc_low => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    fn fuzzy_match_positions_lower(title_lower: &str, query_lower: &str) -> Option<Vec<usize>> {
        if query_lower.is_empty() {
            return Some(Vec::new());
        }

        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title_lower.chars().enumerate();

        for qc in query_lower.chars() {
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc == qc => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    /// Enter filter mode: enable filtering and stop following playback.
    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
        self.follow_playback_off();
        self.ensure_selected_visible();
    }

    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }

    /// Clear the active filter and restore selection visibility.
    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    /// Ensure that `selected` is part of the current filtered/shuffled view,
    /// otherwise move selection to the first visible track.
    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        match display.first() {
            None => self.selected = 0,
            Some(&first) if !display.contains(&self.selected) => self.selected = first,
            Some(_) => {}
        }
    }

    /// Move selection to the next visible track.
    pub fn next(&mut self) {
        if let Some(next) = self.next_in_view_from(self.selected) {
            self.selected = next;
        }
    }

    /// Move selection to the previous visible track.
    pub fn prev(&mut self) {
        if let Some(prev) = self.prev_in_view_from(self.selected) {
            self.selected = prev;
        }
    }

    /// Jump to the first visible track.
    pub fn select_first(&mut self) {
        if let Some(&first) = self.display_indices().first() {
            self.selected = first;
        }
    }

    /// Jump to the last visible track.
    pub fn select_last(&mut self) {
        if let Some(&last) = self.display_indices().last() {
            self.selected = last;
        }
    }
}
