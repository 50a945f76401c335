use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, Focus, Pick, Section};
use crate::audio::{AudioPlayer, PlaybackState, PlayerError};
use crate::library::Track;
use crate::config;
use crate::playlist::PlaylistStore;
use crate::ui;

use super::keys::{Action, KeyState};

/// Whether the loop keeps running after an action.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Everything an action may touch.
pub struct Session<'a> {
    pub settings: &'a config::Settings,
    pub app: &'a mut App,
    pub player: &'a AudioPlayer,
    pub playlists: Option<&'a mut PlaylistStore>,
    /// Set when the catalog is a saved playlist.
    pub source_playlist: Option<String>,
}

fn tick_interval(settings: &config::Settings) -> Duration {
    Duration::from_micros(1_000_000 / settings.ui.tick_rate_hz.max(1))
}

/// Main terminal event loop: polls the engine, redraws, and applies key
/// actions. Returns `Ok(())` when the user quits and an error only for
/// failures that end the session (terminal I/O, no output device).
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    mut session: Session<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick = tick_interval(session.settings);
    let mut keys = KeyState::default();

    loop {
        session
            .app
            .sync(session.player.info(), session.player.order());

        let display = session.app.display_indices();
        terminal.draw(|f| ui::draw(f, session.app, &display, session.settings))?;

        if !event::poll(tick)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let Some(action) = keys.map(key, session.app.input_mode()) else {
            continue;
        };
        if apply(action, &mut session)? == Flow::Quit {
            tracing::info!("quit requested");
            return Ok(());
        }
    }
}

/// Record the outcome of an engine command on the status line. Only a
/// missing output device is fatal; everything else is for the user to retry
/// or skip.
fn report(app: &mut App, what: &str, result: Result<(), PlayerError>) -> Result<(), PlayerError> {
    match result {
        Ok(()) => {
            app.clear_status();
            Ok(())
        }
        Err(e @ PlayerError::DeviceInit(_)) => {
            tracing::error!(error = %e, "audio output unavailable");
            Err(e)
        }
        Err(e) => {
            tracing::warn!(error = %e, command = what, "command failed");
            if e.is_format_error() {
                app.set_status(format!("{what}: {e} (l skips it)"));
            } else {
                app.set_status(format!("{what}: {e}"));
            }
            Ok(())
        }
    }
}

/// Apply one key action.
pub fn apply(action: Action, s: &mut Session<'_>) -> Result<Flow, PlayerError> {
    let app = &mut *s.app;
    let player = s.player;
    let in_library = app.browser.focus == Focus::Library;

    match action {
        Action::Quit => {
            player.stop();
            return Ok(Flow::Quit);
        }
        Action::MoveDown if in_library => app.browser.move_down(),
        Action::MoveUp if in_library => app.browser.move_up(),
        Action::Top if in_library => app.browser.select_first(),
        Action::Bottom if in_library => app.browser.select_last(),
        Action::MoveDown => {
            app.follow_playback_off();
            app.next();
        }
        Action::MoveUp => {
            app.follow_playback_off();
            app.prev();
        }
        Action::Top => {
            app.follow_playback_off();
            app.select_first();
        }
        Action::Bottom => {
            app.follow_playback_off();
            app.select_last();
        }
        Action::PlaySelected if in_library => load_highlighted(s)?,
        Action::PlaySelected | Action::FilterAccept => {
            if action == Action::FilterAccept {
                if app.display_indices().is_empty() {
                    return Ok(Flow::Continue);
                }
                app.exit_filter_mode();
            }
            if app.has_tracks() && !app.is_playing_selected() {
                app.follow_playback_on();
                app.set_pending_follow_index(app.selected);
                let result = player.skip(app.selected);
                report(app, "play", result)?;
            }
        }
        Action::PlayPause => {
            if !app.filter_mode {
                app.follow_playback_on();
            }
            match player.playback_state() {
                PlaybackState::Stopped if app.has_tracks() => {
                    app.set_pending_follow_index(app.selected);
                    let result = player.skip(app.selected);
                    report(app, "play", result)?;
                }
                PlaybackState::Stopped => {}
                PlaybackState::Playing => player.pause(),
                PlaybackState::Paused => {
                    let result = player.resume();
                    report(app, "resume", result)?;
                }
            }
        }
        Action::Stop => player.stop(),
        Action::Next | Action::Previous => {
            if !app.filter_mode {
                app.follow_playback_on();
            }
            let (what, result) = if action == Action::Next {
                ("next", player.next())
            } else {
                ("previous", player.previous())
            };
            report(app, what, result)?;
        }
        Action::SeekForward => {
            let result = player.seek_forward();
            report(app, "seek", result)?;
        }
        Action::SeekBackward => {
            let result = player.seek_backward();
            report(app, "seek", result)?;
        }
        Action::SeekTenths(n) => {
            let result = player.seek_to_position(f64::from(n) / 10.0);
            report(app, "seek", result)?;
        }
        Action::VolumeUp | Action::VolumeDown => {
            let step = s.settings.controls.volume_step;
            let delta = if action == Action::VolumeUp { step } else { -step };
            player.set_volume(player.volume() + delta);
        }
        Action::ToggleShuffle => {
            let on = player.toggle_shuffle();
            app.set_status(if on { "Shuffle: On" } else { "Shuffle: Off" });
        }
        Action::ToggleRepeat => {
            let mode = player.toggle_repeat();
            app.set_status(mode.label());
        }
        Action::AddToPlaylist => {
            add_selected_to_playlist(app, s.playlists.as_deref_mut(), s.settings);
        }
        Action::RemoveFromPlaylist
            if in_library && app.browser.section == Section::Playlists =>
        {
            delete_highlighted_playlist(s);
        }
        Action::RemoveFromPlaylist => {
            remove_selected_from_playlist(
                app,
                player,
                s.playlists.as_deref_mut(),
                s.source_playlist.as_deref(),
            );
        }
        Action::NewPlaylist => {
            if s.playlists.is_some() {
                app.start_prompt();
            } else {
                app.set_status("playlists unavailable (see log)");
            }
        }
        Action::ToggleFocus => app.browser.toggle_focus(),
        Action::NextSection => {
            app.browser.focus = Focus::Library;
            app.browser.next_section();
        }
        Action::PrevSection => {
            app.browser.focus = Focus::Library;
            app.browser.prev_section();
        }
        Action::ShowLibrary => show_library(s),
        Action::PromptPush(c) => app.push_prompt_char(c),
        Action::PromptPop => app.pop_prompt_char(),
        Action::PromptCancel => {
            app.take_prompt();
        }
        Action::PromptAccept => {
            let name = app.take_prompt().unwrap_or_default();
            create_playlist(app, s.playlists.as_deref_mut(), name.trim());
        }
        Action::ToggleMetadata => app.toggle_metadata_window(),
        Action::EnterFilter => app.enter_filter_mode(),
        Action::FilterPush(c) => app.push_filter_char(c),
        Action::FilterPop => app.pop_filter_char(),
        Action::FilterCancel => app.clear_filter(),
    }

    Ok(Flow::Continue)
}

fn add_selected_to_playlist(
    app: &mut App,
    store: Option<&mut PlaylistStore>,
    settings: &config::Settings,
) {
    let Some(store) = store else {
        app.set_status("playlists unavailable (see log)");
        return;
    };
    let Some(track) = app.selected_track().cloned() else {
        return;
    };
    let name = &settings.playlists.default_playlist;
    let title = track.display.clone();
    match store.add_track_creating(name, track) {
        Ok(()) => {
            app.browser.set_playlists(store.summaries());
            app.set_status(format!("Added {title} to {name}"));
        }
        Err(e) => {
            tracing::warn!(error = %e, playlist = %name, "add to playlist failed");
            app.set_status(e.to_string());
        }
    }
}

/// Drop the highlighted row from the playlist being played and hand the
/// shortened catalog to the engine, which stops playback.
fn remove_selected_from_playlist(
    app: &mut App,
    player: &AudioPlayer,
    store: Option<&mut PlaylistStore>,
    playlist: Option<&str>,
) {
    let Some(name) = playlist else {
        app.set_status("not playing a playlist");
        return;
    };
    let Some(store) = store else {
        app.set_status("playlists unavailable (see log)");
        return;
    };
    if !app.has_tracks() {
        return;
    }

    match store.remove_track(name, app.selected) {
        Ok(removed) => {
            let tracks = store
                .get(name)
                .map(|p| p.tracks.clone())
                .unwrap_or_default();
            player.replace_catalog(tracks.clone());
            app.replace_tracks(tracks);
            app.browser.set_playlists(store.summaries());
            app.set_status(format!("Removed {} from {name}", removed.display));
        }
        Err(e) => {
            tracing::warn!(error = %e, playlist = %name, "remove from playlist failed");
            app.set_status(e.to_string());
        }
    }
}

/// Hand `tracks` to the engine and the view. Playback stops and the
/// cursor goes back to the top.
fn load_catalog(app: &mut App, player: &AudioPlayer, tracks: Vec<Track>, label: String) {
    player.replace_catalog(tracks.clone());
    app.clear_filter();
    app.replace_tracks(tracks);
    app.select_first();
    app.follow_playback_on();
    app.set_source_label(label);
}

/// Put the startup catalog back. A startup playlist is re-read so edits made
/// since then are kept.
fn show_library(s: &mut Session<'_>) {
    let app = &mut *s.app;
    let (tracks, label) = app.browser.library();
    let (mut tracks, label) = (tracks.to_vec(), label.to_string());
    let playlist = app.browser.library_playlist().map(str::to_string);
    if let (Some(name), Some(store)) = (&playlist, s.playlists.as_deref()) {
        if let Ok(p) = store.get(name) {
            tracks = p.tracks.clone();
        }
    }

    app.browser.clear_loaded();
    s.source_playlist = playlist;
    load_catalog(app, s.player, tracks, label);
}

/// Load the highlighted library row and start it from the top.
fn load_highlighted(s: &mut Session<'_>) -> Result<(), PlayerError> {
    let app = &mut *s.app;
    let Some(pick) = app.browser.pick() else {
        return Ok(());
    };

    let (tracks, label, playlist) = match pick {
        Pick::Playlist(name) => {
            let Some(store) = s.playlists.as_deref() else {
                app.set_status("playlists unavailable (see log)");
                return Ok(());
            };
            match store.get(&name) {
                Ok(p) => (p.tracks.clone(), format!("Playlist: {name}"), Some(name)),
                Err(e) => {
                    app.set_status(e.to_string());
                    return Ok(());
                }
            }
        }
        Pick::Group { label, tracks } => (tracks, label, None),
    };

    tracing::debug!(source = %label, tracks = tracks.len(), "loading library selection");
    app.browser.mark_loaded();
    app.browser.focus = Focus::Tracks;
    s.source_playlist = playlist;
    load_catalog(app, s.player, tracks, label);

    let result = s.player.play();
    report(app, "play", result)
}

fn create_playlist(app: &mut App, store: Option<&mut PlaylistStore>, name: &str) {
    let Some(store) = store else {
        app.set_status("playlists unavailable (see log)");
        return;
    };
    match store.create(name) {
        Ok(()) => {
            app.browser.set_playlists(store.summaries());
            app.set_status(format!("Created {name}"));
        }
        Err(e) => {
            tracing::warn!(error = %e, playlist = %name, "create playlist failed");
            app.set_status(e.to_string());
        }
    }
}

/// Delete the playlist highlighted in the library column. A catalog loaded
/// from it keeps playing but is no longer tied to it.
fn delete_highlighted_playlist(s: &mut Session<'_>) {
    let app = &mut *s.app;
    let Some(name) = app.browser.highlighted_playlist().map(str::to_string) else {
        return;
    };
    let Some(store) = s.playlists.as_deref_mut() else {
        app.set_status("playlists unavailable (see log)");
        return;
    };
    match store.delete(&name) {
        Ok(()) => {
            if s.source_playlist.as_deref() == Some(name.as_str()) {
                s.source_playlist = None;
                app.browser.clear_loaded();
            }
            app.browser.set_playlists(store.summaries());
            app.set_status(format!("Deleted {name}"));
        }
        Err(e) => {
            tracing::warn!(error = %e, playlist = %name, "delete playlist failed");
            app.set_status(e.to_string());
        }
    }
}
