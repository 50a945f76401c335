use std::env;
use std::path::Path;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::{AudioPlayer, PlayerError, PlayerSettings};
use crate::config::Settings;
use crate::library::{Track, scan};
use crate::playlist::PlaylistStore;

mod args;
mod event_loop;
mod keys;
mod logging;
mod settings;
mod startup;


use args::{Command, Source};

type BoxError = Box<dyn std::error::Error>;

pub fn run() -> Result<(), BoxError> {
    let command = match args::parse_args(env::args().skip(1)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("encore: {e}\n{}", args::USAGE);
            return Err(e.into());
        }
    };
    if command == Command::Help {
        println!("{}", args::USAGE);
        return Ok(());
    }

    let settings = settings::load_settings();
    let log_file = logging::init(&settings.logging);
    tracing::info!(log = ?log_file, "encore starting");

    match command {
        Command::Export { playlist, out } => {
            let store = open_playlists(&settings)?;
            store.export_m3u(&playlist, &out)?;
            println!("exported {playlist} to {}", out.display());
            Ok(())
        }
        Command::List => {
            let store = open_playlists(&settings)?;
            let summaries = store.summaries();
            if summaries.is_empty() {
                println!("no playlists in {}", store.dir().display());
            }
            for (name, count) in summaries {
                println!("{name}\t{count} tracks");
            }
            Ok(())
        }
        Command::Create(name) => {
            open_playlists(&settings)?.create(&name)?;
            println!("created {name}");
            Ok(())
        }
        Command::Delete(name) => {
            open_playlists(&settings)?.delete(&name)?;
            println!("deleted {name}");
            Ok(())
        }
        Command::Play(source) => play(source, &settings),
        Command::Help => Ok(()),
    }
}

fn open_playlists(settings: &Settings) -> Result<PlaylistStore, BoxError> {
    let dir = settings
        .playlists
        .resolved_directory()
        .ok_or("cannot determine the playlist directory (set playlists.directory)")?;
    Ok(PlaylistStore::open(dir)?)
}

/// Build the catalog for `source` and a label describing it.
fn load_catalog(
    source: &Source,
    settings: &Settings,
    playlists: Option<&PlaylistStore>,
) -> Result<(Vec<Track>, String), BoxError> {
    match source {
        Source::Directory(dir) => {
            let dir = if dir.as_os_str().is_empty() {
                Path::new(".")
            } else {
                dir.as_path()
            };
            let tracks = scan(dir, &settings.library);
            Ok((tracks, format!("Dir: {}", dir.display())))
        }
        Source::Playlist(name) => {
            let store = playlists.ok_or("playlists are unavailable")?;
            let tracks = store.get(name)?.tracks.clone();
            Ok((tracks, format!("Playlist: {name}")))
        }
    }
}

fn play(source: Source, settings: &Settings) -> Result<(), BoxError> {
    let mut playlists = match open_playlists(settings) {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!(error = %e, "playlist store unavailable");
            None
        }
    };

    let (tracks, label) = load_catalog(&source, settings, playlists.as_ref())?;
    let source_playlist = match &source {
        Source::Playlist(name) => Some(name.clone()),
        Source::Directory(_) => None,
    };
    let player = AudioPlayer::new(tracks.clone(), PlayerSettings::from(&settings.audio));
    startup::apply_playback_defaults(&player, settings);

    let mut app = App::new(tracks);
    app.follow_playback = settings.ui.follow_playback;
    app.browser.set_library_label(label.clone());
    app.browser.set_library_playlist(source_playlist.clone());
    app.set_source_label(label);
    if let Some(store) = &playlists {
        app.browser.set_playlists(store.summaries());
    }
    if settings.playback.autoplay && app.has_tracks() {
        match player.play() {
            Ok(()) => {}
            Err(e @ PlayerError::DeviceInit(_)) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "autoplay failed");
                app.set_status(format!("play: {e}"));
            }
        }
    }

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(
        &mut terminal,
        event_loop::Session {
            settings,
            app: &mut app,
            player: &player,
            playlists: playlists.as_mut(),
            source_playlist,
        },
    );

    // Restore the terminal even when the loop failed.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &run_result {
        tracing::error!(error = %e, "session ended with an error");
    }
    run_result
}
