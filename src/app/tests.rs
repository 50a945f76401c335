use super::*;
use crate::audio::{PlaybackInfo, PlaybackState};
use crate::library::Track;

fn t(title: &str) -> Track {
    Track {
        title: title.into(),
        display: title.into(),
        ..Track::new(std::path::PathBuf::from(format!("/m/{title}.mp3")))
    }
}

fn playing(catalog_index: usize) -> PlaybackInfo {
    PlaybackInfo {
        state: PlaybackState::Playing,
        catalog_index: Some(catalog_index),
        ..PlaybackInfo::default()
    }
}

#[test]
fn fuzzy_match_simple() {
    let title = "Hello World";
    assert!(App::fuzzy_match_positions(title, "hw").is_some());
    assert!(App::fuzzy_match_positions(title, "ello").is_some());
    assert!(App::fuzzy_match_positions(title, "xyz").is_none());
    assert_eq!(App::fuzzy_match_positions(title, "HW"), Some(vec![0, 6]));
}

#[test]
fn display_indices_respects_filter_query() {
    let mut app = App::new(vec![t("Alpha"), t("Beta"), t("Gamma")]);
    app.push_filter_char('p');
    assert_eq!(app.display_indices(), vec![0]);
}

#[test]
fn display_indices_follows_engine_order_when_shuffled() {
    let mut app = App::new(vec![t("Alpha"), t("Beta"), t("Gamma"), t("Delta")]);
    let order = vec![2usize, 0, 3, 1];
    let info = PlaybackInfo {
        shuffle: true,
        ..PlaybackInfo::default()
    };
    app.follow_playback_off();
    app.sync(info, order.clone());
    assert_eq!(app.display_indices(), order);

    // 'et' matches Delta(3) and Beta(1), kept in shuffled order.
    app.filter_query = "et".into();
    assert_eq!(app.display_indices(), vec![3usize, 1usize]);
}

#[test]
fn natural_order_is_used_when_not_shuffled() {
    let mut app = App::new(vec![t("A"), t("B"), t("C")]);
    app.sync(PlaybackInfo::default(), vec![2, 1, 0]);
    assert_eq!(app.display_indices(), vec![0, 1, 2]);
}

#[test]
fn order_with_wrong_length_is_ignored() {
    let mut app = App::new(vec![t("A"), t("B")]);
    app.sync(PlaybackInfo::default(), vec![0]);
    assert_eq!(app.order, vec![0, 1]);
}

#[test]
fn display_indices_uses_fuzzy_not_substring_only() {
    let mut app = App::new(vec![t("Metallica - Blackened"), t("Black Sabbath - Paranoid")]);
    app.filter_query = "mtbk".into();
    assert_eq!(app.display_indices(), vec![0]);
}

#[test]
fn trimming_filter_query_affects_matching() {
    let mut app = App::new(vec![t("Black Sabbath - Paranoid")]);
    app.filter_query = "Black ".into();
    assert_eq!(app.display_indices(), vec![0]);

    app.filter_query = "   ".into();
    assert_eq!(app.display_indices(), vec![0]);
}

#[test]
fn large_libraries_filter_through_lowercase_cache() {
    let tracks: Vec<Track> = (0..150).map(|i| t(&format!("Song {i:03}"))).collect();
    let mut app = App::new(tracks);
    assert!(app.uses_lower_titles());
    app.filter_query = "SONG 14".into();
    let visible = app.display_indices();
    assert!(visible.contains(&140) && visible.contains(&149));
    assert!(!visible.contains(&0));
    assert!(app.fuzzy_match_positions_for_track_lower(140, "song 14").is_some());
}

#[test]
fn next_prev_in_view_helpers_work() {
    let mut app = App::new(vec![t("Alpha"), t("Beta"), t("Gamma")]);
    app.filter_query = "et".into(); // only Beta is visible

    assert_eq!(app.next_in_view_from(0), Some(1));
    assert_eq!(app.prev_in_view_from(0), Some(1));
    assert_eq!(app.next_in_view_from(1), Some(1));
    assert_eq!(app.prev_in_view_from(1), Some(1));
}

#[test]
fn selection_moves_and_wraps() {
    let mut app = App::new(vec![t("A"), t("B"), t("C")]);
    app.prev();
    assert_eq!(app.selected, 2);
    app.next();
    assert_eq!(app.selected, 0);
    app.select_last();
    assert_eq!(app.selected, 2);
    app.select_first();
    assert_eq!(app.selected, 0);
}

#[test]
fn empty_app_has_no_view() {
    let mut app = App::new(Vec::new());
    assert!(!app.has_tracks());
    assert_eq!(app.next_in_view_from(0), None);
    assert_eq!(app.prev_in_view_from(0), None);
    app.next();
    assert_eq!(app.selected, 0);
    assert!(app.selected_track().is_none());
}

#[test]
fn sync_follows_the_cued_track() {
    let mut app = App::new(vec![t("A"), t("B"), t("C")]);
    app.sync(playing(2), vec![0, 1, 2]);
    assert_eq!(app.selected, 2);
    assert!(app.is_playing_selected());

    app.follow_playback_off();
    app.sync(playing(0), vec![0, 1, 2]);
    assert_eq!(app.selected, 2);
    assert!(!app.is_playing_selected());
}

#[test]
fn pending_follow_waits_for_the_requested_track() {
    let mut app = App::new(vec![t("A"), t("B"), t("C")]);
    app.set_selected(2);
    app.set_pending_follow_index(2);

    // A stale snapshot still reporting the old track must not move the cursor.
    app.sync(playing(0), vec![0, 1, 2]);
    assert_eq!(app.selected, 2);
    assert_eq!(app.pending_follow_index, Some(2));

    app.sync(playing(2), vec![0, 1, 2]);
    assert_eq!(app.pending_follow_index, None);
    assert_eq!(app.selected, 2);
}

#[test]
fn filter_mode_suspends_following() {
    let mut app = App::new(vec![t("Alpha"), t("Beta")]);
    app.enter_filter_mode();
    assert!(!app.follow_playback);
    app.follow_playback_on();
    app.sync(playing(1), vec![0, 1]);
    assert_eq!(app.selected, 0);

    app.exit_filter_mode();
    app.sync(playing(1), vec![0, 1]);
    assert_eq!(app.selected, 1);
}

#[test]
fn clear_filter_restores_full_view() {
    let mut app = App::new(vec![t("Alpha"), t("Beta")]);
    app.enter_filter_mode();
    app.push_filter_char('b');
    assert_eq!(app.selected, 1);
    app.pop_filter_char();
    app.push_filter_char('z');
    assert!(app.display_indices().is_empty());
    assert_eq!(app.selected, 0);

    app.clear_filter();
    assert!(!app.filter_mode);
    assert_eq!(app.display_indices(), vec![0, 1]);
}

#[test]
fn status_message_round_trip() {
    let mut app = App::new(vec![t("A")]);
    app.set_status("unsupported audio format: .ogg");
    assert_eq!(app.status_message.as_deref(), Some("unsupported audio format: .ogg"));
    app.clear_status();
    assert!(app.status_message.is_none());
}

#[test]
fn replace_tracks_keeps_cursor_in_bounds() {
    let mut app = App::new(vec![t("A"), t("B"), t("C")]);
    app.select_last();
    app.set_pending_follow_index(2);

    app.replace_tracks(vec![t("A"), t("B")]);
    assert_eq!(app.selected, 1);
    assert_eq!(app.order, vec![0, 1]);
    assert_eq!(app.pending_follow_index, None);

    app.replace_tracks(Vec::new());
    assert_eq!(app.selected, 0);
    assert!(app.selected_track().is_none());
}

fn tagged(path: &str, album: Option<&str>, artist: Option<&str>) -> Track {
    Track {
        album: album.map(str::to_string),
        artist: artist.map(str::to_string),
        ..Track::new(std::path::PathBuf::from(path))
    }
}

#[test]
fn album_groups_fall_back_to_the_directory_name() {
    let tracks = vec![
        tagged("/m/Kind of Blue/1.mp3", None, Some("Miles")),
        tagged("/m/b/2.mp3", Some("Blue"), Some("Joni")),
        tagged("/m/Kind of Blue/3.mp3", None, Some("Miles")),
        tagged("/m/b/4.mp3", Some("blue"), Some("JONI")),
        tagged("/5.mp3", Some("  "), None),
    ];
    let albums = album_groups(&tracks);
    let titles: Vec<&str> = albums.iter().map(|g| g.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Blue - Joni", "Kind of Blue - Miles", "Unknown Album - Unknown Artist"]
    );
    assert_eq!(albums[0].tracks.len(), 2);
    assert_eq!(albums[1].tracks[1].path, tracks[2].path);
}

#[test]
fn artist_groups_merge_case_variants() {
    let tracks = vec![
        tagged("/m/1.mp3", None, Some("Björk")),
        tagged("/m/2.mp3", None, None),
        tagged("/m/3.mp3", None, Some("björk")),
    ];
    let artists = artist_groups(&tracks);
    assert_eq!(artists.len(), 2);
    assert_eq!(artists[0].title, "Björk");
    assert_eq!(artists[0].tracks.len(), 2);
    assert_eq!(artists[1].title, "Unknown Artist");
}

#[test]
fn browser_cursor_wraps_per_section() {
    let mut browser = Browser::new(vec![
        tagged("/m/a/1.mp3", Some("A"), None),
        tagged("/m/b/2.mp3", Some("B"), None),
    ]);
    browser.set_playlists([("gym".to_string(), 3)]);
    assert_eq!(browser.rows(Section::Playlists), vec!["gym (3 tracks)".to_string()]);
    assert_eq!(browser.pick(), Some(Pick::Playlist("gym".to_string())));

    browser.next_section();
    assert_eq!(browser.section, Section::Albums);
    browser.move_up();
    assert_eq!(browser.cursor(Section::Albums), 1);
    browser.move_down();
    assert_eq!(browser.cursor(Section::Albums), 0);
    assert_eq!(browser.cursor(Section::Playlists), 0);

    browser.select_last();
    browser.mark_loaded();
    assert_eq!(browser.loaded_row(Section::Albums), Some(1));
    assert_eq!(browser.loaded_row(Section::Artists), None);
    match browser.pick() {
        Some(Pick::Group { label, tracks }) => {
            assert_eq!(label, "Album: B - Unknown Artist");
            assert_eq!(tracks.len(), 1);
        }
        other => panic!("unexpected pick {other:?}"),
    }

    browser.prev_section();
    browser.prev_section();
    assert_eq!(browser.section, Section::Artists);
}

#[test]
fn shrinking_playlist_list_clamps_its_cursor() {
    let mut browser = Browser::new(Vec::new());
    browser.set_playlists([("a".to_string(), 0), ("b".to_string(), 0)]);
    browser.select_last();
    assert_eq!(browser.highlighted_playlist(), Some("b"));

    browser.set_playlists([("a".to_string(), 0)]);
    assert_eq!(browser.highlighted_playlist(), Some("a"));
    browser.set_playlists(Vec::new());
    assert_eq!(browser.highlighted_playlist(), None);
    assert_eq!(browser.pick(), None);
}

#[test]
fn prompt_takes_precedence_over_filter() {
    let mut app = App::new(vec![t("A")]);
    assert_eq!(app.input_mode(), InputMode::Normal);
    app.enter_filter_mode();
    assert_eq!(app.input_mode(), InputMode::Filter);

    app.start_prompt();
    app.push_prompt_char('x');
    app.push_prompt_char('y');
    app.pop_prompt_char();
    assert_eq!(app.input_mode(), InputMode::Prompt);
    assert_eq!(app.take_prompt().as_deref(), Some("x"));
    assert_eq!(app.input_mode(), InputMode::Filter);
}
