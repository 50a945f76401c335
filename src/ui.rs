//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::{App, Focus, Section};
use crate::audio::{PlaybackInfo, PlaybackState};
use crate::config::{Settings, TimeField, UiSettings};
use crate::library::display_from_fields;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("j/k", "up/down"),
        ("gg/G", "top/bottom"),
        ("enter", "play selected"),
        ("space/p", "play/pause"),
        ("x", "stop"),
        ("h/l", "prev/next"),
        ("0-9", "seek to %"),
        ("/", "filter"),
        ("s", "shuffle"),
        ("r", "repeat"),
        ("a", "add to playlist"),
        ("d", "remove/delete playlist"),
        ("c", "new playlist"),
        ("tab", "library/tracks"),
        ("[/]", "library section"),
        ("bksp", "all tracks"),
        ("K", "metadata"),
        ("q", "quit"),
    ])
});

/// Render the controls help text. Seek and volume steps come from config.
fn controls_text(seek_seconds: u64, volume_step: f64) -> String {
    let order = [
        "j/k", "h/l", "H/L", "enter", "space/p", "x", "+/-", "0-9", "gg/G", "s", "r", "a", "d", "c",
        "tab", "[/]", "bksp", "K", "/", "q",
    ];
    order
        .iter()
        .filter_map(|k| match *k {
            "H/L" => Some(format!("[H/L] seek -/+{seek_seconds}s")),
            "+/-" => Some(format!("[+/-] volume ±{:.0}%", volume_step * 100.0)),
            _ => CONTROLS_MAP.get(k).map(|v| format!("[{k}] {v}")),
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(
    elapsed: Duration,
    total: Option<Duration>,
    ui: &UiSettings,
) -> Option<String> {
    if ui.now_playing_time_fields.is_empty() {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    for f in &ui.now_playing_time_fields {
        match f {
            TimeField::Elapsed => parts.push(format_mmss(elapsed)),
            TimeField::Total => {
                if let Some(t) = total {
                    parts.push(format_mmss(t));
                }
            }
            TimeField::Remaining => {
                if let Some(t) = total {
                    let rem = t.saturating_sub(elapsed);
                    parts.push(format!("-{}", format_mmss(rem)));
                }
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller than `r` and never outside it.
    width = width.min(r.width.saturating_sub(2)).max(10).min(r.width);
    height = height.min(r.height.saturating_sub(2)).max(5).min(r.height);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Format an optional duration, rounding up partial seconds, showing total seconds.
fn format_duration_mmss_ceil(d: Option<Duration>) -> String {
    let Some(d) = d else {
        return "-".to_string();
    };

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }

    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{}:{:02} ({}s)", minutes, seconds, total_secs)
}

fn left_pad() -> Padding {
    Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    }
}

/// Status line: cursor mode, modes, filter, now playing and the last message.
fn status_text(app: &App, ui: &UiSettings) -> String {
    let info = &app.info;
    let mut parts: Vec<String> = Vec::new();

    if app.follow_playback {
        parts.push(" CURSOR: Follow".to_string());
    } else {
        parts.push(" CURSOR: Free-roam".to_string());
    }
    parts.push(info.repeat.label().to_string());
    parts.push(if info.shuffle { "Shuffle: On" } else { "Shuffle: Off" }.to_string());
    parts.push(format!("Vol: {:.0}%", info.volume * 100.0));

    if let Some(name) = &app.prompt {
        parts.push(format!("NEW PLAYLIST: {name}_"));
    }
    let q = app.filter_query.trim();
    if app.filter_mode || !q.is_empty() {
        parts.push(format!("FILTER: {q}").trim_end().to_string());
    }

    match (&info.track, info.state) {
        (Some(track), PlaybackState::Playing | PlaybackState::Paused) => {
            let song = display_from_fields(
                track,
                &ui.now_playing_track_fields,
                &ui.now_playing_track_separator,
            );
            let total = (!info.total.is_zero()).then_some(info.total).or(track.duration);
            match now_playing_time_text(info.elapsed, total, ui) {
                Some(time) => parts.push(format!("Song: {song} [{time}]")),
                None => parts.push(format!("Song: {song}")),
            }
            let state = if info.state == PlaybackState::Playing {
                "Playing"
            } else {
                "Paused"
            };
            parts.push(state.to_string());
        }
        _ => parts.push("Stopped".to_string()),
    }

    if let Some(src) = &app.source_label {
        parts.push(src.clone());
    }
    if let Some(msg) = &app.status_message {
        parts.push(format!("» {msg}"));
    }

    parts.join(" • ")
}

/// Progress ratio clamped for the gauge; the engine may report past 1.0.
fn gauge_ratio(info: &PlaybackInfo) -> f64 {
    if info.progress.is_finite() {
        info.progress.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Section tabs, the active one upper-cased in brackets.
fn library_tabs(active: Section) -> String {
    Section::ALL
        .iter()
        .map(|&s| {
            if s == active {
                format!("[{}]", s.label().to_uppercase())
            } else {
                s.label().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn draw_library(frame: &mut Frame, app: &App, area: Rect) {
    let browser = &app.browser;
    let section = browser.section;
    let focused = browser.focus == Focus::Library;
    let loaded = browser.loaded_row(section);

    let rows = browser.rows(section);
    let items: Vec<ListItem> = if rows.is_empty() {
        let empty = match section {
            Section::Playlists => "No playlists yet (c creates one)",
            Section::Albums => "No albums",
            Section::Artists => "No artists",
        };
        vec![ListItem::new(empty)]
    } else {
        rows.into_iter()
            .enumerate()
            .map(|(i, row)| {
                let marker = if loaded == Some(i) { "* " } else { "  " };
                ListItem::new(format!("{marker}{row}"))
            })
            .collect()
    };

    let title = format!(" {} ", library_tabs(section));
    let block = Block::default().borders(Borders::ALL).title(title);
    let block = if focused {
        block.border_style(Style::default().add_modifier(Modifier::BOLD))
    } else {
        block
    };
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ratatui::widgets::ListState::default();
    if focused && browser.len(section) > 0 {
        state.select(Some(browser.cursor(section)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

/// Render the entire UI into `frame`.
pub fn draw(frame: &mut Frame, app: &App, display: &[usize], settings: &Settings) {
    let ui_settings = &settings.ui;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" encore ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status_par = Paragraph::new(status_text(app, ui_settings))
        .block(Block::bordered().padding(left_pad()).title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    let ratio = gauge_ratio(&app.info);
    let label = format!(
        "{} / {}",
        format_mmss(app.info.elapsed),
        format_mmss(app.info.total)
    );
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" progress "))
        .gauge_style(Style::default().add_modifier(Modifier::BOLD))
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, chunks[2]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[3]);
    draw_library(frame, app, columns[0]);

    // Main list
    {
        let list_area = columns[1];
        let q = app.filter_query.trim();
        let query_lower = if q.is_empty() {
            None
        } else if app.uses_lower_titles() {
            Some(q.to_ascii_lowercase())
        } else {
            None
        };
        let playing = match app.info.state {
            PlaybackState::Stopped => None,
            _ => app.info.catalog_index,
        };

        // Only build ListItems for the visible window, centered on the selection.
        let total = display.len();
        let list_height = list_area.height.saturating_sub(2) as usize;
        let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let visible_items: Vec<ListItem> = display[start..end]
            .iter()
            .map(|&i| {
                let title = &app.tracks[i].display;
                let marker = if playing == Some(i) { "♪ " } else { "  " };
                let positions = if q.is_empty() {
                    None
                } else {
                    match query_lower.as_deref() {
                        Some(ql) => app.fuzzy_match_positions_for_track_lower(i, ql),
                        None => App::fuzzy_match_positions(title, q),
                    }
                };

                let Some(positions) = positions else {
                    return ListItem::new(format!("{marker}{title}"));
                };
                let mut rendered = String::from(marker);
                let mut pos_iter = positions.into_iter();
                let mut next_pos = pos_iter.next();
                for (ci, ch) in title.chars().enumerate() {
                    if next_pos == Some(ci) {
                        rendered.extend(ch.to_uppercase());
                        next_pos = pos_iter.next();
                    } else {
                        rendered.push(ch);
                    }
                }
                ListItem::new(rendered)
            })
            .collect();

        let block = Block::default().borders(Borders::ALL).title(" tracks ");
        let block = if app.browser.focus == Focus::Tracks {
            block.border_style(Style::default().add_modifier(Modifier::BOLD))
        } else {
            block
        };
        let list = List::new(visible_items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, list_area, &mut state);

        // Overlay metadata popup (keeps list visible under it)
        if app.metadata_window {
            let popup_area = centered_rect_sized(72, 10, list_area);
            frame.render_widget(Clear, popup_area);

            let meta = match app.selected_track() {
                Some(track) => format!(
                    "Title: {}\nArtist: {}\nAlbum: {}\nYear: {}\nDuration: {}\nPath: {}",
                    track.title,
                    track.artist.as_deref().unwrap_or("-"),
                    track.album.as_deref().unwrap_or("-"),
                    track.year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string()),
                    format_duration_mmss_ceil(track.duration),
                    track.path.display()
                ),
                None => "No track selected".to_string(),
            };
            let meta_paragraph = Paragraph::new(meta)
                .block(
                    Block::default()
                        .padding(left_pad())
                        .borders(Borders::ALL)
                        .title(" metadata (K closes) "),
                )
                .wrap(Wrap { trim: true });
            frame.render_widget(meta_paragraph, popup_area);
        }
    }

    let footer_text = controls_text(settings.audio.seek_seconds, settings.controls.volume_step);
    let footer = Paragraph::new(footer_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(left_pad()),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[4]);
}
