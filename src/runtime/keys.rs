//! Key bindings, kept apart from the loop so they can be tested without a
//! terminal.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::InputMode;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    MoveDown,
    MoveUp,
    Top,
    Bottom,
    PlaySelected,
    PlayPause,
    Stop,
    Next,
    Previous,
    SeekForward,
    SeekBackward,
    /// Jump to this many tenths of the track.
    SeekTenths(u8),
    VolumeUp,
    VolumeDown,
    ToggleShuffle,
    ToggleRepeat,
    AddToPlaylist,
    /// Remove the highlighted track, or delete the highlighted playlist when
    /// the library column has focus.
    RemoveFromPlaylist,
    NewPlaylist,
    ToggleFocus,
    NextSection,
    PrevSection,
    /// Put the startup catalog back.
    ShowLibrary,
    ToggleMetadata,
    EnterFilter,
    FilterPush(char),
    FilterPop,
    FilterCancel,
    FilterAccept,
    PromptPush(char),
    PromptPop,
    PromptCancel,
    PromptAccept,
}

/// Multi-key prefix state (`gg`).
#[derive(Debug, Default)]
pub struct KeyState {
    pending_g: bool,
}

impl KeyState {
    pub fn map(&mut self, key: KeyEvent, mode: InputMode) -> Option<Action> {
        match mode {
            InputMode::Normal => {}
            InputMode::Filter => {
                self.pending_g = false;
                return map_filter_key(key);
            }
            InputMode::Prompt => {
                self.pending_g = false;
                return map_prompt_key(key);
            }
        }

        if key.code == KeyCode::Char('g') {
            let completed = std::mem::take(&mut self.pending_g);
            if completed {
                return Some(Action::Top);
            }
            self.pending_g = true;
            return None;
        }
        self.pending_g = false;

        let action = match key.code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('j') | KeyCode::Down => Action::MoveDown,
            KeyCode::Char('k') | KeyCode::Up => Action::MoveUp,
            KeyCode::Char('G') => Action::Bottom,
            KeyCode::Enter => Action::PlaySelected,
            KeyCode::Char(' ') | KeyCode::Char('p') => Action::PlayPause,
            KeyCode::Char('x') => Action::Stop,
            KeyCode::Char('l') => Action::Next,
            KeyCode::Char('h') => Action::Previous,
            KeyCode::Char('L') | KeyCode::Right => Action::SeekForward,
            KeyCode::Char('H') | KeyCode::Left => Action::SeekBackward,
            KeyCode::Char(c @ '0'..='9') => Action::SeekTenths(c as u8 - b'0'),
            KeyCode::Char('+') | KeyCode::Char('=') => Action::VolumeUp,
            KeyCode::Char('-') => Action::VolumeDown,
            KeyCode::Char('s') => Action::ToggleShuffle,
            KeyCode::Char('r') => Action::ToggleRepeat,
            KeyCode::Char('a') => Action::AddToPlaylist,
            KeyCode::Char('d') => Action::RemoveFromPlaylist,
            KeyCode::Char('c') => Action::NewPlaylist,
            KeyCode::Tab => Action::ToggleFocus,
            KeyCode::Char(']') => Action::NextSection,
            KeyCode::Char('[') => Action::PrevSection,
            KeyCode::Backspace => Action::ShowLibrary,
            KeyCode::Char('K') => Action::ToggleMetadata,
            KeyCode::Char('/') => Action::EnterFilter,
            _ => return None,
        };
        Some(action)
    }
}

fn map_filter_key(key: KeyEvent) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => Some(Action::FilterCancel),
        KeyCode::Backspace => Some(Action::FilterPop),
        KeyCode::Enter => Some(Action::FilterAccept),
        KeyCode::Down => Some(Action::MoveDown),
        KeyCode::Up => Some(Action::MoveUp),
        KeyCode::Char('j' | 'n') if ctrl => Some(Action::MoveDown),
        KeyCode::Char('k' | 'p') if ctrl => Some(Action::MoveUp),
        KeyCode::Char(c) if !c.is_control() && !ctrl => Some(Action::FilterPush(c)),
        _ => None,
    }
}

fn map_prompt_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::PromptCancel),
        KeyCode::Backspace => Some(Action::PromptPop),
        KeyCode::Enter => Some(Action::PromptAccept),
        KeyCode::Char(c) if !c.is_control() && !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::PromptPush(c))
        }
        _ => None,
    }
}
