use crate::audio::{AudioPlayer, RepeatMode};
use crate::config;

/// Apply the configured startup modes to a fresh engine.
pub fn apply_playback_defaults(player: &AudioPlayer, settings: &config::Settings) {
    player.set_volume(settings.audio.initial_volume);
    player.set_repeat_mode(RepeatMode::from(settings.playback.repeat));
    if settings.playback.shuffle && !player.shuffle() {
        player.toggle_shuffle();
    }
    tracing::debug!(
        volume = player.volume(),
        repeat = ?player.repeat_mode(),
        shuffle = player.shuffle(),
        "playback defaults applied"
    );
}
