use std::sync::mpsc::Receiver;
use std::sync::{Mutex, Weak};
use std::thread;
use std::thread::JoinHandle;

use super::engine::Engine;
use super::player::AudioPlayer;

/// Spawn the thread that turns completion signals into repeat-mode reactions.
///
/// It runs off the device's mixing path, so reacting may block on file I/O.
/// The thread only holds a weak reference and exits once the engine and
/// every outstanding signal are gone.
pub(super) fn spawn_completion_watcher(
    rx: Receiver<u64>,
    engine: Weak<Mutex<Engine>>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(generation) = rx.recv() {
            let Some(engine) = engine.upgrade() else {
                break;
            };
            let player = AudioPlayer::from_shared(engine);
            if let Err(e) = player.on_stream_finished(generation) {
                tracing::warn!(error = %e, generation, "auto-advance failed");
            }
        }
        tracing::debug!("completion watcher exiting");
    })
}
