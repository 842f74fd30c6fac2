//! Play one saved take to completion.

use crate::playback::PlaybackController;
use crate::store::TakeStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Plays a take through the system audio player and waits for it to finish.
/// Ctrl+C stops playback cleanly.
pub async fn handle_play(name: String) -> Result<(), anyhow::Error> {
    let mut store = TakeStore::open_default()?;

    let Some(take) = store.resolve(&name)? else {
        return Err(anyhow::anyhow!(
            "No take named '{name}'. Use 'vrec list' to see saved takes."
        ));
    };

    let mut playback = PlaybackController::system();
    playback.toggle_play(&take.id, &take.audio_ref);

    if playback.active_id().is_none() {
        return Err(anyhow::anyhow!("Playback of '{name}' failed to start"));
    }

    println!("Playing '{}' (Ctrl+C to stop)", take.display_name);

    let interrupted = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, interrupted.clone())
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    while playback.active_id().is_some() {
        if interrupted.load(Ordering::Relaxed) {
            playback.stop_active();
            println!("Stopped.");
            return Ok(());
        }
        playback.poll();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    tracing::info!("Playback of {} finished", take.id);
    Ok(())
}
