//! Record a take with live spectrum visualization.
//!
//! Runs the recording session state machine behind a TUI loop: Space
//! pauses/resumes, Enter saves the take to the store, 'd' exports it to MP3,
//! Escape/q discards it. SIGUSR1 acts as an external save trigger.

use crate::config::VrecConfig;
use crate::export;
use crate::recording::{CpalCapture, RecordCommand, RecordTui, RecordingSession};
use crate::store::TakeStore;
use crate::ui::ErrorScreen;
use std::path::Path;

/// How many recent samples feed the spectrum display (~128ms at 16kHz, one
/// FFT window's worth at higher rates).
const VISUALIZER_WINDOW: usize = 2048;

/// What to do with the take once the loop exits.
enum Outcome {
    Save,
    Export,
    Discard,
}

/// Handles the record command.
pub async fn handle_record() -> Result<(), anyhow::Error> {
    tracing::info!("=== vrec recorder started ===");

    let config = match VrecConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            let message = format!(
                "Configuration Error:\n\n{err}\n\nPlease check your ~/.config/vrec/vrec.toml file and try again."
            );
            let mut error_screen = ErrorScreen::new()?;
            error_screen.show_error(&message)?;
            error_screen.cleanup()?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, reference_level={}dBFS",
        config.audio.device,
        config.audio.sample_rate,
        config.audio.reference_level_db
    );

    let capture = CpalCapture::new(config.audio.sample_rate, config.audio.device.clone());
    let mut session = RecordingSession::new(Box::new(capture));

    if let Err(e) = session.start() {
        // Permission denied / device unavailable: stay idle, tell the user
        let message = format!(
            "Recording Error:\n\n{e}\n\nPlease check your microphone and audio configuration, then try again."
        );
        let mut error_screen = ErrorScreen::new()?;
        error_screen.show_error(&message)?;
        error_screen.cleanup()?;
        return Err(e);
    }

    let mut tui = RecordTui::new(session.sample_rate(), config.audio.reference_level_db)
        .map_err(|e| anyhow::anyhow!("Failed to initialize UI: {e}"))?;

    // External save trigger, same mechanism as a stop button
    let save_flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, save_flag.clone())
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    tracing::debug!("Entering recording loop");
    let mut frame_count = 0u64;

    let outcome = loop {
        if save_flag.load(std::sync::atomic::Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1: saving via external trigger");
            break Outcome::Save;
        }

        match tui.handle_input() {
            Ok(RecordCommand::Continue) => {
                frame_count += 1;
                if frame_count % 60 == 0 {
                    tracing::debug!(
                        "Recording: {:.1}s, {} chunks",
                        session.elapsed().as_secs_f32(),
                        session.chunk_count()
                    );
                }
            }
            Ok(RecordCommand::Save) => break Outcome::Save,
            Ok(RecordCommand::Export) => break Outcome::Export,
            Ok(RecordCommand::Cancel) => break Outcome::Discard,
            Ok(RecordCommand::TogglePause) => {
                session.toggle_pause();
            }
            Err(e) => {
                tracing::error!("Input handling error: {}", e);
                session.stop();
                tui.cleanup().ok();
                return Err(anyhow::anyhow!("Input handling error: {e}"));
            }
        }

        let samples = session.recent_samples(VISUALIZER_WINDOW);
        let paused = session.status() == crate::recording::SessionStatus::Paused;
        tui.render(&samples, session.elapsed(), paused)
            .map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;
    };

    session.stop();
    tui.cleanup()
        .map_err(|e| anyhow::anyhow!("Cleanup failed: {e}"))?;

    let samples = session.samples();
    match outcome {
        Outcome::Save => {
            if samples.is_empty() {
                tracing::warn!("Nothing captured, take not saved");
                println!("Nothing captured, take not saved.");
            } else {
                let mut store = TakeStore::open_default()?;
                let take = store.save(&samples, session.sample_rate())?;
                println!(
                    "Saved take '{}' ({:.1}s)",
                    take.display_name,
                    session.elapsed().as_secs_f32()
                );
            }
        }
        Outcome::Export => {
            let output = Path::new(export::DEFAULT_EXPORT_NAME);
            match export::export_samples(
                &samples,
                session.sample_rate(),
                &config.audio.export_format,
                output,
            ) {
                Ok(true) => println!("Exported {}", output.display()),
                Ok(false) => println!("Nothing captured, nothing to export."),
                Err(e) => {
                    // Non-fatal: the take's samples are untouched
                    tracing::error!("Export failed: {}", e);
                    eprintln!("Warning: export failed: {e}");
                }
            }
        }
        Outcome::Discard => {
            tracing::info!("Take discarded");
        }
    }

    tracing::info!("=== vrec recorder exited ===");
    Ok(())
}
