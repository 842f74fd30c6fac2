//! Playback with single-active-take mutual exclusion.
//!
//! The controller guarantees at most one playback handle is ever live:
//! toggling the active take stops it, toggling a different take stops the
//! current one before starting the new one. The player itself is a trait so
//! tests can script it; the production implementation spawns a system audio
//! player process.

use anyhow::{anyhow, Result};
use std::process::{Child, Command, Stdio};

/// A live playback instance.
pub trait PlaybackHandle {
    /// True once the audio ended or the player died.
    fn is_finished(&mut self) -> bool;
    /// Stops playback immediately. Must be idempotent.
    fn stop(&mut self);
}

/// Starts playback of an audio reference (a file path).
pub trait AudioPlayer {
    fn play(&mut self, audio_ref: &str) -> Result<Box<dyn PlaybackHandle>>;
}

/// Enforces the at-most-one-audible invariant over an injected player.
pub struct PlaybackController {
    player: Box<dyn AudioPlayer>,
    active: Option<(String, Box<dyn PlaybackHandle>)>,
}

impl PlaybackController {
    pub fn new(player: Box<dyn AudioPlayer>) -> Self {
        Self {
            player,
            active: None,
        }
    }

    /// Opens a controller over the system audio player.
    pub fn system() -> Self {
        Self::new(Box::new(ProcessPlayer))
    }

    /// Toggles playback of a take.
    ///
    /// If `id` is already playing it is stopped and nothing plays afterwards.
    /// Otherwise the current playback (if any) is stopped first, then `ref`
    /// starts. A player failure is logged and clears the active state; it is
    /// never fatal.
    pub fn toggle_play(&mut self, id: &str, audio_ref: &str) {
        if let Some((active_id, handle)) = &mut self.active {
            let was_active = active_id == id;
            handle.stop();
            self.active = None;
            if was_active {
                tracing::debug!("Playback of {} toggled off", id);
                return;
            }
        }

        match self.player.play(audio_ref) {
            Ok(handle) => {
                tracing::info!("Playing {}", id);
                self.active = Some((id.to_string(), handle));
            }
            Err(e) => {
                tracing::warn!("Playback of {} failed: {}", id, e);
            }
        }
    }

    /// Clears the active state if the audio has ended on its own. Call
    /// periodically from the UI loop.
    pub fn poll(&mut self) {
        if let Some((id, handle)) = &mut self.active {
            if handle.is_finished() {
                tracing::debug!("Playback of {} finished", id);
                self.active = None;
            }
        }
    }

    /// Id of the take currently audible, if any.
    pub fn active_id(&self) -> Option<&str> {
        self.active.as_ref().map(|(id, _)| id.as_str())
    }

    /// Stops whatever is playing. No-op when idle.
    pub fn stop_active(&mut self) {
        if let Some((id, mut handle)) = self.active.take() {
            handle.stop();
            tracing::debug!("Playback of {} stopped", id);
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.stop_active();
    }
}

/// Plays audio by spawning a system audio player process.
pub struct ProcessPlayer;

impl AudioPlayer for ProcessPlayer {
    fn play(&mut self, audio_ref: &str) -> Result<Box<dyn PlaybackHandle>> {
        let child = spawn_player(audio_ref)?;
        Ok(Box::new(ProcessHandle { child: Some(child) }))
    }
}

struct ProcessHandle {
    child: Option<Child>,
}

impl PlaybackHandle for ProcessHandle {
    fn is_finished(&mut self) -> bool {
        match &mut self.child {
            Some(child) => matches!(child.try_wait(), Ok(Some(_)) | Err(_)),
            None => true,
        }
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!("Failed to kill audio player: {}", e);
            }
            let _ = child.wait();
        }
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawns the platform audio player for a file.
///
/// On macOS: `afplay`. On Linux: tries paplay, mpv, ffplay in order.
fn spawn_player(audio_ref: &str) -> Result<Child> {
    let attempts: Vec<(&str, Vec<&str>)> = if cfg!(target_os = "macos") {
        vec![("afplay", vec![audio_ref])]
    } else {
        vec![
            ("paplay", vec![audio_ref]),
            ("mpv", vec!["--no-video", "--really-quiet", audio_ref]),
            ("ffplay", vec!["-nodisp", "-autoexit", "-loglevel", "error", audio_ref]),
        ]
    };

    for (player, args) in attempts {
        match Command::new(player)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                tracing::debug!("Audio player: {}", player);
                return Ok(child);
            }
            Err(e) => {
                tracing::debug!("Player {} unavailable: {}", player, e);
            }
        }
    }

    Err(anyhow!(
        "No audio player found. Install paplay, mpv, or ffplay."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct HandleState {
        stopped: bool,
        finished: bool,
    }

    struct FakeHandle {
        state: Rc<RefCell<HandleState>>,
    }

    impl PlaybackHandle for FakeHandle {
        fn is_finished(&mut self) -> bool {
            self.state.borrow().finished
        }

        fn stop(&mut self) {
            self.state.borrow_mut().stopped = true;
        }
    }

    /// Player that records every start and exposes the handle states.
    #[derive(Default)]
    struct FakePlayer {
        handles: Rc<RefCell<Vec<Rc<RefCell<HandleState>>>>>,
        fail: bool,
    }

    impl AudioPlayer for FakePlayer {
        fn play(&mut self, _audio_ref: &str) -> Result<Box<dyn PlaybackHandle>> {
            if self.fail {
                return Err(anyhow!("player exploded"));
            }
            let state = Rc::new(RefCell::new(HandleState::default()));
            self.handles.borrow_mut().push(Rc::clone(&state));
            Ok(Box::new(FakeHandle { state }))
        }
    }

    fn controller() -> (PlaybackController, Rc<RefCell<Vec<Rc<RefCell<HandleState>>>>>) {
        let player = FakePlayer::default();
        let handles = Rc::clone(&player.handles);
        (PlaybackController::new(Box::new(player)), handles)
    }

    #[test]
    fn toggling_active_take_stops_it() {
        let (mut controller, handles) = controller();

        controller.toggle_play("recording-a", "/tmp/a.wav");
        assert_eq!(controller.active_id(), Some("recording-a"));

        controller.toggle_play("recording-a", "/tmp/a.wav");
        assert_eq!(controller.active_id(), None);
        assert!(handles.borrow()[0].borrow().stopped);
        assert_eq!(handles.borrow().len(), 1, "toggle-off must not restart");
    }

    #[test]
    fn switching_takes_stops_previous_before_starting_next() {
        let (mut controller, handles) = controller();

        controller.toggle_play("recording-a", "/tmp/a.wav");
        controller.toggle_play("recording-b", "/tmp/b.wav");

        assert_eq!(controller.active_id(), Some("recording-b"));
        let handles = handles.borrow();
        assert_eq!(handles.len(), 2);
        assert!(handles[0].borrow().stopped, "previous playback must stop");
        assert!(!handles[1].borrow().stopped);
    }

    #[test]
    fn natural_end_clears_active_state() {
        let (mut controller, handles) = controller();

        controller.toggle_play("recording-a", "/tmp/a.wav");
        handles.borrow()[0].borrow_mut().finished = true;

        controller.poll();
        assert_eq!(controller.active_id(), None);
    }

    #[test]
    fn player_failure_leaves_nothing_active() {
        let mut controller = PlaybackController::new(Box::new(FakePlayer {
            fail: true,
            ..FakePlayer::default()
        }));

        controller.toggle_play("recording-a", "/tmp/a.wav");
        assert_eq!(controller.active_id(), None);
    }

    #[test]
    fn stop_active_is_idempotent() {
        let (mut controller, handles) = controller();

        controller.toggle_play("recording-a", "/tmp/a.wav");
        controller.stop_active();
        controller.stop_active();

        assert_eq!(controller.active_id(), None);
        assert!(handles.borrow()[0].borrow().stopped);
    }
}
