//! Recording session state machine.
//!
//! A session moves through Idle -> Recording <-> Paused -> Stopped. It owns
//! the capture source for its active lifetime and accounts elapsed time from
//! wall-clock instants so the display stays correct even when ticks are
//! missed. Invalid transitions are no-ops, never errors.

use crate::recording::capture::{CaptureSource, Chunk, ChunkSink};
use anyhow::Result;
use std::time::{Duration, Instant};

/// Current state of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Recording,
    Paused,
    Stopped,
}

/// Owns one take's capture lifecycle and its accumulated chunks.
///
/// Chunks remain available after `stop()` for save/export and are cleared
/// on the next `start()`.
pub struct RecordingSession {
    status: SessionStatus,
    capture: Box<dyn CaptureSource>,
    sink: ChunkSink,
    sample_rate: u32,
    last_error: Option<String>,
    started_at: Option<Instant>,
    pause_total: Duration,
    pause_started: Option<Instant>,
    elapsed_frozen: Option<Duration>,
}

impl RecordingSession {
    pub fn new(capture: Box<dyn CaptureSource>) -> Self {
        Self {
            status: SessionStatus::Idle,
            capture,
            sink: ChunkSink::new(),
            sample_rate: 0,
            last_error: None,
            started_at: None,
            pause_total: Duration::ZERO,
            pause_started: None,
            elapsed_frozen: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Diagnostic from the most recent failed `start()`, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Starts a new take: clears prior chunks, resets elapsed time, and
    /// acquires the capture device.
    ///
    /// Rejected (no-op) while a take is already active. On device failure the
    /// session stays `Idle` with `last_error` set and no resources retained.
    pub fn start(&mut self) -> Result<()> {
        if matches!(self.status, SessionStatus::Recording | SessionStatus::Paused) {
            tracing::warn!("start() ignored: a recording is already active");
            return Ok(());
        }

        self.sink.clear();
        self.pause_total = Duration::ZERO;
        self.pause_started = None;
        self.elapsed_frozen = None;

        match self.capture.open(self.sink.clone()) {
            Ok(sample_rate) => {
                self.sample_rate = sample_rate;
                self.sink.set_accepting(true);
                self.started_at = Some(Instant::now());
                self.status = SessionStatus::Recording;
                self.last_error = None;
                tracing::info!("Recording started at {}Hz", sample_rate);
                Ok(())
            }
            Err(e) => {
                // Release anything the source may have partially opened
                self.capture.close();
                self.sink.set_accepting(false);
                self.started_at = None;
                self.status = SessionStatus::Idle;
                self.last_error = Some(e.to_string());
                tracing::error!("Failed to start recording: {}", e);
                Err(e)
            }
        }
    }

    /// Freezes elapsed accrual and gates off chunk delivery. No-op unless
    /// currently `Recording`.
    pub fn pause(&mut self) {
        if self.status != SessionStatus::Recording {
            return;
        }
        self.sink.set_accepting(false);
        self.pause_started = Some(Instant::now());
        self.status = SessionStatus::Paused;
        tracing::debug!("Recording paused");
    }

    /// Resumes accrual and chunk delivery without resetting anything. No-op
    /// unless currently `Paused`.
    pub fn resume(&mut self) {
        if self.status != SessionStatus::Paused {
            return;
        }
        if let Some(pause_started) = self.pause_started.take() {
            self.pause_total += pause_started.elapsed();
        }
        self.sink.set_accepting(true);
        self.status = SessionStatus::Recording;
        tracing::debug!("Recording resumed");
    }

    /// Stops the take and releases the capture device. Chunks stay available
    /// until the next `start()`. No-op unless `Recording` or `Paused`.
    pub fn stop(&mut self) {
        if !matches!(self.status, SessionStatus::Recording | SessionStatus::Paused) {
            return;
        }
        self.elapsed_frozen = Some(self.elapsed());
        self.sink.set_accepting(false);
        self.capture.close();
        self.status = SessionStatus::Stopped;
        tracing::info!(
            "Recording stopped: {:.2}s, {} chunks",
            self.elapsed().as_secs_f32(),
            self.sink.chunk_count()
        );
    }

    /// Toggles between `Recording` and `Paused`.
    pub fn toggle_pause(&mut self) {
        match self.status {
            SessionStatus::Recording => self.pause(),
            SessionStatus::Paused => self.resume(),
            _ => {}
        }
    }

    /// Elapsed recording time, excluding paused intervals. Frozen once the
    /// session is stopped.
    pub fn elapsed(&self) -> Duration {
        if let Some(frozen) = self.elapsed_frozen {
            return frozen;
        }
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let mut pause_time = self.pause_total;
        if let Some(pause_started) = self.pause_started {
            pause_time += pause_started.elapsed();
        }
        started_at.elapsed().saturating_sub(pause_time)
    }

    pub fn elapsed_millis(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    /// Actual capture sample rate of the current take.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn chunk_count(&self) -> usize {
        self.sink.chunk_count()
    }

    /// All captured samples of the current take, flattened in delivery order.
    pub fn samples(&self) -> Vec<i16> {
        self.sink.samples()
    }

    /// Up to the last `max` samples, for the visualizer.
    pub fn recent_samples(&self, max: usize) -> Vec<i16> {
        self.sink.recent_samples(max)
    }

    /// Test/diagnostic access to the shared sink.
    #[cfg(test)]
    fn sink(&self) -> ChunkSink {
        self.sink.clone()
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        // Component teardown must release the device like any other exit path
        self.stop();
    }
}

/// Convenience for tests and callers that already hold raw chunks.
pub fn flatten_chunks(chunks: &[Chunk]) -> Vec<i16> {
    chunks.iter().flatten().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::{Arc, Mutex};

    /// Capture source that hands the sink back to the test.
    struct FakeCapture {
        sink: Arc<Mutex<Option<ChunkSink>>>,
        fail_open: bool,
        open_count: usize,
        closed: Arc<Mutex<bool>>,
    }

    impl FakeCapture {
        fn new() -> (Self, Arc<Mutex<Option<ChunkSink>>>, Arc<Mutex<bool>>) {
            let sink = Arc::new(Mutex::new(None));
            let closed = Arc::new(Mutex::new(false));
            (
                Self {
                    sink: Arc::clone(&sink),
                    fail_open: false,
                    open_count: 0,
                    closed: Arc::clone(&closed),
                },
                sink,
                closed,
            )
        }

        fn failing() -> Self {
            Self {
                sink: Arc::new(Mutex::new(None)),
                fail_open: true,
                open_count: 0,
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl CaptureSource for FakeCapture {
        fn open(&mut self, sink: ChunkSink) -> Result<u32> {
            self.open_count += 1;
            if self.fail_open {
                return Err(anyhow!("microphone access denied"));
            }
            *self.sink.lock().unwrap() = Some(sink);
            *self.closed.lock().unwrap() = false;
            Ok(16000)
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    fn push(sink: &Arc<Mutex<Option<ChunkSink>>>, chunk: Chunk) {
        sink.lock().unwrap().as_ref().unwrap().push(chunk);
    }

    #[test]
    fn chunks_grow_only_while_recording() {
        let (capture, sink, _) = FakeCapture::new();
        let mut session = RecordingSession::new(Box::new(capture));

        session.start().unwrap();
        assert_eq!(session.status(), SessionStatus::Recording);
        push(&sink, vec![1, 2]);
        assert_eq!(session.chunk_count(), 1);

        session.pause();
        push(&sink, vec![3, 4]);
        assert_eq!(session.chunk_count(), 1, "paused session must not accumulate");

        session.resume();
        push(&sink, vec![5, 6]);
        assert_eq!(session.chunk_count(), 2);

        session.stop();
        push(&sink, vec![7, 8]);
        assert_eq!(session.chunk_count(), 2, "stopped session must not accumulate");
        assert_eq!(session.samples(), vec![1, 2, 5, 6]);
    }

    #[test]
    fn invalid_transitions_are_noops() {
        let (capture, _, _) = FakeCapture::new();
        let mut session = RecordingSession::new(Box::new(capture));

        // Nothing active yet: all of these must be silent no-ops
        session.pause();
        session.resume();
        session.stop();
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.elapsed_millis(), 0);

        session.start().unwrap();
        session.resume(); // not paused
        assert_eq!(session.status(), SessionStatus::Recording);

        // Second start while active is rejected without corrupting state
        session.start().unwrap();
        assert_eq!(session.status(), SessionStatus::Recording);

        session.stop();
        session.pause();
        assert_eq!(session.status(), SessionStatus::Stopped);
    }

    #[test]
    fn failed_start_stays_idle_and_records_error() {
        let mut session = RecordingSession::new(Box::new(FakeCapture::failing()));
        assert!(session.start().is_err());
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.last_error().unwrap().contains("denied"));
        assert_eq!(session.chunk_count(), 0);
    }

    #[test]
    fn start_clears_previous_take() {
        let (capture, sink, _) = FakeCapture::new();
        let mut session = RecordingSession::new(Box::new(capture));

        session.start().unwrap();
        push(&sink, vec![1]);
        session.stop();
        assert_eq!(session.chunk_count(), 1);

        session.start().unwrap();
        assert_eq!(session.chunk_count(), 0);
        assert_eq!(session.elapsed_millis(), 0);
    }

    #[test]
    fn stop_releases_capture_and_gates_sink() {
        let (capture, _, closed) = FakeCapture::new();
        let mut session = RecordingSession::new(Box::new(capture));

        session.start().unwrap();
        let sink = session.sink();
        assert!(sink.is_accepting());

        session.stop();
        assert!(*closed.lock().unwrap(), "capture device must be released");
        assert!(!sink.is_accepting());
    }

    #[test]
    fn elapsed_excludes_pauses_and_freezes_on_stop() {
        let (capture, _, _) = FakeCapture::new();
        let mut session = RecordingSession::new(Box::new(capture));

        session.start().unwrap();
        std::thread::sleep(Duration::from_millis(120));

        session.pause();
        let at_pause = session.elapsed_millis();
        std::thread::sleep(Duration::from_millis(100));
        let while_paused = session.elapsed_millis();
        assert!(while_paused < at_pause + 50, "elapsed must not accrue while paused");

        session.resume();
        std::thread::sleep(Duration::from_millis(80));
        session.stop();

        let final_elapsed = session.elapsed_millis();
        assert!((150..=400).contains(&final_elapsed), "got {final_elapsed}ms");

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(session.elapsed_millis(), final_elapsed, "elapsed frozen after stop");
    }
}
