//! Audio recording feature for vrec.
//!
//! Provides the recording session state machine, microphone capture,
//! real-time spectrum visualization, and the recording TUI.

pub mod capture;
pub mod session;
pub mod ui;
pub mod visualizer;

pub use capture::{Chunk, ChunkSink, CaptureSource, CpalCapture};
pub use session::{RecordingSession, SessionStatus};
pub use ui::{RecordCommand, RecordTui};
pub use visualizer::SpectrumAnalyzer;
