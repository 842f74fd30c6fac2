//! Stored-take browsing feature.
//!
//! Interactive list of saved takes with playback, inline rename, and delete.

pub mod ui;

pub use ui::TakesBrowser;
