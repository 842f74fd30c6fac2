//! vrec - terminal voice recorder.
//!
//! Record from the microphone with a live spectrum visualization, keep
//! takes in a local store, play them back, and export to MP3.

pub mod app;
pub mod commands;
pub mod config;
pub mod export;
pub mod logging;
pub mod playback;
pub mod recording;
pub mod store;
pub mod takes;
pub mod ui;
