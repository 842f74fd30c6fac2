//! Configuration management for vrec.
//!
//! Loads and saves application configuration from a TOML file in the user's
//! config directory. A default config is written on first run.

pub mod file;

pub use file::{AudioConfig, VrecConfig};
