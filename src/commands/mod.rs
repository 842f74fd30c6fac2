//! Application command handlers for vrec.
//!
//! One submodule per CLI command.
//!
//! # Commands
//! - `record`: record a take with live spectrum visualization (default)
//! - `takes`: interactive browser over saved takes
//! - `list`: print saved takes
//! - `play`: play one take to completion
//! - `rename`: rename a saved take
//! - `delete`: delete a saved take
//! - `export`: transcode a saved take to MP3
//! - `list_devices`: list available audio input devices
//! - `logs`: display recent log entries
//! - `config`: open the configuration file in the user's editor

pub mod config;
pub mod delete;
pub mod export;
pub mod list;
pub mod list_devices;
pub mod logs;
pub mod play;
pub mod record;
pub mod rename;
pub mod takes;

pub use config::handle_config;
pub use delete::handle_delete;
pub use export::handle_export;
pub use list::handle_list;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use play::handle_play;
pub use record::handle_record;
pub use rename::handle_rename;
pub use takes::handle_takes;
