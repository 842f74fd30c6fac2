//! Configuration file management for vrec.
//!
//! Configuration lives at `~/.config/vrec/vrec.toml`. Missing files are
//! created with defaults so the recorder works out of the box.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Audio capture and export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio input device. Options:
    /// - "default" for the system default device
    /// - numeric index (0, 1, 2, etc.) from `vrec list-devices`
    /// - device name from `vrec list-devices`
    pub device: String,
    /// Requested sample rate in Hz (the device's native rate wins if they differ)
    pub sample_rate: u32,
    /// Reference level in dBFS mapped to 100% in the spectrum display
    #[serde(default = "default_reference_level_db")]
    pub reference_level_db: i8,
    /// Export format string: "codec [ffmpeg_options]"
    #[serde(default = "default_export_format")]
    pub export_format: String,
}

fn default_export_format() -> String {
    // Matches the fixed MP3 export profile: 44.1 kHz, 192 kbps
    "libmp3lame -ar 44100 -b:a 192k".to_string()
}

fn default_reference_level_db() -> i8 {
    -20
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: "default".to_string(),
            sample_rate: 44100,
            reference_level_db: default_reference_level_db(),
            export_format: default_export_format(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VrecConfig {
    pub audio: AudioConfig,
}

impl VrecConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// Writes and returns the default configuration if the file does not
    /// exist yet.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the TOML is malformed
    pub fn load() -> Result<Self> {
        let config_path = config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            tracing::info!("Created default config at {}", config_path.display());
            return Ok(config);
        }

        let config_content = fs::read_to_string(&config_path)?;
        let config: VrecConfig = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> Result<()> {
        let config_path = config_path()?;
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }
}

/// Retrieves the path to the config file, creating parent directories.
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    let config_path = home.join(".config").join("vrec").join("vrec.toml");

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    Ok(config_path)
}

/// Resolves the data directory where take audio and the store database live.
pub fn data_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    let dir = home.join(".local").join("share").join("vrec");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = VrecConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: VrecConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.audio.device, "default");
        assert_eq!(parsed.audio.sample_rate, 44100);
        assert_eq!(parsed.audio.export_format, "libmp3lame -ar 44100 -b:a 192k");
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let parsed: VrecConfig = toml::from_str(
            "[audio]\ndevice = \"default\"\nsample_rate = 16000\n",
        )
        .unwrap();
        assert_eq!(parsed.audio.reference_level_db, -20);
        assert!(parsed.audio.export_format.starts_with("libmp3lame"));
    }
}
