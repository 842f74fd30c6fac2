//! Export a saved take to MP3.

use crate::config::VrecConfig;
use crate::export;
use crate::store::TakeStore;
use std::path::{Path, PathBuf};

/// Transcodes a saved take to the configured export format.
pub fn handle_export(name: String, output: Option<String>) -> Result<(), anyhow::Error> {
    let config = VrecConfig::load()?;
    let mut store = TakeStore::open_default()?;

    let Some(take) = store.resolve(&name)? else {
        return Err(anyhow::anyhow!(
            "No take named '{name}'. Use 'vrec list' to see saved takes."
        ));
    };

    let output = output
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(export::DEFAULT_EXPORT_NAME));

    export::export_file(
        Path::new(&take.audio_ref),
        &config.audio.export_format,
        &output,
    )?;

    println!("Exported '{}' to {}", take.display_name, output.display());
    Ok(())
}
