//! Print saved takes.

use crate::store::TakeStore;

/// Lists saved takes, one per line, sorted by id.
pub fn handle_list() -> Result<(), anyhow::Error> {
    let mut store = TakeStore::open_default()?;
    let takes = store.list()?;

    if takes.is_empty() {
        println!("No takes saved yet. Run 'vrec record' first.");
        return Ok(());
    }

    for take in takes {
        println!("{}\t{}", take.display_name, take.audio_ref);
    }

    Ok(())
}
