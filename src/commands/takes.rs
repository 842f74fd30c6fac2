//! Interactive browser over saved takes.

use crate::playback::PlaybackController;
use crate::store::TakeStore;
use crate::takes::TakesBrowser;

/// Opens the takes browser: play, rename, and delete saved takes.
pub async fn handle_takes() -> Result<(), anyhow::Error> {
    let mut store = TakeStore::open_default()?;
    let mut playback = PlaybackController::system();

    let mut browser = TakesBrowser::new(&mut store)?;
    browser.run(&mut store, &mut playback)?;

    Ok(())
}
