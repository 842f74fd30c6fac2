//! Rename a saved take.

use crate::store::TakeStore;

/// Renames a take; a missing take is reported but is not an error.
pub fn handle_rename(old_name: String, new_name: String) -> Result<(), anyhow::Error> {
    let mut store = TakeStore::open_default()?;

    let Some(take) = store.resolve(&old_name)? else {
        println!("No take named '{old_name}', nothing renamed.");
        return Ok(());
    };

    match store.rename(&take.id, &new_name)? {
        Some(renamed) => println!("Renamed '{}' to '{}'", old_name, renamed.display_name),
        None => println!("No take named '{old_name}', nothing renamed."),
    }

    Ok(())
}
