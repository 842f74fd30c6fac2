//! Delete a saved take.

use crate::store::TakeStore;

/// Deletes a take; deleting a missing take is a no-op.
pub fn handle_delete(name: String) -> Result<(), anyhow::Error> {
    let mut store = TakeStore::open_default()?;

    let Some(take) = store.resolve(&name)? else {
        println!("No take named '{name}', nothing deleted.");
        return Ok(());
    };

    store.delete(&take.id)?;
    println!("Deleted '{}'", take.display_name);
    Ok(())
}
