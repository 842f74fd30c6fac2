//! Stored take lifecycle: naming convention, save, list, rename, delete.
//!
//! Every take is one key-value entry: key `recording-<token>`, value the
//! path of the take's WAV file. The display name is the key minus the
//! prefix. The full set is reconstructed on every `list()` by scanning the
//! store's keys for the prefix.

use crate::export::write_wav;
use crate::store::kv::{KeyValueStore, SqliteStore};
use anyhow::Result;
use std::fs;
use std::path::PathBuf;

/// Namespace prefix distinguishing take keys from unrelated entries.
pub const KEY_PREFIX: &str = "recording-";

/// One stored take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTake {
    /// Full store key, e.g. `recording-1700000000000`
    pub id: String,
    /// Key with the prefix stripped
    pub display_name: String,
    /// Path of the take's audio file, playable as-is
    pub audio_ref: String,
}

impl StoredTake {
    fn from_entry(id: String, audio_ref: String) -> Self {
        let display_name = id
            .strip_prefix(KEY_PREFIX)
            .unwrap_or(id.as_str())
            .to_string();
        Self {
            id,
            display_name,
            audio_ref,
        }
    }
}

/// Owns the take naming convention and CRUD operations over an injected
/// key-value store.
pub struct TakeStore {
    kv: Box<dyn KeyValueStore>,
    /// Directory where take WAV files are written
    audio_dir: PathBuf,
}

impl TakeStore {
    pub fn new(kv: Box<dyn KeyValueStore>, audio_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&audio_dir)?;
        Ok(Self { kv, audio_dir })
    }

    /// Opens the SQLite-backed store in the user's data directory.
    pub fn open_default() -> Result<Self> {
        let data_dir = crate::config::file::data_dir()?;
        let kv = SqliteStore::new(&data_dir)?;
        Self::new(Box::new(kv), data_dir.join("takes"))
    }

    /// All stored takes, sorted by id for deterministic output.
    pub fn list(&mut self) -> Result<Vec<StoredTake>> {
        let mut keys: Vec<String> = self
            .kv
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with(KEY_PREFIX))
            .collect();
        keys.sort();

        let mut takes = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(audio_ref) = self.kv.get(&key)? {
                takes.push(StoredTake::from_entry(key, audio_ref));
            }
        }
        Ok(takes)
    }

    /// Persists a take: writes the samples as a WAV file and stores its path
    /// under a fresh timestamp-derived key.
    ///
    /// # Errors
    /// - If the samples are empty
    /// - If the WAV file or store entry cannot be written
    pub fn save(&mut self, samples: &[i16], sample_rate: u32) -> Result<StoredTake> {
        let token = self.fresh_token()?;
        self.save_as(&token, samples, sample_rate)
    }

    fn save_as(&mut self, token: &str, samples: &[i16], sample_rate: u32) -> Result<StoredTake> {
        if samples.is_empty() {
            return Err(anyhow::anyhow!("No audio captured, nothing to save"));
        }

        let id = format!("{KEY_PREFIX}{token}");
        let audio_path = self.audio_dir.join(format!("{id}.wav"));
        write_wav(samples, sample_rate, &audio_path)?;

        let audio_ref = audio_path.to_string_lossy().to_string();
        self.kv.set(&id, &audio_ref)?;
        tracing::info!("Take saved as {} ({} samples)", id, samples.len());

        Ok(StoredTake::from_entry(id, audio_ref))
    }

    /// Rebinds a take's audio to a new user-chosen name.
    ///
    /// Writes the new entry first, then deletes the old one; a crash in
    /// between leaves both entries present. Returns `None` (no-op) if
    /// `old_id` does not exist.
    pub fn rename(&mut self, old_id: &str, new_name: &str) -> Result<Option<StoredTake>> {
        let Some(audio_ref) = self.kv.get(old_id)? else {
            tracing::debug!("rename: {} does not exist, nothing to do", old_id);
            return Ok(None);
        };

        let new_id = format!("{KEY_PREFIX}{new_name}");
        if new_id == old_id {
            return Ok(Some(StoredTake::from_entry(new_id, audio_ref)));
        }

        self.kv.set(&new_id, &audio_ref)?;
        self.kv.remove(old_id)?;
        tracing::info!("Take {} renamed to {}", old_id, new_id);

        Ok(Some(StoredTake::from_entry(new_id, audio_ref)))
    }

    /// Removes a take and makes a best-effort attempt to delete its audio
    /// file. No-op if the id is absent.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        if let Some(audio_ref) = self.kv.get(id)? {
            if let Err(e) = fs::remove_file(&audio_ref) {
                tracing::warn!("Failed to delete take audio {}: {}", audio_ref, e);
            }
        }
        self.kv.remove(id)?;
        tracing::info!("Take {} deleted", id);
        Ok(())
    }

    /// Looks up a take by full key.
    pub fn get(&mut self, id: &str) -> Result<Option<StoredTake>> {
        Ok(self
            .kv
            .get(id)?
            .map(|audio_ref| StoredTake::from_entry(id.to_string(), audio_ref)))
    }

    /// Looks up a take by display name or full key.
    pub fn resolve(&mut self, name_or_id: &str) -> Result<Option<StoredTake>> {
        if name_or_id.starts_with(KEY_PREFIX) {
            return self.get(name_or_id);
        }
        self.get(&format!("{KEY_PREFIX}{name_or_id}"))
    }

    /// Generates an unused timestamp token, bumping past collisions so two
    /// saves in the same millisecond get distinct ids.
    fn fresh_token(&mut self) -> Result<String> {
        let mut candidate = chrono::Local::now().timestamp_millis();
        loop {
            let token = candidate.to_string();
            if self.kv.get(&format!("{KEY_PREFIX}{token}"))?.is_none() {
                return Ok(token);
            }
            candidate += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::kv::MemoryStore;
    use std::path::Path;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> TakeStore {
        TakeStore::new(Box::new(MemoryStore::new()), dir.path().join("takes")).unwrap()
    }

    #[test]
    fn save_list_rename_delete_lifecycle() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);

        let saved = store
            .save_as("1700000000000", &[0i16, 100, -100], 16000)
            .unwrap();
        assert_eq!(saved.id, "recording-1700000000000");
        assert_eq!(saved.display_name, "1700000000000");

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].display_name, "1700000000000");
        assert!(Path::new(&listed[0].audio_ref).exists());

        let renamed = store.rename("recording-1700000000000", "take1").unwrap();
        let renamed = renamed.expect("take existed");
        assert_eq!(renamed.id, "recording-take1");
        assert_eq!(renamed.display_name, "take1");

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "recording-take1");
        assert_eq!(listed[0].audio_ref, saved.audio_ref, "rename keeps the audio ref");

        store.delete("recording-take1").unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(!Path::new(&saved.audio_ref).exists());
    }

    #[test]
    fn rename_of_missing_take_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        assert!(store.rename("recording-ghost", "anything").unwrap().is_none());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn delete_of_missing_take_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store.delete("recording-ghost").unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn rename_to_same_name_keeps_entry() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store.save_as("take1", &[1i16], 16000).unwrap();

        let unchanged = store.rename("recording-take1", "take1").unwrap().unwrap();
        assert_eq!(unchanged.id, "recording-take1");
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn list_is_sorted_by_id_and_skips_foreign_keys() {
        let dir = TempDir::new().unwrap();
        let mut kv = MemoryStore::new();
        kv.set("unrelated-key", "junk").unwrap();
        let mut store = TakeStore::new(Box::new(kv), dir.path().join("takes")).unwrap();

        store.save_as("b-take", &[1i16], 16000).unwrap();
        store.save_as("a-take", &[1i16], 16000).unwrap();

        let names: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|t| t.display_name)
            .collect();
        assert_eq!(names, vec!["a-take", "b-take"]);
    }

    #[test]
    fn fresh_tokens_never_collide() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);

        let first = store.save(&[1i16], 16000).unwrap();
        let second = store.save(&[2i16], 16000).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn saved_wav_round_trips_samples() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let samples = vec![0i16, 1000, -1000, i16::MAX, i16::MIN];

        let take = store.save_as("wav-check", &samples, 16000).unwrap();

        let mut reader = hound::WavReader::open(&take.audio_ref).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().channels, 1);
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
    }

    #[test]
    fn resolve_accepts_display_name_or_full_key() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store.save_as("take1", &[1i16], 16000).unwrap();

        assert!(store.resolve("take1").unwrap().is_some());
        assert!(store.resolve("recording-take1").unwrap().is_some());
        assert!(store.resolve("nope").unwrap().is_none());
    }
}
