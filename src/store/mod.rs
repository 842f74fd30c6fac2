//! Local take persistence.
//!
//! A generic string key-value store (SQLite-backed in production) plus the
//! take store that owns the `recording-` key convention and the
//! save/list/rename/delete lifecycle.

pub mod kv;
pub mod takes;

pub use kv::{KeyValueStore, MemoryStore, SqliteStore};
pub use takes::{StoredTake, TakeStore, KEY_PREFIX};
