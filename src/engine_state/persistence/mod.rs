//! # Persistence Module
//!
//! The persistence collaborator of the streaming world. A chunk is saved and reloaded
//! by its stable key; the byte layout is owned by the store implementation.
//!
//! ## Key Components
//! - `ChunkStore`: the save/load contract the world depends on
//! - `ChunkSnapshot`: the block types of one chunk, as handed to a store
//! - `AutosaveReport`: which chunks a save-all persisted and which failed
//! - `MemoryChunkStore`: keeps snapshots in memory and counts saves per key
//! - `FileChunkStore`: one JSON file per chunk, with an LRU cache of recent snapshots

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::PersistenceError;
use crate::engine_state::voxels::block::BlockTypeSize;

mod file_store;

pub use file_store::FileChunkStore;

/// The persisted form of a chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSnapshot {
    /// The chunk key, `"{x}_{y}_{z}"` of its world-unit origin.
    pub key: String,
    /// Edge length the snapshot was written with.
    pub edge: u32,
    /// Block types in storage order (x fastest, then y, then z).
    pub blocks: Vec<BlockTypeSize>,
}

/// Outcome of a save-all over the changed chunks.
#[derive(Debug, Default)]
pub struct AutosaveReport {
    /// Keys of the chunks that were persisted.
    pub saved: Vec<String>,
    /// Keys of the chunks whose save failed; they stay marked as changed.
    pub failed: Vec<(String, PersistenceError)>,
}

impl AutosaveReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Saves and reloads chunks by key.
///
/// `save` must be safe to call more than once for the same chunk: eviction and
/// autosave may both persist a chunk in the same session.
pub trait ChunkStore {
    fn save(&mut self, snapshot: &ChunkSnapshot) -> Result<(), PersistenceError>;

    /// Returns the stored snapshot for `key`, or `None` if the chunk was never saved.
    fn load(&mut self, key: &str) -> Result<Option<ChunkSnapshot>, PersistenceError>;
}

/// An in-memory `ChunkStore`.
#[derive(Default)]
pub struct MemoryChunkStore {
    snapshots: HashMap<String, ChunkSnapshot>,
    save_counts: HashMap<String, usize>,
}

impl MemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the chunk with `key` has been saved.
    pub fn save_count(&self, key: &str) -> usize {
        self.save_counts.get(key).copied().unwrap_or(0)
    }

    /// Total number of saves across all keys.
    pub fn total_saves(&self) -> usize {
        self.save_counts.values().sum()
    }

    pub fn snapshot(&self, key: &str) -> Option<&ChunkSnapshot> {
        self.snapshots.get(key)
    }
}

impl ChunkStore for MemoryChunkStore {
    fn save(&mut self, snapshot: &ChunkSnapshot) -> Result<(), PersistenceError> {
        *self.save_counts.entry(snapshot.key.clone()).or_insert(0) += 1;
        self.snapshots.insert(snapshot.key.clone(), snapshot.clone());
        Ok(())
    }

    fn load(&mut self, key: &str) -> Result<Option<ChunkSnapshot>, PersistenceError> {
        Ok(self.snapshots.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(key: &str) -> ChunkSnapshot {
        ChunkSnapshot {
            key: key.to_string(),
            edge: 1,
            blocks: vec![3],
        }
    }

    #[test]
    fn memory_store_counts_saves_per_key() {
        let mut store = MemoryChunkStore::new();
        store.save(&snapshot("0_0_0")).unwrap();
        store.save(&snapshot("0_0_0")).unwrap();
        store.save(&snapshot("16_0_0")).unwrap();
        assert_eq!(store.save_count("0_0_0"), 2);
        assert_eq!(store.save_count("16_0_0"), 1);
        assert_eq!(store.save_count("-16_0_0"), 0);
        assert_eq!(store.total_saves(), 3);
    }

    #[test]
    fn memory_store_loads_what_it_saved() {
        let mut store = MemoryChunkStore::new();
        assert_eq!(store.load("0_0_0").unwrap(), None);
        store.save(&snapshot("0_0_0")).unwrap();
        assert_eq!(store.load("0_0_0").unwrap(), Some(snapshot("0_0_0")));
    }
}
