use std::{
    fs,
    io::ErrorKind,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use lru::LruCache;

use super::{ChunkSnapshot, ChunkStore};
use crate::core::PersistenceError;

/// Number of recently saved or loaded snapshots kept in memory.
pub const SNAPSHOT_CACHE_SIZE: usize = 64;

/// Stores every chunk as `{directory}/{key}.json`.
///
/// Snapshots that were just written or read are kept in an LRU cache, so a chunk that
/// is evicted and then streamed back in shortly after does not touch the disk.
pub struct FileChunkStore {
    directory: PathBuf,
    cache: LruCache<String, ChunkSnapshot>,
}

impl FileChunkStore {
    /// Opens (and creates if needed) a store rooted at `directory`.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|source| PersistenceError::Io {
            path: directory.clone(),
            source,
        })?;
        let capacity = NonZeroUsize::new(SNAPSHOT_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Ok(FileChunkStore {
            directory,
            cache: LruCache::new(capacity),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.json", key))
    }
}

impl ChunkStore for FileChunkStore {
    fn save(&mut self, snapshot: &ChunkSnapshot) -> Result<(), PersistenceError> {
        let path = self.path_for(&snapshot.key);
        let json = serde_json::to_vec(snapshot).map_err(|source| PersistenceError::Serialization {
            key: snapshot.key.clone(),
            source,
        })?;
        // Write next to the target and rename, so a crash never leaves half a chunk.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, json)
            .and_then(|_| fs::rename(&staging, &path))
            .map_err(|source| PersistenceError::Io { path, source })?;

        self.cache.put(snapshot.key.clone(), snapshot.clone());
        Ok(())
    }

    fn load(&mut self, key: &str) -> Result<Option<ChunkSnapshot>, PersistenceError> {
        if let Some(snapshot) = self.cache.get(key) {
            return Ok(Some(snapshot.clone()));
        }

        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(PersistenceError::Io { path, source }),
        };
        let snapshot: ChunkSnapshot =
            serde_json::from_slice(&bytes).map_err(|source| PersistenceError::Serialization {
                key: key.to_string(),
                source,
            })?;
        if snapshot.key != key {
            return Err(PersistenceError::Corrupted {
                key: key.to_string(),
                reason: format!("file holds chunk {}", snapshot.key),
            });
        }

        self.cache.put(key.to_string(), snapshot.clone());
        Ok(Some(snapshot))
    }
}
