//! In-memory KV store implementation using `DashMap`.
//!
//! This is the default backend - data is lost on process restart.

use super::{KvStore, TxOp};
use crate::Result;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// In-memory key-value store using lock-free concurrent hashmap.
///
/// Thread-safe and optimized for high-concurrency read/write workloads.
/// Transactions hold the key's shard write lock for the duration of the
/// (synchronous) body, so reads and writes of the same key never interleave.
///
/// The lock covers the whole shard, not just the key: while a body runs,
/// reads of unrelated keys hashed to the same shard wait for it. Bodies must
/// stay short and must not touch the store themselves.
///
/// # Example
///
/// ```rust
/// use trueno_bandit::kv::{KvStore, MemoryKvStore};
///
/// # async fn example() -> trueno_bandit::Result<()> {
/// let store = MemoryKvStore::new();
/// store.set("hello", b"world".to_vec()).await?;
/// assert_eq!(store.get("hello").await?, Some(b"world".to_vec()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MemoryKvStore {
    store: DashMap<String, Vec<u8>>,
}

impl MemoryKvStore {
    /// Create a new in-memory KV store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
        }
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.store.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.store.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.store.contains_key(key))
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .store
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }

    async fn transaction<T, F>(&self, key: &str, body: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(Option<&[u8]>) -> Result<(TxOp, T)> + Send,
    {
        match self.store.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let (op, output) = body(Some(occupied.get().as_slice()))?;
                match op {
                    TxOp::Put(value) => {
                        occupied.insert(value);
                    }
                    TxOp::Delete => {
                        occupied.remove();
                    }
                    TxOp::Keep => {}
                }
                Ok(output)
            }
            Entry::Vacant(vacant) => {
                let (op, output) = body(None)?;
                if let TxOp::Put(value) = op {
                    vacant.insert(value);
                }
                Ok(output)
            }
        }
    }
}
