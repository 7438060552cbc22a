//! Key-Value Store Module
//!
//! The persistence collaborator behind `ExperimentStore`:
//! - In-memory backend (`MemoryKvStore`) and an optional compressing wrapper
//! - Async-first API
//! - Single-key atomic read-modify-write via `KvStore::transaction`
//!
//! # Example
//!
//! ```rust,no_run
//! use trueno_bandit::kv::{KvStore, MemoryKvStore, TxOp};
//!
//! # async fn example() -> trueno_bandit::Result<()> {
//! let store = MemoryKvStore::new();
//!
//! store.set("counter", b"1".to_vec()).await?;
//!
//! // Atomic increment: no other writer can interleave between read and write
//! let next = store
//!     .transaction("counter", |current| {
//!         let n: u64 = current.map_or(Ok(0), |v| {
//!             String::from_utf8_lossy(v).parse().map_err(|e| {
//!                 trueno_bandit::Error::StorageError(format!("bad counter: {e}"))
//!             })
//!         })?;
//!         Ok((TxOp::Put((n + 1).to_string().into_bytes()), n + 1))
//!     })
//!     .await?;
//! assert_eq!(next, 2);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "compression")]
mod compressed;
mod memory;

#[cfg(feature = "compression")]
pub use compressed::{CompressedKvStore, Compression};
pub use memory::MemoryKvStore;

use crate::Result;
use std::future::Future;

/// Write decided by a transaction body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOp {
    /// Store the value under the key
    Put(Vec<u8>),
    /// Remove the key
    Delete,
    /// Leave the key as it was
    Keep,
}

/// Key-value store trait consumed by the experiment store.
pub trait KvStore: Send + Sync {
    /// Get a value by key.
    ///
    /// Returns `None` if the key doesn't exist.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Set a value for a key.
    ///
    /// Overwrites any existing value.
    fn set(&self, key: &str, value: Vec<u8>) -> impl Future<Output = Result<()>> + Send;

    /// Delete a key.
    ///
    /// No-op if the key doesn't exist.
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// List keys starting with `prefix`, in ascending order.
    fn keys(&self, prefix: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Run `body` with exclusive access to `key`.
    ///
    /// `body` sees the current value and returns the write to apply plus an
    /// output. The write commits atomically with the read; if `body` fails,
    /// nothing is written and its error is returned.
    fn transaction<T, F>(&self, key: &str, body: F) -> impl Future<Output = Result<T>> + Send
    where
        T: Send,
        F: FnOnce(Option<&[u8]>) -> Result<(TxOp, T)> + Send;

    /// Get multiple keys in a batch.
    ///
    /// Returns values in the same order as keys. Missing keys return `None`.
    fn batch_get(
        &self,
        keys: &[&str],
    ) -> impl Future<Output = Result<Vec<Option<Vec<u8>>>>> + Send {
        async move {
            let mut results = Vec::with_capacity(keys.len());
            for key in keys {
                results.push(self.get(key).await?);
            }
            Ok(results)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[tokio::test]
    async fn test_memory_kv_set_get() {
        let store = MemoryKvStore::new();

        store.set("key1", b"value1".to_vec()).await.unwrap();
        let value = store.get("key1").await.unwrap();

        assert_eq!(value, Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn test_memory_kv_get_nonexistent() {
        let store = MemoryKvStore::new();

        assert_eq!(store.get("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_kv_delete() {
        let store = MemoryKvStore::new();

        store.set("key", b"value".to_vec()).await.unwrap();
        store.delete("key").await.unwrap();

        assert!(!store.exists("key").await.unwrap());
        // Should not error
        store.delete("key").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_kv_keys_prefix_sorted() {
        let store = MemoryKvStore::new();

        store.set("bandit:b", vec![]).await.unwrap();
        store.set("other:x", vec![]).await.unwrap();
        store.set("bandit:a", vec![]).await.unwrap();

        let keys = store.keys("bandit:").await.unwrap();
        assert_eq!(keys, vec!["bandit:a".to_string(), "bandit:b".to_string()]);
    }

    #[tokio::test]
    async fn test_memory_kv_batch_get() {
        let store = MemoryKvStore::new();

        store.set("a", b"1".to_vec()).await.unwrap();
        store.set("b", b"2".to_vec()).await.unwrap();
        // "c" intentionally not set

        let results = store.batch_get(&["a", "b", "c"]).await.unwrap();

        assert_eq!(results, vec![Some(b"1".to_vec()), Some(b"2".to_vec()), None]);
    }

    #[tokio::test]
    async fn test_transaction_put_on_vacant() {
        let store = MemoryKvStore::new();

        let seen = store
            .transaction("k", |current| Ok((TxOp::Put(b"v".to_vec()), current.is_some())))
            .await
            .unwrap();

        assert!(!seen);
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_transaction_delete_and_keep() {
        let store = MemoryKvStore::new();
        store.set("k", b"v".to_vec()).await.unwrap();

        store
            .transaction("k", |_| Ok((TxOp::Keep, ())))
            .await
            .unwrap();
        assert!(store.exists("k").await.unwrap());

        store
            .transaction("k", |_| Ok((TxOp::Delete, ())))
            .await
            .unwrap();
        assert!(!store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_transaction_error_writes_nothing() {
        let store = MemoryKvStore::new();
        store.set("k", b"before".to_vec()).await.unwrap();

        let result: crate::Result<()> = store
            .transaction("k", |_| Err(Error::StorageError("boom".to_string())))
            .await;

        assert!(result.is_err());
        assert_eq!(store.get("k").await.unwrap(), Some(b"before".to_vec()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_transaction_concurrent_increments() {
        use std::sync::Arc;

        let store = Arc::new(MemoryKvStore::new());
        let mut handles = vec![];

        // Spawn 100 concurrent read-modify-write increments
        for _ in 0..100 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .transaction("counter", |current| {
                        let n = current.map_or(0, |v| v[0]);
                        Ok((TxOp::Put(vec![n + 1]), ()))
                    })
                    .await
                    .unwrap();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.get("counter").await.unwrap(), Some(vec![100]));
    }
}
