//! Compressed KV Store wrapper
//!
//! Transparent LZ4/ZSTD compression for any `KvStore` backend. Experiment
//! records are small JSON documents dominated by repeated field names and
//! zero-filled arrays, which both codecs shrink well.

use crate::kv::{KvStore, TxOp};
use crate::Result;

/// Compression algorithm for KV values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// LZ4 - Fast compression, good for the hot update path (default)
    #[default]
    Lz4,
    /// ZSTD - Better ratio, slower
    Zstd,
}

impl Compression {
    /// Get algorithm name as string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
        }
    }

    /// Compress data using this algorithm
    ///
    /// # Errors
    /// Returns error if compression fails (e.g., ZSTD internal error)
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        match self {
            Self::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
            Self::Zstd => zstd::encode_all(data, 3)
                .map_err(|e| crate::Error::StorageError(format!("ZSTD compression failed: {e}"))),
        }
    }

    /// Decompress data using this algorithm
    ///
    /// # Errors
    /// Returns error if decompression fails (e.g., corrupted record)
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        match self {
            Self::Lz4 => lz4_flex::decompress_size_prepended(data)
                .map_err(|e| crate::Error::StorageError(format!("LZ4 decompression failed: {e}"))),
            Self::Zstd => zstd::decode_all(data)
                .map_err(|e| crate::Error::StorageError(format!("ZSTD decompression failed: {e}"))),
        }
    }
}

/// Compressed KV store wrapper
///
/// Wraps any `KvStore` and compresses values on the way in, including values
/// written from inside a transaction body.
///
/// # Example
///
/// ```rust,no_run
/// use trueno_bandit::experiment::ExperimentStore;
/// use trueno_bandit::kv::{CompressedKvStore, Compression, MemoryKvStore};
///
/// let kv = CompressedKvStore::new(MemoryKvStore::new(), Compression::Lz4);
/// let store = ExperimentStore::with_defaults(kv);
/// ```
#[derive(Debug)]
pub struct CompressedKvStore<S: KvStore> {
    inner: S,
    compression: Compression,
}

impl<S: KvStore> CompressedKvStore<S> {
    /// Create a new compressed KV store wrapping the given store
    #[must_use]
    pub const fn new(inner: S, compression: Compression) -> Self {
        Self { inner, compression }
    }

    /// Get reference to inner store (for inspection/testing)
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Get compression algorithm
    #[must_use]
    pub const fn compression(&self) -> Compression {
        self.compression
    }
}

impl<S: KvStore> KvStore for CompressedKvStore<S> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.inner.get(key).await? {
            Some(compressed) => Ok(Some(self.compression.decompress(&compressed)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let compressed = self.compression.compress(&value)?;
        self.inner.set(key, compressed).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key).await
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.keys(prefix).await
    }

    async fn transaction<T, F>(&self, key: &str, body: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(Option<&[u8]>) -> Result<(TxOp, T)> + Send,
    {
        let compression = self.compression;
        self.inner
            .transaction(key, move |current| {
                let plain = current.map(|raw| compression.decompress(raw)).transpose()?;
                let (op, output) = body(plain.as_deref())?;
                let op = match op {
                    TxOp::Put(value) => TxOp::Put(compression.compress(&value)?),
                    other => other,
                };
                Ok((op, output))
            })
            .await
    }
}
