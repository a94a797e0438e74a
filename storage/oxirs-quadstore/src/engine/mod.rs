//! Ordered key/value engine abstraction
//!
//! The quad store only needs a handful of primitives from its persistence
//! layer: point reads, ordered prefix scans, snapshot-isolated readers and an
//! atomic commit for the single writer. Engines implement [`KvEngine`]; the
//! store never assumes anything else about them.

mod buffer;
mod configured;
mod memory;
#[cfg(feature = "rocksdb")]
mod rocks;

pub use buffer::WriteBuffer;
pub use configured::{ConfiguredEngine, ConfiguredSnapshot, ConfiguredTransaction};
pub use memory::{MemoryEngine, MemorySnapshot, MemoryTransaction};
#[cfg(feature = "rocksdb")]
pub use rocks::{RocksDbEngine, RocksDbSnapshot, RocksDbTransaction};

use crate::error::Result;

/// Iterator over `(key, value)` pairs in ascending key order
pub type KvIter<'a> = Box<dyn Iterator<Item = Result<(Vec<u8>, Vec<u8>)>> + 'a>;

/// Read access to an ordered keyspace
pub trait KvRead {
    /// Point lookup
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// All entries whose key starts with `prefix`, in key order
    fn scan_prefix(&self, prefix: &[u8]) -> KvIter<'_>;

    /// Whether `key` is present
    fn contains_key(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Whether at least one key starts with `prefix`
    fn has_prefix(&self, prefix: &[u8]) -> Result<bool> {
        match self.scan_prefix(prefix).next() {
            Some(Ok(_)) => Ok(true),
            Some(Err(e)) => Err(e),
            None => Ok(false),
        }
    }
}

/// Write access to an ordered keyspace
pub trait KvWrite: KvRead {
    /// Insert or overwrite a key
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove a key; removing an absent key is not an error
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Remove every key starting with `prefix`, returning how many were removed
    fn delete_prefix(&mut self, prefix: &[u8]) -> Result<usize> {
        let keys = self
            .scan_prefix(prefix)
            .map(|entry| entry.map(|(key, _)| key))
            .collect::<Result<Vec<_>>>()?;
        for key in &keys {
            self.delete(key)?;
        }
        Ok(keys.len())
    }
}

/// A write transaction: buffered effects that land atomically on commit
pub trait KvTransaction: KvWrite {
    /// Make every buffered effect durable at once
    fn commit(self) -> Result<()>;

    /// Discard every buffered effect
    fn abort(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}

/// An ordered key/value engine with snapshot reads and atomic commits
///
/// Engines may assume at most one [`KvEngine::begin`] transaction is live at
/// a time; the store serialises writers before calling it.
pub trait KvEngine: Send + Sync {
    /// Consistent read-only view
    type Snapshot<'a>: KvRead
    where
        Self: 'a;

    /// Write transaction
    type Transaction<'a>: KvTransaction
    where
        Self: 'a;

    /// Take a snapshot of the committed state
    fn snapshot(&self) -> Result<Self::Snapshot<'_>>;

    /// Begin a write transaction over the committed state
    fn begin(&self) -> Result<Self::Transaction<'_>>;

    /// Short engine name for logging
    fn name(&self) -> &'static str;
}
