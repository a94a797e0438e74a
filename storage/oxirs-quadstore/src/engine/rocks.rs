//! Durable engine backed by RocksDB
//!
//! Readers use RocksDB snapshots; the writer buffers its effects and lands
//! them as a single `WriteBatch`, which RocksDB applies atomically.

use super::buffer::WriteBuffer;
use super::{KvEngine, KvIter, KvRead, KvTransaction, KvWrite};
use crate::error::{Result, StoreError};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use std::path::Path;
use tracing::{debug, trace};

/// RocksDB-backed engine
pub struct RocksDbEngine {
    db: DB,
    sync_writes: bool,
}

impl RocksDbEngine {
    /// Open or create a database directory
    pub fn open<P: AsRef<Path>>(path: P, sync_writes: bool) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path.as_ref())?;
        debug!(path = %path.as_ref().display(), sync_writes, "opened RocksDB engine");
        Ok(RocksDbEngine { db, sync_writes })
    }

    /// Flush memtables to disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush().map_err(StoreError::from)
    }
}

impl KvEngine for RocksDbEngine {
    type Snapshot<'a> = RocksDbSnapshot<'a>;
    type Transaction<'a> = RocksDbTransaction<'a>;

    fn snapshot(&self) -> Result<RocksDbSnapshot<'_>> {
        Ok(RocksDbSnapshot {
            snapshot: self.db.snapshot(),
        })
    }

    fn begin(&self) -> Result<RocksDbTransaction<'_>> {
        Ok(RocksDbTransaction {
            engine: self,
            buffer: WriteBuffer::new(self.snapshot()?),
        })
    }

    fn name(&self) -> &'static str {
        "rocksdb"
    }
}

/// Point-in-time RocksDB snapshot
pub struct RocksDbSnapshot<'a> {
    snapshot: rocksdb::Snapshot<'a>,
}

impl KvRead for RocksDbSnapshot<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.snapshot.get(key).map_err(StoreError::from)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> KvIter<'_> {
        let owned_prefix = prefix.to_vec();
        let iter = self
            .snapshot
            .iterator(IteratorMode::From(prefix, Direction::Forward))
            .map(|entry| {
                entry
                    .map(|(key, value)| (key.into_vec(), value.into_vec()))
                    .map_err(StoreError::from)
            })
            .take_while(move |entry| match entry {
                Ok((key, _)) => key.starts_with(&owned_prefix),
                Err(_) => true,
            });
        Box::new(iter)
    }
}

/// Buffered write transaction over a [`RocksDbEngine`]
pub struct RocksDbTransaction<'a> {
    engine: &'a RocksDbEngine,
    buffer: WriteBuffer<RocksDbSnapshot<'a>>,
}

impl KvRead for RocksDbTransaction<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.buffer.get(key)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> KvIter<'_> {
        self.buffer.scan_prefix(prefix)
    }
}

impl KvWrite for RocksDbTransaction<'_> {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.buffer.put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.buffer.delete(key)
    }
}

impl KvTransaction for RocksDbTransaction<'_> {
    fn commit(self) -> Result<()> {
        let engine = self.engine;
        let mut batch = WriteBatch::default();
        for (key, value) in self.buffer.into_pending() {
            match value {
                Some(value) => batch.put(key, value),
                None => batch.delete(key),
            }
        }
        trace!(effects = batch.len(), "writing RocksDB batch");
        let mut opts = WriteOptions::default();
        opts.set_sync(engine.sync_writes);
        engine.db.write_opt(batch, &opts).map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rocksdb_commit_and_snapshot() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let engine = RocksDbEngine::open(temp_dir.path(), false)?;
        let before = engine.snapshot()?;

        let mut tx = engine.begin()?;
        tx.put(b"p1", b"a")?;
        tx.put(b"p2", b"b")?;
        tx.put(b"q1", b"c")?;
        tx.commit()?;

        assert_eq!(before.get(b"p1")?, None);
        let after = engine.snapshot()?;
        let keys: Vec<Vec<u8>> = after
            .scan_prefix(b"p")
            .map(|entry| entry.map(|(key, _)| key))
            .collect::<Result<_>>()?;
        assert_eq!(keys, vec![b"p1".to_vec(), b"p2".to_vec()]);
        Ok(())
    }

    #[test]
    fn test_rocksdb_reopen_keeps_data() -> Result<()> {
        let temp_dir = TempDir::new()?;
        {
            let engine = RocksDbEngine::open(temp_dir.path(), true)?;
            let mut tx = engine.begin()?;
            tx.put(b"durable", b"yes")?;
            tx.commit()?;
        }
        let engine = RocksDbEngine::open(temp_dir.path(), true)?;
        assert_eq!(engine.snapshot()?.get(b"durable")?, Some(b"yes".to_vec()));
        Ok(())
    }
}
