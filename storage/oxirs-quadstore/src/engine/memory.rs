//! In-process engine backed by a copy-on-write ordered map

use super::buffer::WriteBuffer;
use super::{KvEngine, KvIter, KvRead, KvTransaction, KvWrite};
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tracing::trace;

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

/// Volatile engine; snapshots share the map until the next commit copies it
#[derive(Default)]
pub struct MemoryEngine {
    data: RwLock<Arc<Map>>,
}

impl MemoryEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether no key has been committed
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl KvEngine for MemoryEngine {
    type Snapshot<'a> = MemorySnapshot;
    type Transaction<'a> = MemoryTransaction<'a>;

    fn snapshot(&self) -> Result<MemorySnapshot> {
        Ok(MemorySnapshot {
            data: Arc::clone(&self.data.read()),
        })
    }

    fn begin(&self) -> Result<MemoryTransaction<'_>> {
        Ok(MemoryTransaction {
            engine: self,
            buffer: WriteBuffer::new(self.snapshot()?),
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Immutable view of the map at the time it was taken
pub struct MemorySnapshot {
    data: Arc<Map>,
}

impl KvRead for MemorySnapshot {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> KvIter<'_> {
        let owned_prefix = prefix.to_vec();
        Box::new(
            self.data
                .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
                .take_while(move |(key, _)| key.starts_with(&owned_prefix))
                .map(|(key, value)| Ok((key.clone(), value.clone()))),
        )
    }
}

/// Buffered write transaction over a [`MemoryEngine`]
pub struct MemoryTransaction<'a> {
    engine: &'a MemoryEngine,
    buffer: WriteBuffer<MemorySnapshot>,
}

impl KvRead for MemoryTransaction<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.buffer.get(key)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> KvIter<'_> {
        self.buffer.scan_prefix(prefix)
    }
}

impl KvWrite for MemoryTransaction<'_> {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.buffer.put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.buffer.delete(key)
    }
}

impl KvTransaction for MemoryTransaction<'_> {
    fn commit(self) -> Result<()> {
        let pending = self.buffer.into_pending();
        trace!(effects = pending.len(), "applying memory transaction");
        let mut guard = self.engine.data.write();
        let map = Arc::make_mut(&mut guard);
        for (key, value) in pending {
            match value {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    map.remove(&key);
                }
            }
        }
        Ok(())
    }
}
