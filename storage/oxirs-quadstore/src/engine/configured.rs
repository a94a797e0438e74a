//! Engine selected at runtime from a [`BackendConfig`]

use super::{KvEngine, KvIter, KvRead, KvTransaction, KvWrite};
use super::{MemoryEngine, MemorySnapshot, MemoryTransaction};
#[cfg(feature = "rocksdb")]
use super::{RocksDbEngine, RocksDbSnapshot, RocksDbTransaction};
use crate::config::BackendConfig;
use crate::error::Result;

/// Either of the built-in engines
pub enum ConfiguredEngine {
    /// In-process map
    Memory(MemoryEngine),
    /// RocksDB database
    #[cfg(feature = "rocksdb")]
    RocksDb(RocksDbEngine),
}

impl ConfiguredEngine {
    /// Open the engine described by `backend`
    pub fn open(backend: &BackendConfig, sync_writes: bool) -> Result<Self> {
        match backend {
            BackendConfig::Memory => Ok(ConfiguredEngine::Memory(MemoryEngine::new())),
            #[cfg(feature = "rocksdb")]
            BackendConfig::RocksDb { path } => {
                RocksDbEngine::open(path, sync_writes).map(ConfiguredEngine::RocksDb)
            }
            #[cfg(not(feature = "rocksdb"))]
            BackendConfig::RocksDb { .. } => {
                let _ = sync_writes;
                Err(crate::error::StoreError::Config(
                    "rocksdb backend requires the `rocksdb` feature".to_string(),
                ))
            }
        }
    }
}

/// Snapshot of a [`ConfiguredEngine`]
pub enum ConfiguredSnapshot<'a> {
    /// Snapshot of the in-memory engine
    Memory(MemorySnapshot),
    /// Snapshot of the RocksDB engine
    #[cfg(feature = "rocksdb")]
    RocksDb(RocksDbSnapshot<'a>),
    #[doc(hidden)]
    #[cfg(not(feature = "rocksdb"))]
    _Unused(std::marker::PhantomData<&'a ()>, std::convert::Infallible),
}

/// Write transaction of a [`ConfiguredEngine`]
pub enum ConfiguredTransaction<'a> {
    /// Transaction on the in-memory engine
    Memory(MemoryTransaction<'a>),
    /// Transaction on the RocksDB engine
    #[cfg(feature = "rocksdb")]
    RocksDb(RocksDbTransaction<'a>),
}

macro_rules! dispatch {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            Self::Memory($inner) => $body,
            #[cfg(feature = "rocksdb")]
            Self::RocksDb($inner) => $body,
        }
    };
}

impl KvEngine for ConfiguredEngine {
    type Snapshot<'a> = ConfiguredSnapshot<'a>;
    type Transaction<'a> = ConfiguredTransaction<'a>;

    fn snapshot(&self) -> Result<ConfiguredSnapshot<'_>> {
        match self {
            ConfiguredEngine::Memory(engine) => engine.snapshot().map(ConfiguredSnapshot::Memory),
            #[cfg(feature = "rocksdb")]
            ConfiguredEngine::RocksDb(engine) => {
                engine.snapshot().map(ConfiguredSnapshot::RocksDb)
            }
        }
    }

    fn begin(&self) -> Result<ConfiguredTransaction<'_>> {
        match self {
            ConfiguredEngine::Memory(engine) => engine.begin().map(ConfiguredTransaction::Memory),
            #[cfg(feature = "rocksdb")]
            ConfiguredEngine::RocksDb(engine) => {
                engine.begin().map(ConfiguredTransaction::RocksDb)
            }
        }
    }

    fn name(&self) -> &'static str {
        dispatch!(self, engine => engine.name())
    }
}

impl KvRead for ConfiguredSnapshot<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self {
            ConfiguredSnapshot::Memory(snapshot) => snapshot.get(key),
            #[cfg(feature = "rocksdb")]
            ConfiguredSnapshot::RocksDb(snapshot) => snapshot.get(key),
            #[cfg(not(feature = "rocksdb"))]
            ConfiguredSnapshot::_Unused(_, never) => match *never {},
        }
    }

    fn scan_prefix(&self, prefix: &[u8]) -> KvIter<'_> {
        match self {
            ConfiguredSnapshot::Memory(snapshot) => snapshot.scan_prefix(prefix),
            #[cfg(feature = "rocksdb")]
            ConfiguredSnapshot::RocksDb(snapshot) => snapshot.scan_prefix(prefix),
            #[cfg(not(feature = "rocksdb"))]
            ConfiguredSnapshot::_Unused(_, never) => match *never {},
        }
    }
}

impl KvRead for ConfiguredTransaction<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        dispatch!(self, tx => tx.get(key))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> KvIter<'_> {
        dispatch!(self, tx => tx.scan_prefix(prefix))
    }
}

impl KvWrite for ConfiguredTransaction<'_> {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        dispatch!(self, tx => tx.put(key, value))
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        dispatch!(self, tx => tx.delete(key))
    }
}

impl KvTransaction for ConfiguredTransaction<'_> {
    fn commit(self) -> Result<()> {
        dispatch!(self, tx => tx.commit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn test_open_memory_backend() -> Result<()> {
        let engine = ConfiguredEngine::open(&BackendConfig::Memory, true)?;
        assert_eq!(engine.name(), "memory");

        let mut tx = engine.begin()?;
        tx.put(b"k", b"v")?;
        tx.commit()?;
        assert_eq!(engine.snapshot()?.get(b"k")?, Some(b"v".to_vec()));
        Ok(())
    }

    #[cfg(not(feature = "rocksdb"))]
    #[test]
    fn test_rocksdb_backend_needs_feature() {
        let backend = BackendConfig::RocksDb {
            path: "quads".into(),
        };
        assert!(matches!(
            ConfiguredEngine::open(&backend, true),
            Err(StoreError::Config(_))
        ));
    }

    #[cfg(feature = "rocksdb")]
    #[test]
    fn test_open_rocksdb_backend() -> Result<()> {
        let temp_dir = tempfile::TempDir::new()?;
        let backend = BackendConfig::RocksDb {
            path: temp_dir.path().to_path_buf(),
        };
        let engine = ConfiguredEngine::open(&backend, false)?;
        assert_eq!(engine.name(), "rocksdb");
        Ok(())
    }
}
