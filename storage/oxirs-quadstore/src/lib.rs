//! # OxiRS QuadStore - Embedded RDF Quad Store
//!
//! OxiRS QuadStore is the indexing and term-encoding core of a persistent
//! RDF quad store. Statements are `(subject, predicate, object, context)`
//! quads grouped into named collections, stored over any ordered key/value
//! engine with snapshot reads and atomic commits.
//!
//! ## Key Features
//!
//! - **Canonical term encoding**: reversible, Turtle-shaped byte forms
//! - **Term dictionary**: dense 64-bit ids with forward and reverse lookup
//! - **Seven permutation indexes**: every bound-field combination is a prefix scan
//! - **Single writer, many readers**: snapshot isolation, read-your-writes for the writer
//! - **Pluggable engines**: in-memory by default, RocksDB behind the `rocksdb` feature
//!
//! ## Quick Start
//!
//! ```rust
//! use oxirs_quadstore::{CollectionName, Context, Iri, Literal, QuadPattern, QuadStore, Statement};
//!
//! # fn example() -> oxirs_quadstore::Result<()> {
//! let store = QuadStore::in_memory();
//! let people = CollectionName::new("people")?;
//!
//! let mut tx = store.write()?;
//! tx.create_collection(&people)?;
//! let alex = tx.new_entity(&people)?;
//! tx.add_statement(
//!     &people,
//!     &Statement::new(alex, Iri::new("http://xmlns.com/foaf/0.1/name")?, Literal::string("Alex"), Context::Default),
//! )?;
//! tx.commit()?;
//!
//! let tx = store.read()?;
//! let names = tx.count(&people, &QuadPattern::any().with_subject(alex))?;
//! assert_eq!(names, 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Architecture Overview
//!
//! ### Term Layer
//! - **[`model`]**: entities, predicates, literals, contexts and statements
//! - **[`codec`]**: canonical byte encoding of terms
//! - **[`dictionary`]**: term <-> id mapping per collection
//!
//! ### Index Layer
//! - **[`encoded_quad`]**: fixed-width, order-preserving index keys
//! - **[`index`]**: the seven permutation indexes and pattern matching
//! - **[`keys`]**: physical key layout
//!
//! ### Storage Layer
//! - **[`engine`]**: the key/value engine abstraction and built-in engines
//! - **[`collection`]**: named collections and their catalog
//! - **[`transaction`]**: read and write transactions

pub mod codec;
pub mod collection;
pub mod config;
pub mod dictionary;
pub mod encoded_quad;
pub mod engine;
pub mod error;
pub mod index;
pub mod keys;
pub mod model;
pub mod transaction;

pub use collection::{Collection, CollectionManager, CollectionName};
pub use config::{BackendConfig, CleanupPolicy, StoreConfig};
pub use encoded_quad::EncodedQuad;
pub use engine::{ConfiguredEngine, KvEngine, MemoryEngine};
#[cfg(feature = "rocksdb")]
pub use engine::RocksDbEngine;
pub use error::{Result, StoreError};
pub use index::{Permutation, StatementIter};
pub use model::{
    AnonymousEntity, Context, Entity, Iri, Literal, Object, Predicate, QuadPattern, Statement,
    Term,
};
pub use transaction::{ReadTx, TransactionState, WriteTx};

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::info;

/// Quad store over a key/value engine
///
/// Any number of [`ReadTx`] may run concurrently with the single [`WriteTx`].
/// The writer lock belongs to the store value, so independent stores never
/// contend with each other.
pub struct QuadStore<E: KvEngine = MemoryEngine> {
    engine: E,
    writer: Mutex<()>,
    config: StoreConfig,
    closed: AtomicBool,
    next_tx_id: AtomicU64,
}

impl QuadStore<MemoryEngine> {
    /// Volatile store with the default configuration
    pub fn in_memory() -> Self {
        Self::with_engine(MemoryEngine::new(), StoreConfig::memory())
    }

    /// Volatile store with a custom cleanup policy
    pub fn in_memory_with(cleanup: CleanupPolicy) -> Self {
        Self::with_engine(MemoryEngine::new(), StoreConfig::memory().with_cleanup(cleanup))
    }
}

impl QuadStore<ConfiguredEngine> {
    /// Open the store described by a configuration
    pub fn open(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let engine = ConfiguredEngine::open(&config.backend, config.sync_writes)?;
        Ok(Self::with_engine(engine, config))
    }
}

impl<E: KvEngine> QuadStore<E> {
    /// Store over an already opened engine
    pub fn with_engine(engine: E, config: StoreConfig) -> Self {
        info!(engine = engine.name(), cleanup = ?config.cleanup, "opened quad store");
        QuadStore {
            engine,
            writer: Mutex::new(()),
            config,
            closed: AtomicBool::new(false),
            next_tx_id: AtomicU64::new(1),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::StoreClosed);
        }
        Ok(())
    }

    fn next_id(&self) -> u64 {
        self.next_tx_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Begin a read transaction on the latest committed state
    pub fn read(&self) -> Result<ReadTx<'_, E>> {
        self.ensure_open()?;
        Ok(ReadTx::new(self.next_id(), self.engine.snapshot()?))
    }

    /// Begin the write transaction, waiting for the current writer to finish
    pub fn write(&self) -> Result<WriteTx<'_, E>> {
        self.ensure_open()?;
        let guard = self.writer.lock();
        self.ensure_open()?;
        Ok(WriteTx::new(
            self.next_id(),
            self.engine.begin()?,
            guard,
            self.config.cleanup,
        ))
    }

    /// Begin the write transaction unless another writer is active
    pub fn try_write(&self) -> Result<Option<WriteTx<'_, E>>> {
        self.ensure_open()?;
        match self.writer.try_lock() {
            Some(guard) => Ok(Some(WriteTx::new(
                self.next_id(),
                self.engine.begin()?,
                guard,
                self.config.cleanup,
            ))),
            None => Ok(None),
        }
    }

    /// Refuse every new transaction from now on
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!(engine = self.engine.name(), "closed quad store");
        }
    }

    /// Whether [`QuadStore::close`] has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Underlying engine
    pub fn engine(&self) -> &E {
        &self.engine
    }
}
