//! # Transactions
//!
//! Readers work on an engine snapshot taken when the transaction begins and
//! never block. The single writer holds the store's writer lock for its whole
//! lifetime, buffers its effects in an engine transaction, and sees its own
//! uncommitted writes.
//!
//! A write transaction that fails half way through a multi-key operation is
//! aborted on the spot, so a partially applied statement can never be
//! committed. Dropping an active write transaction aborts it.

use crate::collection::{Collection, CollectionManager, CollectionName};
use crate::config::CleanupPolicy;
use crate::engine::{KvEngine, KvTransaction};
use crate::error::{Result, StoreError};
use crate::index::StatementIter;
use crate::model::{AnonymousEntity, QuadPattern, Statement};
use parking_lot::MutexGuard;
use tracing::{debug, warn};

/// Transaction lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Open for reads and, for a writer, writes
    Active,
    /// Effects published; the transaction is closed
    Committed,
    /// Cancelled, dropped or failed; nothing was published
    Aborted,
}

/// Read-only, snapshot-isolated transaction
pub struct ReadTx<'s, E: KvEngine + 's> {
    id: u64,
    snapshot: Option<E::Snapshot<'s>>,
    state: TransactionState,
    collections: CollectionManager,
}

impl<'s, E: KvEngine + 's> ReadTx<'s, E> {
    pub(crate) fn new(id: u64, snapshot: E::Snapshot<'s>) -> Self {
        debug!(tx = id, "began read transaction");
        ReadTx {
            id,
            snapshot: Some(snapshot),
            state: TransactionState::Active,
            collections: CollectionManager,
        }
    }

    /// Transaction id, unique within the store
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current state
    pub fn state(&self) -> TransactionState {
        self.state
    }

    fn view(&self) -> Result<&E::Snapshot<'s>> {
        match (&self.snapshot, self.state) {
            (Some(snapshot), TransactionState::Active) => Ok(snapshot),
            _ => Err(StoreError::TransactionClosed),
        }
    }

    fn collection(&self, name: &CollectionName) -> Result<Collection> {
        self.collections.require(self.view()?, name)
    }

    /// Statements of a collection matching a pattern
    pub fn match_pattern(
        &self,
        collection: &CollectionName,
        pattern: &QuadPattern,
    ) -> Result<StatementIter<'_, E::Snapshot<'s>>> {
        let collection = self.collection(collection)?;
        collection.index().match_pattern(self.view()?, pattern)
    }

    /// Every statement of a collection
    pub fn all_statements(
        &self,
        collection: &CollectionName,
    ) -> Result<StatementIter<'_, E::Snapshot<'s>>> {
        self.match_pattern(collection, &QuadPattern::any())
    }

    /// Whether a collection holds a statement
    pub fn contains(&self, collection: &CollectionName, statement: &Statement) -> Result<bool> {
        let collection = self.collection(collection)?;
        collection.index().contains(self.view()?, statement)
    }

    /// Number of statements of a collection matching a pattern
    pub fn count(&self, collection: &CollectionName, pattern: &QuadPattern) -> Result<usize> {
        let collection = self.collection(collection)?;
        collection.index().count(self.view()?, pattern)
    }

    /// Names of every collection
    pub fn list_collections(&self) -> Result<Vec<CollectionName>> {
        self.collections.list(self.view()?)
    }

    /// Whether a collection exists
    pub fn collection_exists(&self, name: &CollectionName) -> Result<bool> {
        self.collections.exists(self.view()?, name)
    }

    /// Release the snapshot; cancelling twice is a no-op
    pub fn cancel(&mut self) {
        if self.state == TransactionState::Active {
            self.snapshot = None;
            self.state = TransactionState::Aborted;
            debug!(tx = self.id, "cancelled read transaction");
        }
    }
}

/// The store's single write transaction
pub struct WriteTx<'s, E: KvEngine + 's> {
    id: u64,
    // dropped before the guard, so the engine transaction is gone before the
    // next writer can begin
    txn: Option<E::Transaction<'s>>,
    guard: Option<MutexGuard<'s, ()>>,
    state: TransactionState,
    cleanup: CleanupPolicy,
    collections: CollectionManager,
}

impl<'s, E: KvEngine + 's> WriteTx<'s, E> {
    pub(crate) fn new(
        id: u64,
        txn: E::Transaction<'s>,
        guard: MutexGuard<'s, ()>,
        cleanup: CleanupPolicy,
    ) -> Self {
        debug!(tx = id, "began write transaction");
        WriteTx {
            id,
            txn: Some(txn),
            guard: Some(guard),
            state: TransactionState::Active,
            cleanup,
            collections: CollectionManager,
        }
    }

    /// Transaction id, unique within the store
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current state
    pub fn state(&self) -> TransactionState {
        self.state
    }

    fn view(&self) -> Result<&E::Transaction<'s>> {
        match (&self.txn, self.state) {
            (Some(txn), TransactionState::Active) => Ok(txn),
            _ => Err(StoreError::TransactionClosed),
        }
    }

    /// Run a writing operation, aborting the transaction if it fails
    fn guarded<T>(&mut self, op: impl FnOnce(&mut E::Transaction<'s>) -> Result<T>) -> Result<T> {
        let txn = match (&mut self.txn, self.state) {
            (Some(txn), TransactionState::Active) => txn,
            _ => return Err(StoreError::TransactionClosed),
        };
        match op(txn) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(tx = self.id, error = %e, "write failed, aborting transaction");
                self.abort();
                Err(e)
            }
        }
    }

    fn abort(&mut self) {
        if let Some(txn) = self.txn.take() {
            txn.abort();
        }
        self.guard = None;
        self.state = TransactionState::Aborted;
    }

    fn collection(&self, name: &CollectionName) -> Result<Collection> {
        self.collections.require(self.view()?, name)
    }

    /// Add a statement; returns `false` if it was already present
    pub fn add_statement(&mut self, collection: &CollectionName, statement: &Statement) -> Result<bool> {
        let collection = self.collection(collection)?;
        collection.index().validate(self.view()?, statement)?;
        self.guarded(|txn| collection.index().insert_validated(txn, statement))
    }

    /// Remove a statement; returns `false` if it was not present
    pub fn remove_statement(
        &mut self,
        collection: &CollectionName,
        statement: &Statement,
    ) -> Result<bool> {
        let collection = self.collection(collection)?;
        let cleanup = self.cleanup;
        self.guarded(|txn| collection.index().remove(txn, statement, cleanup))
    }

    /// Add several statements; returns how many were not already present
    ///
    /// Every statement is validated before the first one is written, so an
    /// invalid entity id anywhere in the batch leaves the transaction
    /// untouched and usable.
    pub fn add_statements<'a>(
        &mut self,
        collection: &CollectionName,
        statements: impl IntoIterator<Item = &'a Statement>,
    ) -> Result<usize> {
        let collection = self.collection(collection)?;
        let statements: Vec<&Statement> = statements.into_iter().collect();
        let view = self.view()?;
        for statement in &statements {
            collection.index().validate(view, statement)?;
        }
        let added = self.guarded(|txn| {
            let mut added = 0;
            for statement in &statements {
                if collection.index().insert_validated(txn, statement)? {
                    added += 1;
                }
            }
            Ok(added)
        })?;
        debug!(tx = self.id, collection = %collection.name(), added, "added statement batch");
        Ok(added)
    }

    /// Remove several statements; returns how many were present
    pub fn remove_statements<'a>(
        &mut self,
        collection: &CollectionName,
        statements: impl IntoIterator<Item = &'a Statement>,
    ) -> Result<usize> {
        let collection = self.collection(collection)?;
        let cleanup = self.cleanup;
        let removed = self.guarded(|txn| {
            let mut removed = 0;
            for statement in statements {
                if collection.index().remove(txn, statement, cleanup)? {
                    removed += 1;
                }
            }
            Ok(removed)
        })?;
        debug!(tx = self.id, collection = %collection.name(), removed, "removed statement batch");
        Ok(removed)
    }

    /// Create a collection, or return the existing one
    pub fn create_collection(&mut self, name: &CollectionName) -> Result<Collection> {
        let collections = self.collections;
        self.guarded(|txn| collections.open(txn, name))
    }

    /// Delete a collection; returns `false` if it did not exist
    pub fn delete_collection(&mut self, name: &CollectionName) -> Result<bool> {
        let collections = self.collections;
        self.guarded(|txn| collections.delete(txn, name))
    }

    /// Issue a fresh anonymous entity in a collection
    pub fn new_entity(&mut self, collection: &CollectionName) -> Result<AnonymousEntity> {
        let collection = self.collection(collection)?;
        self.guarded(|txn| collection.new_entity(txn))
    }

    /// Release every term of a collection that no statement refers to
    pub fn compact(&mut self, collection: &CollectionName) -> Result<usize> {
        let collection = self.collection(collection)?;
        let released = self.guarded(|txn| collection.index().compact(txn))?;
        debug!(tx = self.id, collection = %collection.name(), released, "compacted dictionary");
        Ok(released)
    }

    /// Statements matching a pattern, including uncommitted writes
    pub fn match_pattern(
        &self,
        collection: &CollectionName,
        pattern: &QuadPattern,
    ) -> Result<StatementIter<'_, E::Transaction<'s>>> {
        let collection = self.collection(collection)?;
        collection.index().match_pattern(self.view()?, pattern)
    }

    /// Every statement of a collection, including uncommitted writes
    pub fn all_statements(
        &self,
        collection: &CollectionName,
    ) -> Result<StatementIter<'_, E::Transaction<'s>>> {
        self.match_pattern(collection, &QuadPattern::any())
    }

    /// Whether a collection holds a statement
    pub fn contains(&self, collection: &CollectionName, statement: &Statement) -> Result<bool> {
        let collection = self.collection(collection)?;
        collection.index().contains(self.view()?, statement)
    }

    /// Number of statements matching a pattern
    pub fn count(&self, collection: &CollectionName, pattern: &QuadPattern) -> Result<usize> {
        let collection = self.collection(collection)?;
        collection.index().count(self.view()?, pattern)
    }

    /// Names of every collection
    pub fn list_collections(&self) -> Result<Vec<CollectionName>> {
        self.collections.list(self.view()?)
    }

    /// Whether a collection exists
    pub fn collection_exists(&self, name: &CollectionName) -> Result<bool> {
        self.collections.exists(self.view()?, name)
    }

    /// Apply every buffered effect atomically and release the writer lock
    pub fn commit(&mut self) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(StoreError::TransactionClosed);
        }
        let txn = self.txn.take().ok_or(StoreError::TransactionClosed)?;
        let result = txn.commit();
        self.guard = None;
        match &result {
            Ok(()) => {
                self.state = TransactionState::Committed;
                debug!(tx = self.id, "committed write transaction");
            }
            Err(e) => {
                self.state = TransactionState::Aborted;
                warn!(tx = self.id, error = %e, "commit failed");
            }
        }
        result
    }

    /// Discard every buffered effect and release the writer lock; cancelling
    /// twice is a no-op
    pub fn cancel(&mut self) {
        if self.state == TransactionState::Active {
            self.abort();
            debug!(tx = self.id, "cancelled write transaction");
        }
    }
}

impl<'s, E: KvEngine + 's> Drop for WriteTx<'s, E> {
    fn drop(&mut self) {
        if self.state == TransactionState::Active {
            warn!(tx = self.id, "write transaction dropped while active, aborting");
            self.abort();
        }
    }
}
