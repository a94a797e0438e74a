//! # Collection Manager
//!
//! A collection is a named, independent quad store within one engine. Its
//! catalog marker maps the name to a numeric id that prefixes every key the
//! collection owns, so deleting a collection is one prefix deletion.
//! Collection ids come from a global counter and are never reused.

use crate::engine::{KvRead, KvWrite};
use crate::error::{Result, StoreError};
use crate::index::PermutationIndexSet;
use crate::keys::{
    bump_counter, catalog_key, catalog_prefix, collection_counter_key, decode_u64,
    name_from_catalog_key, read_counter, CollectionKeys, Table,
};
use crate::model::AnonymousEntity;
use std::fmt::{self, Display};
use tracing::{debug, info};

/// Validated collection name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionName(String);

impl CollectionName {
    /// Create a collection name; names must be non-empty
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(StoreError::InvalidCollectionName(
                "collection name must not be empty".to_string(),
            ));
        }
        Ok(CollectionName(name))
    }

    /// The name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for CollectionName {
    type Error = StoreError;

    fn try_from(name: &str) -> Result<Self> {
        CollectionName::new(name)
    }
}

impl TryFrom<String> for CollectionName {
    type Error = StoreError;

    fn try_from(name: String) -> Result<Self> {
        CollectionName::new(name)
    }
}

/// An existing collection, resolved from the catalog
#[derive(Debug, Clone)]
pub struct Collection {
    name: CollectionName,
    id: u64,
    index: PermutationIndexSet,
}

impl Collection {
    fn new(name: CollectionName, id: u64) -> Self {
        Collection {
            name,
            id,
            index: PermutationIndexSet::new(CollectionKeys::new(id)),
        }
    }

    /// Collection name
    pub fn name(&self) -> &CollectionName {
        &self.name
    }

    /// Catalog id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Key layout of the collection
    pub fn keys(&self) -> CollectionKeys {
        CollectionKeys::new(self.id)
    }

    /// The collection's indexes
    pub fn index(&self) -> &PermutationIndexSet {
        &self.index
    }

    /// Highest anonymous entity id issued so far
    pub fn max_entity<R: KvRead + ?Sized>(&self, kv: &R) -> Result<u64> {
        read_counter(kv, &self.keys().counter(Table::EntityCounter))
    }

    /// Issue a fresh anonymous entity
    pub fn new_entity<W: KvWrite + ?Sized>(&self, kv: &mut W) -> Result<AnonymousEntity> {
        let id = bump_counter(kv, &self.keys().counter(Table::EntityCounter))?;
        debug!(collection = %self.name, id, "issued anonymous entity");
        Ok(AnonymousEntity::new(id))
    }
}

/// Stateless access to the collection catalog
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionManager;

impl CollectionManager {
    /// Find a collection by name
    pub fn lookup<R: KvRead + ?Sized>(
        &self,
        kv: &R,
        name: &CollectionName,
    ) -> Result<Option<Collection>> {
        match kv.get(&catalog_key(name.as_str()))? {
            Some(bytes) => Ok(Some(Collection::new(name.clone(), decode_u64(&bytes)?))),
            None => Ok(None),
        }
    }

    /// Find a collection by name, failing when it does not exist
    pub fn require<R: KvRead + ?Sized>(&self, kv: &R, name: &CollectionName) -> Result<Collection> {
        self.lookup(kv, name)?
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    /// Whether a collection exists
    pub fn exists<R: KvRead + ?Sized>(&self, kv: &R, name: &CollectionName) -> Result<bool> {
        kv.contains_key(&catalog_key(name.as_str()))
    }

    /// Open a collection, creating it if needed
    pub fn open<W: KvWrite + ?Sized>(&self, kv: &mut W, name: &CollectionName) -> Result<Collection> {
        if let Some(collection) = self.lookup(&*kv, name)? {
            return Ok(collection);
        }
        let id = bump_counter(kv, &collection_counter_key())?;
        let keys = CollectionKeys::new(id);
        kv.put(&catalog_key(name.as_str()), &id.to_be_bytes())?;
        kv.put(&keys.counter(Table::DictionaryCounter), &0u64.to_be_bytes())?;
        kv.put(&keys.counter(Table::EntityCounter), &0u64.to_be_bytes())?;
        info!(collection = %name, id, "created collection");
        Ok(Collection::new(name.clone(), id))
    }

    /// Delete a collection and everything in it; returns `false` if it did not exist
    pub fn delete<W: KvWrite + ?Sized>(&self, kv: &mut W, name: &CollectionName) -> Result<bool> {
        let collection = match self.lookup(&*kv, name)? {
            Some(collection) => collection,
            None => return Ok(false),
        };
        kv.delete(&catalog_key(name.as_str()))?;
        let removed = kv.delete_prefix(collection.keys().prefix())?;
        info!(collection = %name, id = collection.id(), removed, "deleted collection");
        Ok(true)
    }

    /// Names of every collection, in byte order
    pub fn list<R: KvRead + ?Sized>(&self, kv: &R) -> Result<Vec<CollectionName>> {
        kv.scan_prefix(&catalog_prefix())
            .map(|entry| {
                let (key, _) = entry?;
                CollectionName::new(name_from_catalog_key(&key)?)
            })
            .collect()
    }
}
