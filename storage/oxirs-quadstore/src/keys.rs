//! Physical key layout
//!
//! The engine holds one ordered keyspace split into two namespaces:
//!
//! ```text
//! 0x00 'c' <name>                          catalog marker   -> collection id
//! 0x00 'n'                                 collection id counter
//! 0x01 <collection id:8> <table tag:4> ... per-collection tables
//! ```
//!
//! Inside a collection every table starts with an order-preserving `i32`
//! tag, the same encoding the permutation indexes use for their
//! [`EncodedQuad`] keys, so an index entry is simply the collection prefix
//! followed by the 36 quad bytes.

use crate::encoded_quad::{encode_id, encode_tag, EncodedQuad, ENCODED_QUAD_SIZE};
use crate::engine::{KvRead, KvWrite};
use crate::error::{Result, StoreError};

/// Namespace of the collection catalog
pub const CATALOG_NS: u8 = 0x00;

/// Namespace of per-collection data
pub const DATA_NS: u8 = 0x01;

const CATALOG_MARKER: u8 = b'c';
const COLLECTION_COUNTER: u8 = b'n';

/// Length of a collection's data prefix
pub const COLLECTION_PREFIX_SIZE: usize = 1 + 8;

/// Per-collection tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Table {
    /// Dictionary id counter, shared by both dictionaries
    DictionaryCounter = 0,
    /// Anonymous entity counter
    EntityCounter = 1,
    /// Node term bytes -> id
    NodeToId = 2,
    /// Node id -> term bytes
    IdToNode = 3,
    /// Literal term bytes -> id
    LiteralToId = 4,
    /// Literal id -> term bytes
    IdToLiteral = 5,
    /// Subject, predicate, object, context
    Spoc = 6,
    /// Subject, object, predicate, context
    Sopc = 7,
    /// Predicate, subject, object, context
    Psoc = 8,
    /// Predicate, object, subject, context
    Posc = 9,
    /// Object, subject, predicate, context
    Ospc = 10,
    /// Object, predicate, subject, context
    Opsc = 11,
    /// Context, subject, predicate, object
    Cspo = 12,
}

impl Table {
    /// The table's tag
    pub const fn tag(self) -> i32 {
        self as i32
    }
}

/// Key of the catalog marker for a collection name
pub fn catalog_key(name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + name.len());
    key.push(CATALOG_NS);
    key.push(CATALOG_MARKER);
    key.extend_from_slice(name.as_bytes());
    key
}

/// Prefix shared by every catalog marker
pub fn catalog_prefix() -> [u8; 2] {
    [CATALOG_NS, CATALOG_MARKER]
}

/// Strip the catalog prefix from a marker key, yielding the collection name
pub fn name_from_catalog_key(key: &[u8]) -> Result<String> {
    let name = key
        .strip_prefix(&catalog_prefix())
        .ok_or_else(|| StoreError::InvalidKey("not a catalog key".to_string()))?;
    String::from_utf8(name.to_vec())
        .map_err(|_| StoreError::InvalidKey("collection name is not UTF-8".to_string()))
}

/// Key of the global collection id counter
pub fn collection_counter_key() -> [u8; 2] {
    [CATALOG_NS, COLLECTION_COUNTER]
}

/// Key builder for one collection's tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionKeys {
    prefix: [u8; COLLECTION_PREFIX_SIZE],
}

impl CollectionKeys {
    /// Keys for the collection with the given id
    pub fn new(collection_id: u64) -> Self {
        let mut prefix = [0u8; COLLECTION_PREFIX_SIZE];
        prefix[0] = DATA_NS;
        prefix[1..].copy_from_slice(&collection_id.to_be_bytes());
        CollectionKeys { prefix }
    }

    /// Prefix covering every key of the collection
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Prefix covering one table
    pub fn table(&self, table: Table) -> Vec<u8> {
        let mut key = Vec::with_capacity(COLLECTION_PREFIX_SIZE + 4);
        key.extend_from_slice(&self.prefix);
        key.extend_from_slice(&encode_tag(table.tag()));
        key
    }

    /// Key of a counter record
    pub fn counter(&self, table: Table) -> Vec<u8> {
        self.table(table)
    }

    /// Key of a forward dictionary entry
    pub fn forward(&self, table: Table, encoded_term: &[u8]) -> Vec<u8> {
        let mut key = self.table(table);
        key.extend_from_slice(encoded_term);
        key
    }

    /// Key of a reverse dictionary entry
    pub fn reverse(&self, table: Table, id: i64) -> Vec<u8> {
        let mut key = self.table(table);
        key.extend_from_slice(&encode_id(id));
        key
    }

    /// Key of an index entry
    pub fn index_entry(&self, quad: &EncodedQuad) -> Vec<u8> {
        let mut key = Vec::with_capacity(COLLECTION_PREFIX_SIZE + ENCODED_QUAD_SIZE);
        key.extend_from_slice(&self.prefix);
        key.extend_from_slice(&quad.to_bytes());
        key
    }

    /// Prefix of the index entries with `tag` whose leading ids equal `ids`
    pub fn index_prefix(&self, tag: i32, ids: &[i64]) -> Vec<u8> {
        let mut key = self.prefix.to_vec();
        key.extend_from_slice(&EncodedQuad::prefix_bytes(tag, ids));
        key
    }

    /// Parse the quad out of an index entry key
    pub fn decode_index_entry(&self, key: &[u8]) -> Result<EncodedQuad> {
        let quad = key
            .strip_prefix(&self.prefix[..])
            .ok_or_else(|| StoreError::InvalidKey("index key outside collection".to_string()))?;
        EncodedQuad::from_bytes(quad)
    }
}

/// Read a big-endian `u64` value
pub fn decode_u64(bytes: &[u8]) -> Result<u64> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::InvalidKey(format!("expected 8 bytes, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(array))
}

/// Current value of a counter record; absent counters read as zero
pub fn read_counter<R: KvRead + ?Sized>(kv: &R, key: &[u8]) -> Result<u64> {
    match kv.get(key)? {
        Some(bytes) => decode_u64(&bytes),
        None => Ok(0),
    }
}

/// Increment a counter record and return the new value
pub fn bump_counter<W: KvWrite + ?Sized>(kv: &mut W, key: &[u8]) -> Result<u64> {
    let next = read_counter(&*kv, key)?
        .checked_add(1)
        .filter(|next| *next <= i64::MAX as u64)
        .ok_or_else(|| StoreError::Engine("counter exhausted".to_string()))?;
    kv.put(key, &next.to_be_bytes())?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_key_round_trip() -> Result<()> {
        let key = catalog_key("people");
        assert!(key.starts_with(&catalog_prefix()));
        assert_eq!(name_from_catalog_key(&key)?, "people");
        assert!(name_from_catalog_key(&collection_counter_key()).is_err());
        Ok(())
    }

    #[test]
    fn test_collections_do_not_share_prefixes() {
        let a = CollectionKeys::new(1);
        let b = CollectionKeys::new(256);
        assert!(!a.table(Table::Spoc).starts_with(b.prefix()));
        assert!(!b.table(Table::Spoc).starts_with(a.prefix()));
    }

    #[test]
    fn test_index_entry_round_trip() -> Result<()> {
        let keys = CollectionKeys::new(9);
        let quad = EncodedQuad::new(Table::Posc.tag(), 4, 5, 6, 0);
        let key = keys.index_entry(&quad);
        assert!(key.starts_with(&keys.index_prefix(Table::Posc.tag(), &[4, 5])));
        assert_eq!(keys.decode_index_entry(&key)?, quad);
        assert!(CollectionKeys::new(10).decode_index_entry(&key).is_err());
        Ok(())
    }

    #[test]
    fn test_tables_are_disjoint() {
        let keys = CollectionKeys::new(3);
        let forward = keys.forward(Table::NodeToId, b"<http://a>");
        assert!(forward.starts_with(&keys.table(Table::NodeToId)));
        assert!(!forward.starts_with(&keys.table(Table::LiteralToId)));
        let reverse = keys.reverse(Table::IdToNode, 1);
        assert!(reverse.starts_with(&keys.table(Table::IdToNode)));
    }
}
