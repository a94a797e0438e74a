//! # Term Dictionary
//!
//! Bidirectional mapping between canonical term bytes and dense integer ids.
//!
//! Each collection keeps two dictionaries: one for nodes (IRIs and anonymous
//! entities, which also covers predicates and named contexts) and one for
//! literals. Both allocate from the same per-collection counter, so an id
//! identifies its dictionary unambiguously. Ids start at `1`; `0` stands for
//! the default context and is never allocated.
//!
//! Forward (`bytes -> id`) and reverse (`id -> bytes`) entries are always
//! written and removed together.

use crate::codec;
use crate::engine::{KvRead, KvWrite};
use crate::error::{Result, StoreError};
use crate::keys::{bump_counter, decode_u64, CollectionKeys, Table};
use crate::model::{Context, Entity, Object, Predicate};
use tracing::trace;

/// Dense term identifier
pub type TermId = i64;

/// Id of the default context
pub const DEFAULT_CONTEXT_ID: TermId = 0;

/// Which dictionary a term lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DictionaryKind {
    /// IRIs and anonymous entities
    Node,
    /// Literals
    Literal,
}

impl DictionaryKind {
    fn forward_table(self) -> Table {
        match self {
            DictionaryKind::Node => Table::NodeToId,
            DictionaryKind::Literal => Table::LiteralToId,
        }
    }

    fn reverse_table(self) -> Table {
        match self {
            DictionaryKind::Node => Table::IdToNode,
            DictionaryKind::Literal => Table::IdToLiteral,
        }
    }

    /// Dictionary holding a given object
    pub fn of_object(object: &Object) -> Self {
        match object {
            Object::Entity(_) => DictionaryKind::Node,
            Object::Literal(_) => DictionaryKind::Literal,
        }
    }
}

/// Term dictionary of one collection
#[derive(Debug, Clone, Copy)]
pub struct TermDictionary {
    keys: CollectionKeys,
}

impl TermDictionary {
    /// Dictionary over a collection's key layout
    pub fn new(keys: CollectionKeys) -> Self {
        TermDictionary { keys }
    }

    /// Id of an encoded term, without side effects
    pub fn lookup<R: KvRead + ?Sized>(
        &self,
        kv: &R,
        kind: DictionaryKind,
        encoded: &[u8],
    ) -> Result<Option<TermId>> {
        match kv.get(&self.keys.forward(kind.forward_table(), encoded))? {
            Some(bytes) => Ok(Some(decode_u64(&bytes)? as TermId)),
            None => Ok(None),
        }
    }

    /// Id of an encoded term, allocating one if the term is new
    pub fn get_or_create<W: KvWrite + ?Sized>(
        &self,
        kv: &mut W,
        kind: DictionaryKind,
        encoded: &[u8],
    ) -> Result<TermId> {
        if let Some(id) = self.lookup(&*kv, kind, encoded)? {
            return Ok(id);
        }
        let id = bump_counter(kv, &self.keys.counter(Table::DictionaryCounter))? as TermId;
        kv.put(
            &self.keys.forward(kind.forward_table(), encoded),
            &(id as u64).to_be_bytes(),
        )?;
        kv.put(&self.keys.reverse(kind.reverse_table(), id), encoded)?;
        trace!(id, ?kind, "interned term");
        Ok(id)
    }

    /// Encoded term for an id, or `None` when the id has no entry
    pub fn try_resolve<R: KvRead + ?Sized>(
        &self,
        kv: &R,
        kind: DictionaryKind,
        id: TermId,
    ) -> Result<Option<Vec<u8>>> {
        kv.get(&self.keys.reverse(kind.reverse_table(), id))
    }

    /// Encoded term for an id; a missing entry is a dangling reference
    pub fn resolve<R: KvRead + ?Sized>(
        &self,
        kv: &R,
        kind: DictionaryKind,
        id: TermId,
    ) -> Result<Vec<u8>> {
        self.try_resolve(kv, kind, id)?
            .ok_or(StoreError::DanglingReference(id as u64))
    }

    /// Remove both entries of an id; absent ids are ignored
    pub fn release<W: KvWrite + ?Sized>(
        &self,
        kv: &mut W,
        kind: DictionaryKind,
        id: TermId,
    ) -> Result<()> {
        let reverse_key = self.keys.reverse(kind.reverse_table(), id);
        if let Some(encoded) = kv.get(&reverse_key)? {
            kv.delete(&self.keys.forward(kind.forward_table(), &encoded))?;
            kv.delete(&reverse_key)?;
            trace!(id, ?kind, "released term");
        }
        Ok(())
    }

    /// Every id currently held by one dictionary
    pub fn ids<R: KvRead + ?Sized>(&self, kv: &R, kind: DictionaryKind) -> Result<Vec<TermId>> {
        let table = self.keys.table(kind.reverse_table());
        kv.scan_prefix(&table)
            .map(|entry| {
                let (key, _) = entry?;
                let mut id = [0u8; 8];
                let suffix = key
                    .get(table.len()..)
                    .filter(|suffix| suffix.len() == 8)
                    .ok_or_else(|| StoreError::InvalidKey("malformed reverse entry".to_string()))?;
                id.copy_from_slice(suffix);
                Ok(crate::encoded_quad::decode_id(id))
            })
            .collect()
    }

    /// Id of an entity, if interned
    pub fn lookup_entity<R: KvRead + ?Sized>(&self, kv: &R, entity: &Entity) -> Result<Option<TermId>> {
        self.lookup(kv, DictionaryKind::Node, &codec::encode_entity(entity))
    }

    /// Id of a predicate, if interned
    pub fn lookup_predicate<R: KvRead + ?Sized>(
        &self,
        kv: &R,
        predicate: &Predicate,
    ) -> Result<Option<TermId>> {
        self.lookup(kv, DictionaryKind::Node, &codec::encode_predicate(predicate))
    }

    /// Id of an object, if interned
    pub fn lookup_object<R: KvRead + ?Sized>(&self, kv: &R, object: &Object) -> Result<Option<TermId>> {
        self.lookup(kv, DictionaryKind::of_object(object), &codec::encode_object(object))
    }

    /// Id of a context, if interned; the default context is always `0`
    pub fn lookup_context<R: KvRead + ?Sized>(
        &self,
        kv: &R,
        context: &Context,
    ) -> Result<Option<TermId>> {
        match context {
            Context::Default => Ok(Some(DEFAULT_CONTEXT_ID)),
            Context::Named(entity) => self.lookup_entity(kv, entity),
        }
    }

    /// Intern an entity
    pub fn entity_id<W: KvWrite + ?Sized>(&self, kv: &mut W, entity: &Entity) -> Result<TermId> {
        self.get_or_create(kv, DictionaryKind::Node, &codec::encode_entity(entity))
    }

    /// Intern a predicate
    pub fn predicate_id<W: KvWrite + ?Sized>(
        &self,
        kv: &mut W,
        predicate: &Predicate,
    ) -> Result<TermId> {
        self.get_or_create(kv, DictionaryKind::Node, &codec::encode_predicate(predicate))
    }

    /// Intern an object in the dictionary matching its kind
    pub fn object_id<W: KvWrite + ?Sized>(&self, kv: &mut W, object: &Object) -> Result<TermId> {
        self.get_or_create(kv, DictionaryKind::of_object(object), &codec::encode_object(object))
    }

    /// Intern a context; the default context is not stored
    pub fn context_id<W: KvWrite + ?Sized>(&self, kv: &mut W, context: &Context) -> Result<TermId> {
        match context {
            Context::Default => Ok(DEFAULT_CONTEXT_ID),
            Context::Named(entity) => self.entity_id(kv, entity),
        }
    }

    /// Entity for a node id
    pub fn resolve_entity<R: KvRead + ?Sized>(&self, kv: &R, id: TermId) -> Result<Entity> {
        codec::decode_entity(&self.resolve(kv, DictionaryKind::Node, id)?)
    }

    /// Predicate for a node id
    pub fn resolve_predicate<R: KvRead + ?Sized>(&self, kv: &R, id: TermId) -> Result<Predicate> {
        codec::decode_predicate(&self.resolve(kv, DictionaryKind::Node, id)?)
    }

    /// Object for an id from either dictionary
    pub fn resolve_object<R: KvRead + ?Sized>(&self, kv: &R, id: TermId) -> Result<Object> {
        if let Some(encoded) = self.try_resolve(kv, DictionaryKind::Node, id)? {
            return codec::decode_object_entity(&encoded);
        }
        match self.try_resolve(kv, DictionaryKind::Literal, id)? {
            Some(encoded) => codec::decode_object_literal(&encoded),
            None => Err(StoreError::DanglingReference(id as u64)),
        }
    }

    /// Context for an id; `0` is the default context
    pub fn resolve_context<R: KvRead + ?Sized>(&self, kv: &R, id: TermId) -> Result<Context> {
        if id == DEFAULT_CONTEXT_ID {
            return Ok(Context::Default);
        }
        self.resolve_entity(kv, id).map(Context::Named)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{KvEngine, MemoryEngine};
    use crate::model::{Iri, Literal};

    fn dictionary() -> TermDictionary {
        TermDictionary::new(CollectionKeys::new(1))
    }

    #[test]
    fn test_get_or_create_is_stable() -> Result<()> {
        let engine = MemoryEngine::new();
        let mut tx = engine.begin()?;
        let dict = dictionary();

        let term = b"<http://example.org/resource>";
        let id = dict.get_or_create(&mut tx, DictionaryKind::Node, term)?;
        assert_eq!(dict.get_or_create(&mut tx, DictionaryKind::Node, term)?, id);
        assert_eq!(dict.lookup(&tx, DictionaryKind::Node, term)?, Some(id));
        assert_eq!(dict.resolve(&tx, DictionaryKind::Node, id)?, term.to_vec());
        Ok(())
    }

    #[test]
    fn test_ids_are_dense_and_shared_across_kinds() -> Result<()> {
        let engine = MemoryEngine::new();
        let mut tx = engine.begin()?;
        let dict = dictionary();

        let a = dict.get_or_create(&mut tx, DictionaryKind::Node, b"<http://a>")?;
        let b = dict.get_or_create(&mut tx, DictionaryKind::Literal, b"\"b\"")?;
        let c = dict.get_or_create(&mut tx, DictionaryKind::Node, b"<http://c>")?;
        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(dict.lookup(&tx, DictionaryKind::Node, b"\"b\"")?, None);
        Ok(())
    }

    #[test]
    fn test_lookup_has_no_side_effects() -> Result<()> {
        let engine = MemoryEngine::new();
        let tx = engine.begin()?;
        let dict = dictionary();
        assert_eq!(dict.lookup(&tx, DictionaryKind::Literal, b"\"x\"")?, None);
        assert!(dict.ids(&tx, DictionaryKind::Literal)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_resolve_missing_is_dangling() -> Result<()> {
        let engine = MemoryEngine::new();
        let snapshot = engine.snapshot()?;
        let dict = dictionary();
        assert!(matches!(
            dict.resolve(&snapshot, DictionaryKind::Node, 42),
            Err(StoreError::DanglingReference(42))
        ));
        assert!(matches!(
            dict.resolve_object(&snapshot, 42),
            Err(StoreError::DanglingReference(42))
        ));
        Ok(())
    }

    #[test]
    fn test_release_removes_both_entries() -> Result<()> {
        let engine = MemoryEngine::new();
        let mut tx = engine.begin()?;
        let dict = dictionary();

        let id = dict.get_or_create(&mut tx, DictionaryKind::Literal, b"\"gone\"")?;
        dict.release(&mut tx, DictionaryKind::Literal, id)?;
        assert_eq!(dict.lookup(&tx, DictionaryKind::Literal, b"\"gone\"")?, None);
        assert_eq!(dict.try_resolve(&tx, DictionaryKind::Literal, id)?, None);
        dict.release(&mut tx, DictionaryKind::Literal, id)?;
        Ok(())
    }

    #[test]
    fn test_typed_round_trip() -> Result<()> {
        let engine = MemoryEngine::new();
        let mut tx = engine.begin()?;
        let dict = dictionary();

        let entity = Entity::iri("http://x/7")?;
        let predicate = Predicate::iri("http://x/name")?;
        let literal = Object::Literal(Literal::lang("Alex", "en")?);
        let graph = Context::named(Iri::new("http://g")?);

        let entity_id = dict.entity_id(&mut tx, &entity)?;
        let predicate_id = dict.predicate_id(&mut tx, &predicate)?;
        let literal_id = dict.object_id(&mut tx, &literal)?;
        let graph_id = dict.context_id(&mut tx, &graph)?;

        assert_eq!(dict.context_id(&mut tx, &Context::Default)?, DEFAULT_CONTEXT_ID);
        assert_eq!(dict.resolve_entity(&tx, entity_id)?, entity);
        assert_eq!(dict.resolve_predicate(&tx, predicate_id)?, predicate);
        assert_eq!(dict.resolve_object(&tx, literal_id)?, literal);
        assert_eq!(
            dict.resolve_object(&tx, entity_id)?,
            Object::Entity(entity.clone())
        );
        assert_eq!(dict.resolve_context(&tx, graph_id)?, graph);
        assert_eq!(dict.resolve_context(&tx, 0)?, Context::Default);
        assert_eq!(dict.ids(&tx, DictionaryKind::Node)?.len(), 3);
        Ok(())
    }
}
