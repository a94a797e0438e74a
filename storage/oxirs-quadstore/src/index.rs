//! # Permutation Indexes
//!
//! Every statement is written to seven permutation indexes, one per useful
//! ordering of its `(subject, predicate, object, context)` ids. A pattern
//! query picks the permutation whose leading positions are covered by the
//! pattern's bound fields, scans that prefix, and filters whatever bound
//! fields the prefix could not cover.
//!
//! The seven indexes always hold exactly the same set of statements. They
//! are written and removed together inside one engine transaction.

use crate::config::CleanupPolicy;
use crate::dictionary::{DictionaryKind, TermDictionary, TermId, DEFAULT_CONTEXT_ID};
use crate::encoded_quad::EncodedQuad;
use crate::engine::{KvIter, KvRead, KvWrite};
use crate::error::{Result, StoreError};
use crate::keys::{read_counter, CollectionKeys, Table};
use crate::model::{Context, Entity, Object, QuadPattern, Statement};
use tracing::trace;

/// Statement ids in `(subject, predicate, object, context)` order
pub type QuadIds = [TermId; 4];

const S: usize = 0;
const P: usize = 1;
const O: usize = 2;
const C: usize = 3;

/// One ordering of the statement positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permutation {
    /// subject, predicate, object, context
    Spoc,
    /// subject, object, predicate, context
    Sopc,
    /// predicate, subject, object, context
    Psoc,
    /// predicate, object, subject, context
    Posc,
    /// object, subject, predicate, context
    Ospc,
    /// object, predicate, subject, context
    Opsc,
    /// context, subject, predicate, object
    Cspo,
}

impl Permutation {
    /// Every permutation, in declaration order
    pub const ALL: [Permutation; 7] = [
        Permutation::Spoc,
        Permutation::Sopc,
        Permutation::Psoc,
        Permutation::Posc,
        Permutation::Ospc,
        Permutation::Opsc,
        Permutation::Cspo,
    ];

    /// Table holding this permutation
    pub const fn table(self) -> Table {
        match self {
            Permutation::Spoc => Table::Spoc,
            Permutation::Sopc => Table::Sopc,
            Permutation::Psoc => Table::Psoc,
            Permutation::Posc => Table::Posc,
            Permutation::Ospc => Table::Ospc,
            Permutation::Opsc => Table::Opsc,
            Permutation::Cspo => Table::Cspo,
        }
    }

    /// Tag stored in the encoded quad
    pub const fn tag(self) -> i32 {
        self.table().tag()
    }

    /// Statement positions in key order
    pub const fn order(self) -> [usize; 4] {
        match self {
            Permutation::Spoc => [S, P, O, C],
            Permutation::Sopc => [S, O, P, C],
            Permutation::Psoc => [P, S, O, C],
            Permutation::Posc => [P, O, S, C],
            Permutation::Ospc => [O, S, P, C],
            Permutation::Opsc => [O, P, S, C],
            Permutation::Cspo => [C, S, P, O],
        }
    }

    /// Permutation stored under a tag
    pub fn from_tag(tag: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|permutation| permutation.tag() == tag)
    }

    /// Reorder statement ids into this permutation's key
    pub fn encode(self, ids: &QuadIds) -> EncodedQuad {
        let [a, b, c, d] = self.order();
        EncodedQuad::new(self.tag(), ids[a], ids[b], ids[c], ids[d])
    }

    /// Restore statement order from a key of this permutation
    pub fn decode(self, quad: &EncodedQuad) -> QuadIds {
        let mut ids = [0; 4];
        for (slot, value) in self.order().into_iter().zip(quad.ids()) {
            ids[slot] = value;
        }
        ids
    }

    /// Number of leading key positions covered by the bound fields
    pub fn bound_prefix_len(self, bound: &[Option<TermId>; 4]) -> usize {
        self.order()
            .into_iter()
            .take_while(|position| bound[*position].is_some())
            .count()
    }

    /// Permutation serving a pattern, with the length of its usable prefix
    ///
    /// The longest covered prefix wins; on a tie a prefix that includes the
    /// context wins, then declaration order.
    pub fn select(bound: &[Option<TermId>; 4]) -> (Permutation, usize) {
        let score = |permutation: Permutation| {
            let len = permutation.bound_prefix_len(bound);
            let covers_context = permutation.order()[..len].contains(&C);
            (len, covers_context)
        };
        let mut best = Permutation::Spoc;
        let mut best_score = score(best);
        for permutation in Self::ALL {
            let candidate = score(permutation);
            if candidate > best_score {
                best = permutation;
                best_score = candidate;
            }
        }
        (best, best_score.0)
    }
}

/// The seven permutation indexes of one collection
#[derive(Debug, Clone, Copy)]
pub struct PermutationIndexSet {
    keys: CollectionKeys,
    dictionary: TermDictionary,
}

impl PermutationIndexSet {
    /// Index set over a collection's key layout
    pub fn new(keys: CollectionKeys) -> Self {
        PermutationIndexSet {
            keys,
            dictionary: TermDictionary::new(keys),
        }
    }

    /// The collection's term dictionary
    pub fn dictionary(&self) -> &TermDictionary {
        &self.dictionary
    }

    /// Check that every anonymous entity in a statement was issued by this collection
    pub fn validate<R: KvRead + ?Sized>(&self, kv: &R, statement: &Statement) -> Result<()> {
        let max = read_counter(kv, &self.keys.counter(Table::EntityCounter))?;
        let check = |entity: &Entity| match entity {
            Entity::Anonymous(anonymous) if anonymous.id() == 0 || anonymous.id() > max => {
                Err(StoreError::InvalidEntityId {
                    id: anonymous.id(),
                    max,
                })
            }
            _ => Ok(()),
        };
        check(&statement.subject)?;
        if let Object::Entity(entity) = &statement.object {
            check(entity)?;
        }
        if let Context::Named(entity) = &statement.context {
            check(entity)?;
        }
        Ok(())
    }

    /// Ids of a statement if every term is already interned
    pub fn lookup_ids<R: KvRead + ?Sized>(
        &self,
        kv: &R,
        statement: &Statement,
    ) -> Result<Option<QuadIds>> {
        let dict = &self.dictionary;
        let ids = (
            dict.lookup_entity(kv, &statement.subject)?,
            dict.lookup_predicate(kv, &statement.predicate)?,
            dict.lookup_object(kv, &statement.object)?,
            dict.lookup_context(kv, &statement.context)?,
        );
        Ok(match ids {
            (Some(s), Some(p), Some(o), Some(c)) => Some([s, p, o, c]),
            _ => None,
        })
    }

    /// Whether a statement is stored
    pub fn contains<R: KvRead + ?Sized>(&self, kv: &R, statement: &Statement) -> Result<bool> {
        match self.lookup_ids(kv, statement)? {
            Some(ids) => self.contains_ids(kv, &ids),
            None => Ok(false),
        }
    }

    fn contains_ids<R: KvRead + ?Sized>(&self, kv: &R, ids: &QuadIds) -> Result<bool> {
        kv.contains_key(&self.keys.index_entry(&Permutation::Spoc.encode(ids)))
    }

    /// Validate and insert a statement; returns `false` if it was already present
    pub fn insert<W: KvWrite + ?Sized>(&self, kv: &mut W, statement: &Statement) -> Result<bool> {
        self.validate(&*kv, statement)?;
        self.insert_validated(kv, statement)
    }

    /// Insert a statement that already passed [`Self::validate`]
    pub fn insert_validated<W: KvWrite + ?Sized>(
        &self,
        kv: &mut W,
        statement: &Statement,
    ) -> Result<bool> {
        if let Some(ids) = self.lookup_ids(&*kv, statement)? {
            if self.contains_ids(&*kv, &ids)? {
                return Ok(false);
            }
        }
        let dict = &self.dictionary;
        let ids = [
            dict.entity_id(kv, &statement.subject)?,
            dict.predicate_id(kv, &statement.predicate)?,
            dict.object_id(kv, &statement.object)?,
            dict.context_id(kv, &statement.context)?,
        ];
        for permutation in Permutation::ALL {
            kv.put(&self.keys.index_entry(&permutation.encode(&ids)), &[])?;
        }
        trace!(?ids, "inserted statement");
        Ok(true)
    }

    /// Remove a statement; returns `false` if it was not present
    pub fn remove<W: KvWrite + ?Sized>(
        &self,
        kv: &mut W,
        statement: &Statement,
        cleanup: CleanupPolicy,
    ) -> Result<bool> {
        let ids = match self.lookup_ids(&*kv, statement)? {
            Some(ids) if self.contains_ids(&*kv, &ids)? => ids,
            _ => return Ok(false),
        };
        for permutation in Permutation::ALL {
            kv.delete(&self.keys.index_entry(&permutation.encode(&ids)))?;
        }
        trace!(?ids, "removed statement");

        if cleanup == CleanupPolicy::Eager {
            let candidates = [
                (ids[S], DictionaryKind::Node),
                (ids[P], DictionaryKind::Node),
                (ids[O], DictionaryKind::of_object(&statement.object)),
                (ids[C], DictionaryKind::Node),
            ];
            for (i, (id, kind)) in candidates.iter().enumerate() {
                let seen = candidates[..i].iter().any(|(other, _)| other == id);
                if *id == DEFAULT_CONTEXT_ID || seen {
                    continue;
                }
                if !self.is_referenced(&*kv, *id)? {
                    self.dictionary.release(kv, *kind, *id)?;
                }
            }
        }
        Ok(true)
    }

    /// Whether any statement mentions an id in any position
    pub fn is_referenced<R: KvRead + ?Sized>(&self, kv: &R, id: TermId) -> Result<bool> {
        for permutation in [
            Permutation::Spoc,
            Permutation::Psoc,
            Permutation::Ospc,
            Permutation::Cspo,
        ] {
            if kv.has_prefix(&self.keys.index_prefix(permutation.tag(), &[id]))? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Release every dictionary entry no statement refers to
    pub fn compact<W: KvWrite + ?Sized>(&self, kv: &mut W) -> Result<usize> {
        let mut released = 0;
        for kind in [DictionaryKind::Node, DictionaryKind::Literal] {
            for id in self.dictionary.ids(&*kv, kind)? {
                if !self.is_referenced(&*kv, id)? {
                    self.dictionary.release(kv, kind, id)?;
                    released += 1;
                }
            }
        }
        Ok(released)
    }

    /// Ids of every statement matching a pattern
    pub fn match_ids<'a, R: KvRead + ?Sized>(
        &self,
        kv: &'a R,
        pattern: &QuadPattern,
    ) -> Result<IdIter<'a>> {
        let dict = &self.dictionary;
        let lookups = [
            pattern.subject.as_ref().map(|s| dict.lookup_entity(kv, s)),
            pattern.predicate.as_ref().map(|p| dict.lookup_predicate(kv, p)),
            pattern.object.as_ref().map(|o| dict.lookup_object(kv, o)),
            pattern.context.as_ref().map(|c| dict.lookup_context(kv, c)),
        ];
        let mut bound = [None; 4];
        for (slot, lookup) in bound.iter_mut().zip(lookups) {
            match lookup.transpose()? {
                Some(Some(id)) => *slot = Some(id),
                // a bound term that was never interned cannot match anything
                Some(None) => return Ok(IdIter::empty()),
                None => {}
            }
        }

        let (permutation, prefix_len) = Permutation::select(&bound);
        let prefix_ids: Vec<TermId> = permutation.order()[..prefix_len]
            .iter()
            .filter_map(|position| bound[*position])
            .collect();
        trace!(?permutation, prefix_len, "scanning permutation");
        let prefix = self.keys.index_prefix(permutation.tag(), &prefix_ids);
        Ok(IdIter {
            inner: Some(kv.scan_prefix(&prefix)),
            keys: self.keys,
            permutation,
            bound,
        })
    }

    /// Every statement matching a pattern
    pub fn match_pattern<'a, R: KvRead + ?Sized>(
        &self,
        kv: &'a R,
        pattern: &QuadPattern,
    ) -> Result<StatementIter<'a, R>> {
        Ok(StatementIter {
            ids: self.match_ids(kv, pattern)?,
            kv,
            dictionary: self.dictionary,
        })
    }

    /// Every stored statement
    pub fn all_statements<'a, R: KvRead + ?Sized>(&self, kv: &'a R) -> Result<StatementIter<'a, R>> {
        self.match_pattern(kv, &QuadPattern::any())
    }

    /// Number of statements matching a pattern
    pub fn count<R: KvRead + ?Sized>(&self, kv: &R, pattern: &QuadPattern) -> Result<usize> {
        self.match_ids(kv, pattern)?
            .try_fold(0, |count, ids| ids.map(|_| count + 1))
    }
}

/// Matching statement ids, in the scanned permutation's key order
pub struct IdIter<'a> {
    inner: Option<KvIter<'a>>,
    keys: CollectionKeys,
    permutation: Permutation,
    bound: [Option<TermId>; 4],
}

impl IdIter<'_> {
    fn empty() -> Self {
        IdIter {
            inner: None,
            keys: CollectionKeys::new(0),
            permutation: Permutation::Spoc,
            bound: [None; 4],
        }
    }
}

impl Iterator for IdIter<'_> {
    type Item = Result<QuadIds>;

    fn next(&mut self) -> Option<Self::Item> {
        let inner = self.inner.as_mut()?;
        for entry in inner.by_ref() {
            let ids = entry
                .and_then(|(key, _)| self.keys.decode_index_entry(&key))
                .map(|quad| self.permutation.decode(&quad));
            match ids {
                Ok(ids) => {
                    let matches = self
                        .bound
                        .iter()
                        .zip(ids)
                        .all(|(bound, id)| bound.map_or(true, |b| b == id));
                    if matches {
                        return Some(Ok(ids));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
        self.inner = None;
        None
    }
}

/// Matching statements resolved back to terms
pub struct StatementIter<'a, R: KvRead + ?Sized> {
    ids: IdIter<'a>,
    kv: &'a R,
    dictionary: TermDictionary,
}

impl<R: KvRead + ?Sized> StatementIter<'_, R> {
    fn resolve(&self, ids: QuadIds) -> Result<Statement> {
        let dict = &self.dictionary;
        Ok(Statement {
            subject: dict.resolve_entity(self.kv, ids[S])?,
            predicate: dict.resolve_predicate(self.kv, ids[P])?,
            object: dict.resolve_object(self.kv, ids[O])?,
            context: dict.resolve_context(self.kv, ids[C])?,
        })
    }
}

impl<R: KvRead + ?Sized> Iterator for StatementIter<'_, R> {
    type Item = Result<Statement>;

    fn next(&mut self) -> Option<Self::Item> {
        let ids = self.ids.next()?;
        Some(ids.and_then(|ids| self.resolve(ids)))
    }
}
