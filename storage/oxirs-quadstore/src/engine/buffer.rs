//! Write buffer layered over a snapshot
//!
//! Pending puts and deletes are kept in an ordered map and merged into reads,
//! so a writer sees its own uncommitted effects while nothing reaches the
//! engine before commit.

use super::{KvIter, KvRead, KvWrite};
use crate::error::Result;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::ops::Bound;

/// Pending effects: `Some(value)` for a put, `None` for a delete
pub type PendingWrites = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// Buffered writes over a base snapshot
pub struct WriteBuffer<S> {
    base: S,
    pending: PendingWrites,
}

impl<S: KvRead> WriteBuffer<S> {
    /// Start an empty buffer over `base`
    pub fn new(base: S) -> Self {
        WriteBuffer {
            base,
            pending: BTreeMap::new(),
        }
    }

    /// Number of buffered effects
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Hand the buffered effects over for commit
    pub fn into_pending(self) -> PendingWrites {
        self.pending
    }
}

impl<S: KvRead> KvRead for WriteBuffer<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.pending.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.base.get(key),
        }
    }

    fn scan_prefix(&self, prefix: &[u8]) -> KvIter<'_> {
        let owned_prefix = prefix.to_vec();
        let pending: Box<dyn Iterator<Item = (&Vec<u8>, &Option<Vec<u8>>)> + '_> = Box::new(
            self.pending
                .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
                .take_while(move |(key, _)| key.starts_with(&owned_prefix)),
        );
        Box::new(MergeIter {
            base: self.base.scan_prefix(prefix).peekable(),
            pending: pending.peekable(),
        })
    }
}

impl<S: KvRead> KvWrite for WriteBuffer<S> {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.pending.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.pending.insert(key.to_vec(), None);
        Ok(())
    }
}

type PendingIter<'a> = Box<dyn Iterator<Item = (&'a Vec<u8>, &'a Option<Vec<u8>>)> + 'a>;

struct MergeIter<'a> {
    base: Peekable<KvIter<'a>>,
    pending: Peekable<PendingIter<'a>>,
}

impl Iterator for MergeIter<'_> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let order = match (self.base.peek(), self.pending.peek()) {
                (None, None) => return None,
                (Some(Err(_)), _) | (Some(Ok(_)), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(Ok((base_key, _))), Some((pending_key, _))) => {
                    base_key.as_slice().cmp(pending_key.as_slice())
                }
            };
            match order {
                Ordering::Less => return self.base.next(),
                Ordering::Equal => {
                    self.base.next();
                }
                Ordering::Greater => {}
            }
            if let Some((key, value)) = self.pending.next() {
                if let Some(value) = value {
                    return Some(Ok((key.clone(), value.clone())));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{KvEngine, KvTransaction, MemoryEngine};

    fn keys(iter: KvIter<'_>) -> Vec<Vec<u8>> {
        iter.map(|entry| entry.unwrap().0).collect()
    }

    #[test]
    fn test_reads_see_pending_writes() -> Result<()> {
        let engine = MemoryEngine::new();
        let mut tx = engine.begin()?;
        tx.put(b"a1", b"x")?;
        tx.put(b"a3", b"x")?;
        tx.commit()?;

        let mut buffer = WriteBuffer::new(engine.snapshot()?);
        buffer.put(b"a2", b"y")?;
        buffer.delete(b"a3")?;
        buffer.put(b"b1", b"z")?;

        assert_eq!(buffer.get(b"a2")?, Some(b"y".to_vec()));
        assert_eq!(buffer.get(b"a3")?, None);
        assert_eq!(buffer.get(b"a1")?, Some(b"x".to_vec()));
        assert_eq!(
            keys(buffer.scan_prefix(b"a")),
            vec![b"a1".to_vec(), b"a2".to_vec()]
        );
        assert_eq!(buffer.pending_len(), 3);
        Ok(())
    }

    #[test]
    fn test_pending_overwrite_shadows_base() -> Result<()> {
        let engine = MemoryEngine::new();
        let mut tx = engine.begin()?;
        tx.put(b"k", b"old")?;
        tx.commit()?;

        let mut buffer = WriteBuffer::new(engine.snapshot()?);
        buffer.put(b"k", b"new")?;
        let entries: Vec<_> = buffer.scan_prefix(b"k").collect::<Result<_>>()?;
        assert_eq!(entries, vec![(b"k".to_vec(), b"new".to_vec())]);
        Ok(())
    }

    #[test]
    fn test_delete_prefix() -> Result<()> {
        let engine = MemoryEngine::new();
        let mut tx = engine.begin()?;
        for key in [&b"p1"[..], b"p2", b"q1"] {
            tx.put(key, b"")?;
        }
        tx.commit()?;

        let mut buffer = WriteBuffer::new(engine.snapshot()?);
        buffer.put(b"p3", b"")?;
        assert_eq!(buffer.delete_prefix(b"p")?, 3);
        assert!(!buffer.has_prefix(b"p")?);
        assert!(buffer.has_prefix(b"q")?);
        Ok(())
    }
}
