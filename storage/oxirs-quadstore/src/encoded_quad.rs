//! Fixed-width, order-preserving quad keys
//!
//! An [`EncodedQuad`] is a permutation tag followed by four ids. Each field is
//! written big-endian with its sign bit flipped, so comparing the 36-byte keys
//! lexicographically gives the same result as comparing the tuples field by
//! field, negative values included.

use crate::error::{Result, StoreError};
use std::cmp::Ordering;

/// Size of the encoded tag in bytes
pub const TAG_SIZE: usize = 4;

/// Size of one encoded id in bytes
pub const ID_SIZE: usize = 8;

/// Size of an encoded quad in bytes
pub const ENCODED_QUAD_SIZE: usize = TAG_SIZE + 4 * ID_SIZE;

/// A permutation-tagged quad of integer ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodedQuad {
    /// Permutation tag
    pub tag: i32,
    /// First id in permutation order
    pub first: i64,
    /// Second id in permutation order
    pub second: i64,
    /// Third id in permutation order
    pub third: i64,
    /// Fourth id in permutation order
    pub fourth: i64,
}

impl EncodedQuad {
    /// Create a new encoded quad
    pub const fn new(tag: i32, first: i64, second: i64, third: i64, fourth: i64) -> Self {
        EncodedQuad {
            tag,
            first,
            second,
            third,
            fourth,
        }
    }

    /// The four ids in permutation order
    pub const fn ids(&self) -> [i64; 4] {
        [self.first, self.second, self.third, self.fourth]
    }

    /// Serialize into the order-preserving byte form
    pub fn to_bytes(&self) -> [u8; ENCODED_QUAD_SIZE] {
        let mut buffer = [0u8; ENCODED_QUAD_SIZE];
        buffer[..TAG_SIZE].copy_from_slice(&encode_tag(self.tag));
        for (i, id) in self.ids().into_iter().enumerate() {
            let start = TAG_SIZE + i * ID_SIZE;
            buffer[start..start + ID_SIZE].copy_from_slice(&encode_id(id));
        }
        buffer
    }

    /// Parse the byte form produced by [`EncodedQuad::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ENCODED_QUAD_SIZE {
            return Err(StoreError::InvalidKey(format!(
                "encoded quad must be {ENCODED_QUAD_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&bytes[..TAG_SIZE]);
        let id_at = |i: usize| {
            let start = TAG_SIZE + i * ID_SIZE;
            let mut id = [0u8; ID_SIZE];
            id.copy_from_slice(&bytes[start..start + ID_SIZE]);
            decode_id(id)
        };
        Ok(EncodedQuad {
            tag: decode_tag(tag),
            first: id_at(0),
            second: id_at(1),
            third: id_at(2),
            fourth: id_at(3),
        })
    }

    /// Byte prefix shared by every quad with `tag` whose leading ids equal `ids`
    pub fn prefix_bytes(tag: i32, ids: &[i64]) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(TAG_SIZE + ids.len() * ID_SIZE);
        prefix.extend_from_slice(&encode_tag(tag));
        for id in ids {
            prefix.extend_from_slice(&encode_id(*id));
        }
        prefix
    }
}

impl Ord for EncodedQuad {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tag
            .cmp(&other.tag)
            .then_with(|| self.ids().cmp(&other.ids()))
    }
}

impl PartialOrd for EncodedQuad {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Order-preserving encoding of a signed tag
pub fn encode_tag(tag: i32) -> [u8; TAG_SIZE] {
    ((tag as u32) ^ (1 << 31)).to_be_bytes()
}

/// Inverse of [`encode_tag`]
pub fn decode_tag(bytes: [u8; TAG_SIZE]) -> i32 {
    (u32::from_be_bytes(bytes) ^ (1 << 31)) as i32
}

/// Order-preserving encoding of a signed id
pub fn encode_id(id: i64) -> [u8; ID_SIZE] {
    ((id as u64) ^ (1 << 63)).to_be_bytes()
}

/// Inverse of [`encode_id`]
pub fn decode_id(bytes: [u8; ID_SIZE]) -> i64 {
    (u64::from_be_bytes(bytes) ^ (1 << 63)) as i64
}
