//! The external byte-addressable store the trie is built on top of.
//!
//! Kept intentionally minimal per spec: a setter (idempotent insert) and a
//! getter (must return the exact previously-stored bytes, or signal
//! absence) — no iteration, no delete, no size primitive. Persistence,
//! sharding, caching and transactional behavior are the caller's concern.

use crate::rstd::collections::BTreeMap;
use crate::rstd::vec::Vec;

/// A mapping from 32-byte Keccak digests to the RLP-encoded node bytes
/// stored under them.
pub trait NodeStore {
    /// Returns the exact bytes previously inserted under `hash`, or `None`
    /// if nothing has been stored there.
    fn get(&self, hash: &[u8; 32]) -> Option<Vec<u8>>;

    /// Idempotently records `data` under `hash`. Callers may insert the same
    /// hash more than once; the trie never compares or asserts against
    /// prior content at a given key.
    fn insert(&mut self, hash: [u8; 32], data: Vec<u8>);
}

/// A simple in-memory [`NodeStore`] backed by a `BTreeMap`, suitable for
/// tests and for embedding the trie without a real persistence layer. Uses
/// `BTreeMap` rather than a hash map so the crate doesn't need to pull in a
/// hasher to stay `no_std`-friendly.
#[derive(Debug, Default, Clone)]
pub struct MemoryNodeStore {
    nodes: BTreeMap<[u8; 32], Vec<u8>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl NodeStore for MemoryNodeStore {
    fn get(&self, hash: &[u8; 32]) -> Option<Vec<u8>> {
        self.nodes.get(hash).cloned()
    }

    fn insert(&mut self, hash: [u8; 32], data: Vec<u8>) {
        self.nodes.insert(hash, data);
    }
}
