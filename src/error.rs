//! Error taxonomy for the trie engine.
//!
//! Kept free of `thiserror` on purpose: the teacher crate splits its error
//! handling between `std::error::Error` and a no-op marker trait depending on
//! the `std` feature (see [`crate::rstd`]), and `thiserror` 1.x cannot
//! follow it into `no_std`. `TrieError` mirrors that split directly.

use crate::rstd::fmt;

/// Errors the engine can surface. `NotFound` is a normal, expected outcome
/// of `get`/`delete`/`find_path` on an absent key. `Decode` and `StoreMiss`
/// indicate the backing store or its contents are not what the engine
/// requires and are treated as fatal by callers.
#[derive(Debug)]
pub enum TrieError {
    /// `get`/`delete` found no value for the key, or `find_path` ran out of
    /// matching structure before exhausting the key's nibbles.
    NotFound,
    /// A node retrieved from the store (or an inline reference) did not
    /// decode to a valid Leaf/Extension/Branch RLP shape.
    Decode(rlp::DecoderError),
    /// A hash reference resolved to nothing in the store.
    StoreMiss,
}

impl fmt::Display for TrieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrieError::NotFound => write!(f, "key not found in trie"),
            TrieError::Decode(e) => write!(f, "malformed node encoding: {:?}", e),
            TrieError::StoreMiss => write!(f, "store has no entry for referenced hash"),
        }
    }
}

impl From<rlp::DecoderError> for TrieError {
    fn from(e: rlp::DecoderError) -> Self {
        TrieError::Decode(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TrieError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrieError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(not(feature = "std"))]
impl crate::rstd::Error for TrieError {}
