#![cfg_attr(not(feature = "std"), no_std)]

//! An Ethereum-style Merkle Patricia Trie: a radix-16, nibble-indexed
//! authenticated key-value structure over an external byte store, with
//! RLP-encoded nodes content-addressed by Keccak-256.
//!
//! See [`Trie`] for the public entry point.

pub mod error;
pub mod hasher;
pub mod nibble;
pub mod node;
pub mod store;
pub mod trie;

#[cfg(feature = "std")]
mod rstd {
    pub use core::fmt;
    pub use std::error::Error;
    pub use std::{collections, vec};
}

#[cfg(not(feature = "std"))]
mod rstd {
    extern crate alloc;
    pub use alloc::{collections, vec};
    pub use core::fmt;

    /// Marker trait standing in for `std::error::Error` where the real
    /// trait (which depends on `std::fmt::{Debug, Display}` plus the
    /// unstable `Provider` API surface) isn't available.
    pub trait Error: fmt::Debug + fmt::Display {}
}

pub use error::TrieError;
pub use nibble::NibblePath;
pub use node::Node;
pub use store::{MemoryNodeStore, NodeStore};
pub use trie::{Trie, EMPTY_ROOT_HASH};
