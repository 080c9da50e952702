//! The three node kinds and their RLP shapes.
//!
//! Encode/decode logic follows the teacher's `node_codec.rs`
//! (`RlpNodeCodec::{leaf_node, extension_node, branch_node}` and
//! `decode_plan`'s list-arity dispatch), generalized from a `trie_db::NodeCodec`
//! implementation to an owned `Node` enum, since the rewriting rules that
//! produce these nodes (component E) are implemented directly in this crate
//! rather than delegated to `trie-db`.

use log::trace;
use rlp::{Prototype, Rlp, RlpStream};

use crate::error::TrieError;
use crate::nibble::NibblePath;
use crate::rstd::vec::Vec;

/// RLP encoding of the empty byte string — the reference for an absent
/// child slot and the encoding whose Keccak digest is the empty-trie root.
pub const EMPTY_NODE: [u8; 1] = [0x80];

/// A decoded trie node. `Branch`'s `children` slots and `value` fields use
/// a zero-length `Vec<u8>` as the "absent" sentinel, matching the
/// Reference model in spec.md §3.4.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf {
        path: NibblePath,
        value: Vec<u8>,
    },
    Extension {
        path: NibblePath,
        child: Vec<u8>,
    },
    Branch {
        children: [Vec<u8>; 16],
        value: Vec<u8>,
    },
}

/// Appends a child reference into a parent RLP list under construction: a
/// 32-byte reference is appended as a byte string; a shorter one is the
/// child's own raw RLP encoding and gets spliced in verbatim so it appears
/// as a nested structure in the parent, not as a byte string around it.
fn append_child_ref(stream: &mut RlpStream, child_ref: &[u8]) {
    if child_ref.is_empty() {
        stream.append_empty_data();
    } else if child_ref.len() == 32 {
        stream.append(&child_ref);
    } else {
        stream.append_raw(child_ref, 1);
    }
}

/// Reads a child reference back out of a decoded parent list item,
/// uniformly as bytes: a byte-string item's payload is either the 32-byte
/// hash or the empty sentinel; a list item is an inline child and its raw
/// encoding (header + payload, always < 32 bytes by construction) *is* the
/// reference.
fn read_child_ref(item: &Rlp) -> Result<Vec<u8>, TrieError> {
    if item.is_list() {
        Ok(item.as_raw().to_vec())
    } else {
        Ok(item.data()?.to_vec())
    }
}

impl Node {
    /// RLP-encodes this node per spec.md §4.3/§6.2.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Node::Leaf { path, value } => {
                trace!("encoding leaf node, path len {}", path.len());
                let mut stream = RlpStream::new_list(2);
                stream.append(&path.encode(true));
                stream.append(value);
                stream.out().to_vec()
            }
            Node::Extension { path, child } => {
                trace!("encoding extension node, path len {}", path.len());
                let mut stream = RlpStream::new_list(2);
                stream.append(&path.encode(false));
                append_child_ref(&mut stream, child);
                stream.out().to_vec()
            }
            Node::Branch { children, value } => {
                trace!("encoding branch node");
                let mut stream = RlpStream::new_list(17);
                for child in children {
                    append_child_ref(&mut stream, child);
                }
                if value.is_empty() {
                    stream.append_empty_data();
                } else {
                    stream.append(value);
                }
                stream.out().to_vec()
            }
        }
    }

    /// Decodes a node from its RLP encoding. A list of length 2 is a Leaf
    /// or Extension (distinguished by the path's leaf flag); a list of
    /// length 17 is a Branch. Any other shape is malformed.
    pub fn decode(data: &[u8]) -> Result<Node, TrieError> {
        let rlp = Rlp::new(data);

        match rlp.prototype()? {
            Prototype::List(2) => {
                let path_bytes = rlp.at(0)?.data()?;
                let (path, is_leaf) = NibblePath::decode_with_type(path_bytes);

                if is_leaf {
                    trace!("decoded leaf node");
                    let value = rlp.at(1)?.data()?.to_vec();
                    Ok(Node::Leaf { path, value })
                } else {
                    trace!("decoded extension node");
                    let child = read_child_ref(&rlp.at(1)?)?;
                    Ok(Node::Extension { path, child })
                }
            }
            Prototype::List(17) => {
                trace!("decoding branch node");
                let mut children: [Vec<u8>; 16] = Default::default();
                for (i, slot) in children.iter_mut().enumerate() {
                    *slot = read_child_ref(&rlp.at(i)?)?;
                }
                let value_item = rlp.at(16)?;
                let value = if value_item.is_empty() {
                    Vec::new()
                } else {
                    value_item.data()?.to_vec()
                };
                Ok(Node::Branch { children, value })
            }
            _ => Err(TrieError::Decode(rlp::DecoderError::Custom(
                "node RLP shape is neither a 2-item Leaf/Extension nor a 17-item Branch",
            ))),
        }
    }

    /// Computes the reference this node would be addressed by: its own
    /// encoding if that encoding is shorter than 32 bytes (inline), else
    /// the Keccak-256 digest of the encoding (hash reference). Does not
    /// write anything to a store — see [`crate::trie::Trie`]'s `store_node`.
    pub fn to_reference(&self) -> (Vec<u8>, Vec<u8>) {
        let encoded = self.encode();
        let reference = if encoded.len() < 32 {
            encoded.clone()
        } else {
            crate::hasher::keccak256(&encoded).to_vec()
        };
        (reference, encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_round_trips() {
        let node = Node::Leaf {
            path: NibblePath::from_key(&[0xAB, 0xCD]),
            value: b"value".to_vec(),
        };
        let encoded = node.encode();
        let decoded = Node::decode(&encoded).unwrap();
        assert_eq!(decoded, node);
        assert_eq!(Node::decode(&encoded).unwrap().encode(), encoded);
    }

    #[test]
    fn extension_with_hash_child_round_trips() {
        let node = Node::Extension {
            path: NibblePath::from_key(&[0x12]),
            child: vec![7u8; 32],
        };
        let encoded = node.encode();
        let decoded = Node::decode(&encoded).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn extension_with_inline_child_round_trips() {
        let inline_child = Node::Leaf {
            path: NibblePath::from_key(&[0x01]),
            value: b"x".to_vec(),
        };
        let (child_ref, _) = inline_child.to_reference();
        assert!(child_ref.len() < 32);

        let node = Node::Extension {
            path: NibblePath::from_key(&[0x12]),
            child: child_ref,
        };
        let encoded = node.encode();
        let decoded = Node::decode(&encoded).unwrap();
        assert_eq!(decoded, node);
        assert_eq!(decoded.encode(), encoded);
    }

    #[test]
    fn branch_round_trips_with_mixed_children() {
        let mut children: [Vec<u8>; 16] = Default::default();
        children[3] = vec![1u8; 32];
        children[9] = Node::Leaf {
            path: NibblePath::from_key(&[0x0A]).consume(1).clone(),
            value: b"y".to_vec(),
        }
        .to_reference()
        .0;

        let node = Node::Branch {
            children,
            value: b"v".to_vec(),
        };
        let encoded = node.encode();
        let decoded = Node::decode(&encoded).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn empty_node_encoding_matches_rlp_empty_string() {
        assert_eq!(EMPTY_NODE, [0x80]);
    }

    #[test]
    fn decode_rejects_bad_arity() {
        let mut stream = RlpStream::new_list(3);
        stream.append(&b"a".to_vec());
        stream.append(&b"b".to_vec());
        stream.append(&b"c".to_vec());
        let bad = stream.out().to_vec();
        assert!(Node::decode(&bad).is_err());
    }
}
