//! The trie engine: recursive insert/lookup/delete rewriting, root
//! management, and the lazy path-trace iterator.
//!
//! Every recursive helper here is a direct transcription of
//! `original_source/mpt/mpt.py`'s methods of the same name (`_get`,
//! `_update`, `_create_branch_node`, `_create_branch_leaf`,
//! `_create_branch_extension`, `_delete`, `_delete_branch`,
//! `_delete_extension`, `_build_new_node_from_last_branch`, `_find_path`)
//! into Rust control flow. Python's `_DeleteAction` enum + tuple-return
//! convention becomes the tagged [`DeleteOutcome`] enum.

use log::{debug, trace};

use crate::error::TrieError;
use crate::hasher::keccak256;
use crate::nibble::NibblePath;
use crate::node::Node;
use crate::store::NodeStore;
use crate::rstd::vec::Vec;

/// Keccak256(RLP("")) — the well-known root hash of an empty trie.
pub const EMPTY_ROOT_HASH: [u8; 32] = [
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
];

const NODE_REF_LENGTH: usize = 32;

/// Outcome of a recursive delete step. `UselessBranch`'s path component is
/// read only by `Extension` parents (to splice with their own path); a
/// `Branch` parent discards it since the branch slot already supplies the
/// missing nibble.
enum DeleteOutcome {
    Deleted,
    Updated(Vec<u8>),
    UselessBranch(NibblePath, Vec<u8>),
}

/// One side of a two-way branch split: a fresh value to leaf-wrap, or an
/// already-encoded node reference to splice in (extension-side split).
enum BranchArm {
    Value(Vec<u8>),
    NodeRef(Vec<u8>),
}

/// An authenticated key-value trie over an external [`NodeStore`].
///
/// In secure mode every external key is replaced by its Keccak-256 digest
/// before any of the four public operations touch the trie structure.
pub struct Trie<S> {
    store: S,
    root: Vec<u8>,
    secure: bool,
}

impl<S: NodeStore> Trie<S> {
    /// Creates an empty trie over `store`.
    pub fn new(store: S, secure: bool) -> Self {
        Trie {
            store,
            root: Vec::new(),
            secure,
        }
    }

    /// Creates a (possibly read-only historical) view rooted at `root`, a
    /// reference previously returned by [`Trie::root`]. Mutating through a
    /// different `Trie` sharing the same store is safe as long as the store
    /// never evicts the encodings reachable from `root`.
    pub fn new_with_root(store: S, root: Vec<u8>, secure: bool) -> Self {
        Trie {
            store,
            root,
            secure,
        }
    }

    /// The current root reference: empty bytes for an empty trie, else
    /// either an inline encoding (<32 bytes) or a 32-byte hash.
    pub fn root(&self) -> &[u8] {
        &self.root
    }

    /// Hash of the root node's RLP encoding, or the empty-trie constant.
    pub fn root_hash(&self) -> [u8; 32] {
        if self.root.is_empty() {
            return EMPTY_ROOT_HASH;
        }
        if self.root.len() == NODE_REF_LENGTH {
            let mut out = [0u8; 32];
            out.copy_from_slice(&self.root);
            return out;
        }
        keccak256(&self.root)
    }

    fn key_path(&self, key: &[u8]) -> NibblePath {
        if self.secure {
            NibblePath::from_key(&keccak256(key))
        } else {
            NibblePath::from_key(key)
        }
    }

    /// Resolves a reference to its decoded node: an inline reference is
    /// decoded directly, a hash reference is fetched from the store first.
    fn resolve(&self, node_ref: &[u8]) -> Result<Node, TrieError> {
        if node_ref.len() == NODE_REF_LENGTH {
            let bytes = self
                .store
                .get(node_ref.try_into().expect("checked length above"))
                .ok_or(TrieError::StoreMiss)?;
            Node::decode(&bytes)
        } else {
            Node::decode(node_ref)
        }
    }

    /// Builds the reference for `node` and, if it hashes (encoding >= 32
    /// bytes), writes the encoding into the store under that hash.
    fn store_node(&mut self, node: &Node) -> Vec<u8> {
        let (reference, encoded) = node.to_reference();
        if reference.len() == NODE_REF_LENGTH {
            let hash: [u8; 32] = reference.as_slice().try_into().expect("checked length");
            self.store.insert(hash, encoded);
        }
        reference
    }

    /// Point lookup. `NotFound` is a normal outcome, not a fault.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>, TrieError> {
        if self.root.is_empty() {
            return Err(TrieError::NotFound);
        }
        let path = self.key_path(key);
        self.get_rec(&self.root, path)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_ok()
    }

    fn get_rec(&self, node_ref: &[u8], path: NibblePath) -> Result<Vec<u8>, TrieError> {
        let node = self.resolve(node_ref)?;

        if path.is_empty() {
            return match node {
                Node::Leaf { value, .. } => Ok(value),
                Node::Branch { value, .. } if !value.is_empty() => Ok(value),
                _ => Err(TrieError::NotFound),
            };
        }

        match node {
            Node::Leaf { path: leaf_path, value } => {
                if leaf_path == path {
                    Ok(value)
                } else {
                    Err(TrieError::NotFound)
                }
            }
            Node::Extension { path: ext_path, child } => {
                if path.starts_with(&ext_path) {
                    let mut rest = path;
                    rest.consume(ext_path.len());
                    self.get_rec(&child, rest)
                } else {
                    Err(TrieError::NotFound)
                }
            }
            Node::Branch { children, .. } => {
                let idx = path.at(0) as usize;
                let branch = &children[idx];
                if branch.is_empty() {
                    Err(TrieError::NotFound)
                } else {
                    let mut rest = path;
                    rest.consume(1);
                    self.get_rec(branch, rest)
                }
            }
        }
    }

    /// Inserts or overwrites the value for `key`. Total: any key and any
    /// value, including an empty value, is accepted and produces a
    /// canonical trie — writing an empty value is not equivalent to delete.
    pub fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), TrieError> {
        let path = self.key_path(key);
        self.root = self.update(self.root.clone(), path, value)?;
        Ok(())
    }

    fn update(&mut self, node_ref: Vec<u8>, path: NibblePath, value: Vec<u8>) -> Result<Vec<u8>, TrieError> {
        if node_ref.is_empty() {
            let leaf = Node::Leaf { path, value };
            return Ok(self.store_node(&leaf));
        }

        let node = self.resolve(&node_ref)?;

        match node {
            Node::Leaf {
                path: mut leaf_path,
                value: leaf_value,
            } => {
                if leaf_path == path {
                    let leaf = Node::Leaf { path, value };
                    return Ok(self.store_node(&leaf));
                }

                let mut path = path;
                let common_prefix = path.common_prefix(&leaf_path);
                path.consume(common_prefix.len());
                leaf_path.consume(common_prefix.len());

                let branch_ref = self.create_branch_node(
                    path,
                    BranchArm::Value(value),
                    leaf_path,
                    BranchArm::Value(leaf_value),
                )?;

                self.wrap_in_extension(common_prefix, branch_ref)
            }
            Node::Extension {
                path: mut ext_path,
                child,
            } => {
                let mut path = path;
                if path.starts_with(&ext_path) {
                    path.consume(ext_path.len());
                    let new_child = self.update(child, path, value)?;
                    let ext = Node::Extension {
                        path: ext_path,
                        child: new_child,
                    };
                    Ok(self.store_node(&ext))
                } else {
                    let common_prefix = path.common_prefix(&ext_path);
                    path.consume(common_prefix.len());
                    ext_path.consume(common_prefix.len());

                    let branch_ref = self.create_branch_node(
                        path,
                        BranchArm::Value(value),
                        ext_path,
                        BranchArm::NodeRef(child),
                    )?;

                    self.wrap_in_extension(common_prefix, branch_ref)
                }
            }
            Node::Branch {
                mut children,
                value: branch_value,
            } => {
                if path.is_empty() {
                    let branch = Node::Branch {
                        children,
                        value,
                    };
                    return Ok(self.store_node(&branch));
                }
                let mut path = path;
                let idx = path.at(0) as usize;
                path.consume(1);
                children[idx] = self.update(core::mem::take(&mut children[idx]), path, value)?;
                let branch = Node::Branch {
                    children,
                    value: branch_value,
                };
                Ok(self.store_node(&branch))
            }
        }
    }

    /// Wraps `child_ref` in an Extension over `prefix`, unless `prefix` is
    /// empty, in which case the child reference already *is* the result —
    /// a zero-length Extension is not a valid node shape (spec.md §3.6).
    fn wrap_in_extension(&mut self, prefix: NibblePath, child_ref: Vec<u8>) -> Result<Vec<u8>, TrieError> {
        if prefix.is_empty() {
            Ok(child_ref)
        } else {
            let ext = Node::Extension {
                path: prefix,
                child: child_ref,
            };
            Ok(self.store_node(&ext))
        }
    }

    /// Builds a two-arm Branch out of two diverging paths, each carrying
    /// either a value to leaf-wrap or an existing node reference to
    /// splice/extension-wrap. An arm whose path is already empty supplies
    /// the branch's own value directly (an extension arm can never end
    /// exactly at the branch — that would mean its owning Extension node
    /// had a zero-length path, which never occurs).
    fn create_branch_node(
        &mut self,
        path_a: NibblePath,
        arm_a: BranchArm,
        path_b: NibblePath,
        arm_b: BranchArm,
    ) -> Result<Vec<u8>, TrieError> {
        let mut children: [Vec<u8>; 16] = Default::default();
        let mut branch_value = Vec::new();

        self.place_branch_arm(path_a, arm_a, &mut children, &mut branch_value);
        self.place_branch_arm(path_b, arm_b, &mut children, &mut branch_value);

        let branch = Node::Branch {
            children,
            value: branch_value,
        };
        Ok(self.store_node(&branch))
    }

    fn place_branch_arm(
        &mut self,
        mut path: NibblePath,
        arm: BranchArm,
        children: &mut [Vec<u8>; 16],
        branch_value: &mut Vec<u8>,
    ) {
        if path.is_empty() {
            match arm {
                BranchArm::Value(v) => *branch_value = v,
                BranchArm::NodeRef(_) => {
                    debug_assert!(false, "an extension arm cannot terminate exactly at the branch");
                }
            }
            return;
        }

        let idx = path.at(0) as usize;
        path.consume(1);

        match arm {
            BranchArm::Value(value) => {
                let leaf = Node::Leaf { path, value };
                children[idx] = self.store_node(&leaf);
            }
            BranchArm::NodeRef(next_ref) => {
                if path.is_empty() {
                    children[idx] = next_ref;
                } else {
                    let ext = Node::Extension { path, child: next_ref };
                    children[idx] = self.store_node(&ext);
                }
            }
        }
    }

    /// Removes the value for `key`. Raises `NotFound` if absent.
    pub fn delete(&mut self, key: &[u8]) -> Result<(), TrieError> {
        if self.root.is_empty() {
            return Err(TrieError::NotFound);
        }
        let path = self.key_path(key);
        match self.delete_rec(self.root.clone(), path)? {
            DeleteOutcome::Deleted => {
                self.root = Vec::new();
            }
            DeleteOutcome::Updated(new_root) => {
                self.root = new_root;
            }
            DeleteOutcome::UselessBranch(_, new_root) => {
                self.root = new_root;
            }
        }
        Ok(())
    }

    fn delete_rec(&mut self, node_ref: Vec<u8>, path: NibblePath) -> Result<DeleteOutcome, TrieError> {
        let node = self.resolve(&node_ref)?;
        match node {
            Node::Leaf { path: leaf_path, .. } => {
                if leaf_path == path {
                    Ok(DeleteOutcome::Deleted)
                } else {
                    Err(TrieError::NotFound)
                }
            }
            Node::Extension { path: ext_path, child } => self.delete_extension(ext_path, child, path),
            Node::Branch { children, value } => self.delete_branch(children, value, path),
        }
    }

    fn delete_extension(
        &mut self,
        ext_path: NibblePath,
        next_ref: Vec<u8>,
        mut path: NibblePath,
    ) -> Result<DeleteOutcome, TrieError> {
        if !path.starts_with(&ext_path) {
            return Err(TrieError::NotFound);
        }
        path.consume(ext_path.len());

        match self.delete_rec(next_ref, path)? {
            DeleteOutcome::Deleted => Ok(DeleteOutcome::Deleted),
            DeleteOutcome::Updated(child_ref) => {
                let ext = Node::Extension {
                    path: ext_path,
                    child: child_ref,
                };
                Ok(DeleteOutcome::Updated(self.store_node(&ext)))
            }
            DeleteOutcome::UselessBranch(rem_path, rem_ref) => {
                let remainder = self.resolve(&rem_ref)?;
                let new_node = match remainder {
                    Node::Leaf { path: rp, value } => Node::Leaf {
                        path: ext_path.combine(&rp),
                        value,
                    },
                    Node::Extension { path: rp, child } => Node::Extension {
                        path: ext_path.combine(&rp),
                        child,
                    },
                    Node::Branch { .. } => Node::Extension {
                        path: ext_path.combine(&rem_path),
                        child: rem_ref,
                    },
                };
                Ok(DeleteOutcome::Updated(self.store_node(&new_node)))
            }
        }
    }

    fn delete_branch(
        &mut self,
        mut children: [Vec<u8>; 16],
        mut value: Vec<u8>,
        path: NibblePath,
    ) -> Result<DeleteOutcome, TrieError> {
        let mut idx = None;
        let inner_outcome;

        if path.is_empty() {
            if value.is_empty() {
                return Err(TrieError::NotFound);
            }
            value = Vec::new();
            inner_outcome = DeleteOutcome::Deleted;
        } else {
            let mut path = path;
            let i = path.at(0) as usize;
            if children[i].is_empty() {
                return Err(TrieError::NotFound);
            }
            path.consume(1);
            idx = Some(i);
            inner_outcome = self.delete_rec(core::mem::take(&mut children[i]), path)?;
        }

        match inner_outcome {
            DeleteOutcome::Deleted => {
                if let Some(i) = idx {
                    children[i] = Vec::new();
                }
                let non_empty = children.iter().filter(|c| !c.is_empty()).count();

                if non_empty == 0 && value.is_empty() {
                    trace!("branch became fully empty, deleting");
                    Ok(DeleteOutcome::Deleted)
                } else if non_empty == 0 {
                    trace!("branch collapsed to its own value");
                    let leaf = Node::Leaf {
                        path: NibblePath::empty(),
                        value,
                    };
                    let leaf_ref = self.store_node(&leaf);
                    Ok(DeleteOutcome::UselessBranch(NibblePath::empty(), leaf_ref))
                } else if non_empty == 1 && value.is_empty() {
                    debug!("branch has exactly one child left and no value; collapsing");
                    self.build_new_node_from_last_branch(&children)
                } else {
                    let branch = Node::Branch { children, value };
                    Ok(DeleteOutcome::Updated(self.store_node(&branch)))
                }
            }
            DeleteOutcome::Updated(new_ref) => {
                let i = idx.expect("Updated only returned when we recursed into a slot");
                children[i] = new_ref;
                let branch = Node::Branch { children, value };
                Ok(DeleteOutcome::Updated(self.store_node(&branch)))
            }
            DeleteOutcome::UselessBranch(_, new_ref) => {
                let i = idx.expect("UselessBranch only returned when we recursed into a slot");
                children[i] = new_ref;
                let branch = Node::Branch { children, value };
                Ok(DeleteOutcome::Updated(self.store_node(&branch)))
            }
        }
    }

    /// Combines the lone remaining branch slot's index nibble with the
    /// underlying node: merges into a Leaf/Extension if the child is one of
    /// those, or wraps a Branch child in a one-nibble Extension (a Branch
    /// can never be merged directly into its parent, since that would
    /// leave a dangling single-child Branch, violating spec.md §3.6).
    fn build_new_node_from_last_branch(
        &mut self,
        children: &[Vec<u8>; 16],
    ) -> Result<DeleteOutcome, TrieError> {
        let idx = children
            .iter()
            .position(|c| !c.is_empty())
            .expect("caller verified exactly one non-empty slot");

        let mut prefix_nibble = NibblePath::from_key(&[idx as u8]);
        prefix_nibble.consume(1);

        let child = self.resolve(&children[idx])?;

        let (path, node) = match child {
            Node::Leaf { path: cp, value } => {
                let combined = prefix_nibble.combine(&cp);
                (combined.clone(), Node::Leaf { path: combined, value })
            }
            Node::Extension { path: cp, child } => {
                let combined = prefix_nibble.combine(&cp);
                (combined.clone(), Node::Extension { path: combined, child })
            }
            Node::Branch { .. } => (
                prefix_nibble.clone(),
                Node::Extension {
                    path: prefix_nibble,
                    child: children[idx].clone(),
                },
            ),
        };

        let reference = self.store_node(&node);
        Ok(DeleteOutcome::UselessBranch(path, reference))
    }

    /// Lazily walks the node sequence for `key`, yielding one node per step
    /// and finally a `NotFound` error if the key is absent, as spec.md
    /// §4.4.4 describes. Used by callers building Merkle proofs.
    pub fn find_path(&self, key: &[u8]) -> PathTrace<'_, S> {
        let path = self.key_path(key);
        PathTrace {
            trie: self,
            state: if self.root.is_empty() {
                PathTraceState::Done
            } else {
                PathTraceState::Pending(self.root.clone(), path)
            },
        }
    }
}

enum PathTraceState {
    Pending(Vec<u8>, NibblePath),
    Failed,
    Done,
}

/// Iterator over the nodes walked while looking up a key. Yields `Ok(node)`
/// for every node on the path; if the key is absent, the final item is
/// `Err(TrieError::NotFound)`.
pub struct PathTrace<'a, S> {
    trie: &'a Trie<S>,
    state: PathTraceState,
}

impl<'a, S: NodeStore> Iterator for PathTrace<'a, S> {
    type Item = Result<Node, TrieError>;

    fn next(&mut self) -> Option<Self::Item> {
        match core::mem::replace(&mut self.state, PathTraceState::Done) {
            PathTraceState::Done => None,
            PathTraceState::Failed => Some(Err(TrieError::NotFound)),
            PathTraceState::Pending(node_ref, mut path) => {
                let node = match self.trie.resolve(&node_ref) {
                    Ok(n) => n,
                    Err(e) => return Some(Err(e)),
                };

                if path.is_empty() {
                    self.state = PathTraceState::Done;
                    return Some(Ok(node));
                }

                match &node {
                    Node::Leaf { path: leaf_path, .. } => {
                        self.state = if *leaf_path == path {
                            PathTraceState::Done
                        } else {
                            PathTraceState::Failed
                        };
                    }
                    Node::Extension { path: ext_path, child } => {
                        if path.starts_with(ext_path) {
                            path.consume(ext_path.len());
                            self.state = PathTraceState::Pending(child.clone(), path);
                        } else {
                            self.state = PathTraceState::Failed;
                        }
                    }
                    Node::Branch { children, .. } => {
                        let idx = path.at(0) as usize;
                        if children[idx].is_empty() {
                            self.state = PathTraceState::Failed;
                        } else {
                            path.consume(1);
                            self.state = PathTraceState::Pending(children[idx].clone(), path);
                        }
                    }
                }

                Some(Ok(node))
            }
        }
    }
}
