//! Keyed fixed-depth Merkle tree state.
//!
//! Leaves are addressed by index and default to zero, so the tree serves both
//! as an append-style commitment registry and as a sparse keyed set (the
//! nullifier and root trees). Node hashing uses the rollup circuits' Merkle
//! domain.

use std::collections::{HashMap, HashSet};

use rollup_core::hashing::{merkle_node, serde_vec_felt, Felt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Binary Merkle tree.
const BRANCH_FACTOR: u64 = 2;

/// Deepest supported tree; leaf indices are `u64`.
pub const MAX_DEPTH: usize = 64;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    #[error("tree depth {0} is outside 1..=64")]
    InvalidDepth(usize),
    #[error("leaf index {index} is out of range for depth {depth}")]
    InvalidLeafIndex { index: u64, depth: usize },
}

/// Backing storage for non-default tree nodes. Level 0 holds leaves.
pub trait MerkleStore {
    fn get(&self, level: usize, index: u64) -> Option<Felt>;
    fn put(&mut self, level: usize, index: u64, value: Felt);
    /// Highest leaf index present in the store.
    fn max_leaf_index(&self) -> Option<u64>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    nodes: HashMap<(usize, u64), Felt>,
}

impl MerkleStore for MemoryStore {
    fn get(&self, level: usize, index: u64) -> Option<Felt> {
        self.nodes.get(&(level, index)).copied()
    }

    fn put(&mut self, level: usize, index: u64, value: Felt) {
        self.nodes.insert((level, index), value);
    }

    fn max_leaf_index(&self) -> Option<u64> {
        self.nodes
            .keys()
            .filter(|(level, _)| *level == 0)
            .map(|(_, index)| *index)
            .max()
    }
}

/// Sibling hashes from the leaf level upwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashPath {
    #[serde(with = "serde_vec_felt")]
    pub siblings: Vec<Felt>,
}

impl HashPath {
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    pub fn compute_root(&self, leaf: Felt, index: u64) -> Felt {
        compute_root_from_path(leaf, index, &self.siblings)
    }
}

pub fn compute_root_from_path(leaf: Felt, index: u64, siblings: &[Felt]) -> Felt {
    let mut current = leaf;
    let mut position = index;
    for sibling in siblings {
        current = if position % BRANCH_FACTOR == 0 {
            merkle_node(current, *sibling)
        } else {
            merkle_node(*sibling, current)
        };
        position /= BRANCH_FACTOR;
    }
    current
}

fn default_nodes(depth: usize) -> Vec<Felt> {
    let mut nodes = Vec::with_capacity(depth + 1);
    let mut current = Felt::new(0);
    nodes.push(current);
    for _ in 0..depth {
        current = merkle_node(current, current);
        nodes.push(current);
    }
    nodes
}

#[derive(Clone, Debug)]
pub struct MerkleTree<S = MemoryStore> {
    depth: usize,
    size: u64,
    default_nodes: Vec<Felt>,
    store: S,
    root_history: Vec<Felt>,
    known_roots: HashSet<u64>,
}

impl MerkleTree<MemoryStore> {
    pub fn new(depth: usize) -> Result<Self, MerkleError> {
        Self::with_store(depth, MemoryStore::default())
    }
}

impl<S: MerkleStore> MerkleTree<S> {
    /// Opens a tree over `store`. A populated store must have been written by
    /// a tree of the same depth; its root and size are taken from the stored
    /// nodes, and the root history starts at that root.
    pub fn with_store(depth: usize, store: S) -> Result<Self, MerkleError> {
        if depth == 0 || depth > MAX_DEPTH {
            return Err(MerkleError::InvalidDepth(depth));
        }
        let default_nodes = default_nodes(depth);
        let root = store.get(depth, 0).unwrap_or(default_nodes[depth]);
        let size = store
            .max_leaf_index()
            .map_or(0, |index| index.saturating_add(1));
        if depth < MAX_DEPTH && size > 1u64 << depth {
            return Err(MerkleError::InvalidLeafIndex {
                index: size - 1,
                depth,
            });
        }
        Ok(Self {
            depth,
            size,
            default_nodes,
            store,
            root_history: vec![root],
            known_roots: HashSet::from([root.as_int()]),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// One past the highest index ever written; the next free leaf when the
    /// tree is filled append-style.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn root(&self) -> Felt {
        self.root_history
            .last()
            .copied()
            .unwrap_or(self.default_nodes[self.depth])
    }

    /// Every root the tree has had, oldest first, starting with the empty root.
    pub fn root_history(&self) -> &[Felt] {
        &self.root_history
    }

    pub fn contains_root(&self, root: Felt) -> bool {
        self.known_roots.contains(&root.as_int())
    }

    pub fn get_element(&self, index: u64) -> Result<Felt, MerkleError> {
        self.check_index(index)?;
        Ok(self.node(0, index))
    }

    /// Writes `value` at `index` and returns the new root.
    pub fn update_element(&mut self, index: u64, value: Felt) -> Result<Felt, MerkleError> {
        self.check_index(index)?;
        self.store.put(0, index, value);
        let mut current = value;
        let mut position = index;
        for level in 0..self.depth {
            let sibling = self.node(level, position ^ 1);
            current = if position % BRANCH_FACTOR == 0 {
                merkle_node(current, sibling)
            } else {
                merkle_node(sibling, current)
            };
            position /= BRANCH_FACTOR;
            self.store.put(level + 1, position, current);
        }
        self.size = self.size.max(index.saturating_add(1));
        self.root_history.push(current);
        self.known_roots.insert(current.as_int());
        Ok(current)
    }

    pub fn get_hash_path(&self, index: u64) -> Result<HashPath, MerkleError> {
        self.check_index(index)?;
        let mut siblings = Vec::with_capacity(self.depth);
        let mut position = index;
        for level in 0..self.depth {
            siblings.push(self.node(level, position ^ 1));
            position /= BRANCH_FACTOR;
        }
        Ok(HashPath { siblings })
    }

    fn node(&self, level: usize, index: u64) -> Felt {
        self.store
            .get(level, index)
            .unwrap_or(self.default_nodes[level])
    }

    fn check_index(&self, index: u64) -> Result<(), MerkleError> {
        if self.depth < MAX_DEPTH && index >> self.depth != 0 {
            return Err(MerkleError::InvalidLeafIndex {
                index,
                depth: self.depth,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_root_is_default_subtree() {
        let tree = MerkleTree::new(4).expect("tree");
        let defaults = default_nodes(4);
        assert_eq!(tree.root(), defaults[4]);
        assert_eq!(tree.size(), 0);
        assert_eq!(tree.root_history(), &[defaults[4]]);
    }

    #[test]
    fn depth_bounds_are_enforced() {
        assert_eq!(
            MerkleTree::new(0).map(|_| ()),
            Err(MerkleError::InvalidDepth(0))
        );
        assert_eq!(
            MerkleTree::new(65).map(|_| ()),
            Err(MerkleError::InvalidDepth(65))
        );
        let mut tree = MerkleTree::new(3).expect("tree");
        assert_eq!(
            tree.update_element(8, Felt::new(1)),
            Err(MerkleError::InvalidLeafIndex { index: 8, depth: 3 })
        );
    }

    #[test]
    fn full_depth_accepts_any_index() {
        let mut tree = MerkleTree::new(64).expect("tree");
        let root = tree.update_element(u64::MAX, Felt::new(1)).expect("update");
        assert_eq!(tree.size(), u64::MAX);
        let path = tree.get_hash_path(u64::MAX).expect("path");
        assert_eq!(path.compute_root(Felt::new(1), u64::MAX), root);
    }

    #[test]
    fn append_style_updates_track_size_and_history() {
        let mut tree = MerkleTree::new(4).expect("tree");
        for value in 1..=5u64 {
            let index = tree.size();
            tree.update_element(index, Felt::new(value)).expect("update");
        }
        assert_eq!(tree.size(), 5);
        assert_eq!(tree.root_history().len(), 6);
        assert_eq!(tree.get_element(2).expect("element"), Felt::new(3));
        assert_eq!(tree.get_element(9).expect("element"), Felt::new(0));
        let old_root = tree.root_history()[2];
        assert!(tree.contains_root(old_root));
    }

    #[test]
    fn path_taken_before_write_predicts_new_root() {
        let mut tree = MerkleTree::new(6).expect("tree");
        tree.update_element(3, Felt::new(9)).expect("update");
        let path = tree.get_hash_path(17).expect("path");
        assert_eq!(path.compute_root(Felt::new(0), 17), tree.root());
        let new_root = tree.update_element(17, Felt::new(44)).expect("update");
        assert_eq!(path.compute_root(Felt::new(44), 17), new_root);
    }

    #[test]
    fn reopened_store_keeps_root_and_paths_consistent() {
        let mut original = MerkleTree::new(4).expect("tree");
        original.update_element(3, Felt::new(7)).expect("update");
        let mut reopened =
            MerkleTree::with_store(4, original.store().clone()).expect("reopen");
        assert_eq!(reopened.root(), original.root());
        assert_eq!(reopened.size(), 4);
        assert!(reopened.contains_root(original.root()));
        let path = reopened.get_hash_path(2).expect("path");
        assert_eq!(path.compute_root(Felt::new(0), 2), reopened.root());

        let mut both = MerkleTree::new(4).expect("tree");
        both.update_element(3, Felt::new(7)).expect("update");
        both.update_element(5, Felt::new(9)).expect("update");
        let root = reopened.update_element(5, Felt::new(9)).expect("update");
        assert_eq!(root, both.root());
        assert_eq!(reopened.size(), 6);
    }

    #[test]
    fn store_from_deeper_tree_is_rejected() {
        let mut deep = MerkleTree::new(6).expect("tree");
        deep.update_element(40, Felt::new(1)).expect("update");
        assert_eq!(
            MerkleTree::with_store(4, deep.into_store()).map(|_| ()),
            Err(MerkleError::InvalidLeafIndex { index: 40, depth: 4 })
        );
    }

    #[test]
    fn old_roots_stay_known_after_many_writes() {
        let mut tree = MerkleTree::new(10).expect("tree");
        let mut roots = Vec::new();
        for index in 0..200u64 {
            roots.push(tree.update_element(index, Felt::new(index + 1)).expect("update"));
        }
        assert!(roots.iter().all(|root| tree.contains_root(*root)));
        assert!(!tree.contains_root(Felt::new(123_456)));
        assert_eq!(tree.root_history().len(), 201);
    }

    proptest! {
        #[test]
        fn root_depends_only_on_final_leaves(
            writes in proptest::collection::btree_map(0u64..64, 1u64..1_000, 1..12)
        ) {
            let mut forward = MerkleTree::new(6).expect("tree");
            let mut backward = MerkleTree::new(6).expect("tree");
            for (index, value) in writes.iter() {
                forward.update_element(*index, Felt::new(*value)).expect("update");
            }
            for (index, value) in writes.iter().rev() {
                backward.update_element(*index, Felt::new(*value)).expect("update");
            }
            prop_assert_eq!(forward.root(), backward.root());
            for (index, value) in writes.iter() {
                let path = forward.get_hash_path(*index).expect("path");
                prop_assert_eq!(path.compute_root(Felt::new(*value), *index), forward.root());
            }
        }
    }
}
