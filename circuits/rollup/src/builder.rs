use std::collections::HashMap;

use rollup_core::constants::NULLIFIER_SPENT_MARKER;
use rollup_core::hashing::Felt;
use rollup_core::{ProofSystem, TransactionProof};
use state_merkle::{HashPath, MerkleStore, MerkleTree};

use crate::circuit::RollupCircuitData;
use crate::error::RollupError;

/// One leaf write, with the sibling path taken just before the write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafUpdate {
    pub index: u64,
    pub old_value: Felt,
    pub new_value: Felt,
    pub path: HashPath,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InnerRollupTx {
    pub rollup_id: u32,
    pub num_txs: u32,
    pub data_start_index: u32,
    pub old_data_root: Felt,
    pub new_data_root: Felt,
    pub old_null_root: Felt,
    pub new_null_root: Felt,
    /// Root tree root the rollup was built against.
    pub data_roots_root: Felt,
    /// `rollup_size` entries: the real transactions, then padding.
    pub txs: Vec<TransactionProof>,
    pub data_root_updates: Vec<LeafUpdate>,
    pub null_root_updates: Vec<LeafUpdate>,
}

/// Leaf index of a nullifier in a nullifier tree of the given depth.
///
/// Below depth 64 the nullifier is truncated to its low `depth` bits, so
/// distinct nullifiers can share a leaf. A spent leaf then rejects every
/// nullifier that maps to it, and two such nullifiers in one batch fail with
/// [`RollupError::NullifierIndexCollision`].
pub fn nullifier_index(nullifier: Felt, depth: usize) -> u64 {
    let value = nullifier.as_int();
    if depth >= 64 {
        value
    } else {
        value & ((1u64 << depth) - 1)
    }
}

fn check_depth(tree: &'static str, expected: usize, actual: usize) -> Result<(), RollupError> {
    if expected != actual {
        return Err(RollupError::TreeDepthMismatch {
            tree,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Applies up to `rollup_size` transactions to the data and nullifier trees
/// and records every write. Nothing is written unless all transactions are
/// admissible.
pub fn create_rollup_tx<P, D, N, R>(
    rollup_id: u32,
    txs: &[Vec<u8>],
    data_tree: &mut MerkleTree<D>,
    null_tree: &mut MerkleTree<N>,
    root_tree: &MerkleTree<R>,
    cd: &RollupCircuitData<P>,
) -> Result<InnerRollupTx, RollupError>
where
    P: ProofSystem,
    D: MerkleStore,
    N: MerkleStore,
    R: MerkleStore,
{
    if txs.is_empty() {
        return Err(RollupError::EmptyBatch);
    }
    if txs.len() > cd.rollup_size() {
        return Err(RollupError::BatchTooLarge {
            count: txs.len(),
            max: cd.rollup_size(),
        });
    }
    check_depth("data", cd.data_tree_depth, data_tree.depth())?;
    check_depth("nullifier", cd.null_tree_depth, null_tree.depth())?;
    check_depth("root", cd.root_tree_depth, root_tree.depth())?;

    let proofs = txs
        .iter()
        .enumerate()
        .map(|(index, blob)| {
            TransactionProof::from_bytes(blob)
                .map_err(|source| RollupError::InvalidTransaction { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen_nullifiers: HashMap<u64, Felt> = HashMap::new();
    for (index, proof) in proofs.iter().enumerate() {
        let anchor = proof.public_inputs.data_root;
        if !data_tree.contains_root(anchor) {
            return Err(RollupError::UnknownAnchor { index, anchor });
        }
        for nullifier in proof.public_inputs.active_nullifiers() {
            let leaf = nullifier_index(nullifier, null_tree.depth());
            if let Some(first) = seen_nullifiers.insert(leaf, nullifier) {
                if first == nullifier {
                    return Err(RollupError::DuplicateNullifier(nullifier));
                }
                return Err(RollupError::NullifierIndexCollision {
                    first,
                    second: nullifier,
                    leaf,
                });
            }
            if null_tree.get_element(leaf)? != Felt::new(0) {
                return Err(RollupError::NullifierAlreadySpent { index, nullifier });
            }
        }
    }

    let start = data_tree.size();
    let commitments: usize = proofs
        .iter()
        .map(|proof| proof.public_inputs.active_commitments().count())
        .sum();
    let data_start_index =
        u32::try_from(start).map_err(|_| RollupError::DataTreeIndexOverflow(start))?;
    let required = start + commitments as u64;
    if u32::try_from(required).is_err() {
        return Err(RollupError::DataTreeIndexOverflow(required));
    }
    let depth = data_tree.depth();
    if depth < 64 && required > 1u64 << depth {
        return Err(RollupError::DataTreeFull {
            required,
            capacity: 1u64 << depth,
            depth,
        });
    }

    let old_data_root = data_tree.root();
    let old_null_root = null_tree.root();
    let mut null_root_updates = Vec::new();
    let mut data_root_updates = Vec::with_capacity(commitments);

    for proof in &proofs {
        for nullifier in proof.public_inputs.active_nullifiers() {
            let index = nullifier_index(nullifier, null_tree.depth());
            let path = null_tree.get_hash_path(index)?;
            let old_value = null_tree.get_element(index)?;
            let new_value = Felt::new(NULLIFIER_SPENT_MARKER);
            null_tree.update_element(index, new_value)?;
            null_root_updates.push(LeafUpdate {
                index,
                old_value,
                new_value,
                path,
            });
        }
        for commitment in proof.public_inputs.active_commitments() {
            let index = data_tree.size();
            let path = data_tree.get_hash_path(index)?;
            let old_value = data_tree.get_element(index)?;
            data_tree.update_element(index, commitment)?;
            data_root_updates.push(LeafUpdate {
                index,
                old_value,
                new_value: commitment,
                path,
            });
        }
    }

    let num_txs = proofs.len() as u32;
    let mut padded = proofs;
    padded.resize(cd.rollup_size(), TransactionProof::padding());

    let rollup = InnerRollupTx {
        rollup_id,
        num_txs,
        data_start_index,
        old_data_root,
        new_data_root: data_tree.root(),
        old_null_root,
        new_null_root: null_tree.root(),
        data_roots_root: root_tree.root(),
        txs: padded,
        data_root_updates,
        null_root_updates,
    };
    tracing::info!(
        rollup_id,
        num_txs,
        data_start_index,
        commitments,
        "built inner rollup"
    );
    Ok(rollup)
}
