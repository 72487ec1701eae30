use rollup_core::hashing::{serde_felt, Felt};
use rollup_core::{ProofSystem, RollupProofData};
use serde::{Deserialize, Serialize};
use state_merkle::{HashPath, MerkleStore, MerkleTree};

use crate::circuit::RootRollupCircuitData;
use crate::error::RootRollupError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRollupTx {
    pub rollup_id: u32,
    pub num_inner_proofs: u32,
    #[serde(with = "serde_felt")]
    pub old_data_roots_root: Felt,
    #[serde(with = "serde_felt")]
    pub new_data_roots_root: Felt,
    /// Root tree leaf at `rollup_id` before this rollup wrote to it.
    #[serde(with = "serde_felt")]
    pub old_data_roots_leaf: Felt,
    pub new_data_roots_path: HashPath,
    /// `rollups_per_rollup` inner rollup proof-data blobs, real then padding.
    pub rollups: Vec<Vec<u8>>,
}

impl RootRollupTx {
    pub fn to_bytes(&self) -> Result<Vec<u8>, RootRollupError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RootRollupError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

fn check_depth(tree: &'static str, expected: usize, actual: usize) -> Result<(), RootRollupError> {
    if expected != actual {
        return Err(RootRollupError::TreeDepthMismatch {
            tree,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Assembles a root rollup from inner rollup proofs and records the final
/// data root in the root tree at `rollup_id`.
///
/// Ordering and partial-batch rules are left to the verifiers so a
/// malformed sequence still yields a transaction that can be checked.
pub fn create_root_rollup_tx<P, D, R>(
    rollup_id: u32,
    inner_proofs: &[Vec<u8>],
    data_tree: &MerkleTree<D>,
    root_tree: &mut MerkleTree<R>,
    cd: &RootRollupCircuitData<P>,
) -> Result<RootRollupTx, RootRollupError>
where
    P: ProofSystem,
    D: MerkleStore,
    R: MerkleStore,
{
    if inner_proofs.is_empty() {
        return Err(RootRollupError::EmptyBatch);
    }
    if inner_proofs.len() > cd.rollups_per_rollup() {
        return Err(RootRollupError::TooManyRollups {
            count: inner_proofs.len(),
            max: cd.rollups_per_rollup(),
        });
    }
    check_depth("root", cd.root_tree_depth, root_tree.depth())?;
    check_depth("data", cd.inner.data_tree_depth, data_tree.depth())?;

    let mut last_new_data_root = None;
    for (index, proof) in inner_proofs.iter().enumerate() {
        let (data, _) = RollupProofData::from_proof_data(proof, false)
            .map_err(|source| RootRollupError::InvalidRollupProof { index, source })?;
        last_new_data_root = Some(data.header.new_data_root);
    }
    let new_data_root = last_new_data_root.ok_or(RootRollupError::EmptyBatch)?;
    if new_data_root != data_tree.root() {
        tracing::warn!(
            rollup_id,
            "last inner rollup does not end at the current data tree root"
        );
    }

    let index = rollup_id as u64;
    let old_data_roots_root = root_tree.root();
    let new_data_roots_path = root_tree.get_hash_path(index)?;
    let old_data_roots_leaf = root_tree.get_element(index)?;
    let new_data_roots_root = root_tree.update_element(index, new_data_root)?;

    let mut rollups = inner_proofs.to_vec();
    rollups.resize(cd.rollups_per_rollup(), cd.padding_proof.clone());

    tracing::info!(
        rollup_id,
        num_inner_proofs = inner_proofs.len(),
        "built root rollup"
    );
    Ok(RootRollupTx {
        rollup_id,
        num_inner_proofs: inner_proofs.len() as u32,
        old_data_roots_root,
        new_data_roots_root,
        old_data_roots_leaf,
        new_data_roots_path,
        rollups,
    })
}
