use rollup_core::constants::NULLIFIER_SPENT_MARKER;
use rollup_core::hashing::Felt;
use rollup_core::{ProofSystem, PublicInputs, RollupProofData};
use winterfell::math::FieldElement;

use crate::builder::{nullifier_index, InnerRollupTx, LeafUpdate};
use crate::circuit::RollupCircuitData;
use crate::error::RollupError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollupVerification {
    pub verified: bool,
    /// Public inputs followed by the raw proof; empty when not verified.
    pub proof_data: Vec<u8>,
}

impl RollupVerification {
    fn rejected() -> Self {
        Self {
            verified: false,
            proof_data: Vec::new(),
        }
    }
}

/// Replays `updates` from `root`, requiring each write to go from the expected
/// old value to the expected new value at the expected index.
fn replay_updates(
    tree: &'static str,
    root: Felt,
    depth: usize,
    updates: &[LeafUpdate],
    expected: &[(u64, Felt, Felt)],
) -> Option<Felt> {
    if updates.len() != expected.len() {
        tracing::warn!(
            tree,
            updates = updates.len(),
            expected = expected.len(),
            "leaf update count does not match transactions"
        );
        return None;
    }
    let mut current = root;
    for (position, (update, (index, old_value, new_value))) in
        updates.iter().zip(expected.iter()).enumerate()
    {
        if update.index != *index
            || update.old_value != *old_value
            || update.new_value != *new_value
            || update.path.depth() != depth
        {
            tracing::warn!(tree, position, index = update.index, "unexpected leaf update");
            return None;
        }
        if update.path.compute_root(update.old_value, update.index) != current {
            tracing::warn!(tree, position, index = update.index, "stale hash path");
            return None;
        }
        current = update.path.compute_root(update.new_value, update.index);
    }
    Some(current)
}

/// Checks that an inner rollup is internally consistent: slot layout, and
/// that the recorded tree writes take the old roots to the new roots.
pub fn verify_rollup_logic<P: ProofSystem>(tx: &InnerRollupTx, cd: &RollupCircuitData<P>) -> bool {
    let num_txs = tx.num_txs as usize;
    if tx.txs.len() != cd.rollup_size() {
        tracing::warn!(
            slots = tx.txs.len(),
            rollup_size = cd.rollup_size,
            "inner rollup slot count mismatch"
        );
        return false;
    }
    if num_txs == 0 || num_txs > cd.rollup_size() {
        tracing::warn!(num_txs, rollup_size = cd.rollup_size, "num_txs out of range");
        return false;
    }
    for (slot, proof) in tx.txs.iter().enumerate() {
        let is_padding = proof.public_inputs.is_padding() && proof.proof.is_empty();
        if (slot < num_txs) == is_padding {
            tracing::warn!(slot, num_txs, "real and padding slots are out of place");
            return false;
        }
    }

    let real = &tx.txs[..num_txs];
    let expected_nullifiers: Vec<(u64, Felt, Felt)> = real
        .iter()
        .flat_map(|proof| proof.public_inputs.active_nullifiers())
        .map(|nullifier| {
            (
                nullifier_index(nullifier, cd.null_tree_depth),
                Felt::ZERO,
                Felt::new(NULLIFIER_SPENT_MARKER),
            )
        })
        .collect();
    let expected_commitments: Vec<(u64, Felt, Felt)> = real
        .iter()
        .flat_map(|proof| proof.public_inputs.active_commitments())
        .enumerate()
        .map(|(offset, commitment)| {
            (
                tx.data_start_index as u64 + offset as u64,
                Felt::ZERO,
                commitment,
            )
        })
        .collect();

    let Some(null_root) = replay_updates(
        "nullifier",
        tx.old_null_root,
        cd.null_tree_depth,
        &tx.null_root_updates,
        &expected_nullifiers,
    ) else {
        return false;
    };
    if null_root != tx.new_null_root {
        tracing::warn!("nullifier updates do not reach new_null_root");
        return false;
    }

    let Some(data_root) = replay_updates(
        "data",
        tx.old_data_root,
        cd.data_tree_depth,
        &tx.data_root_updates,
        &expected_commitments,
    ) else {
        return false;
    };
    if data_root != tx.new_data_root {
        tracing::warn!("data updates do not reach new_data_root");
        return false;
    }
    true
}

/// Public inputs an inner rollup proof commits to.
pub fn rollup_proof_data(tx: &InnerRollupTx, rollup_size: u32) -> RollupProofData {
    RollupProofData {
        header: PublicInputs {
            rollup_id: tx.rollup_id,
            rollup_size,
            data_start_index: tx.data_start_index,
            old_data_root: tx.old_data_root,
            new_data_root: tx.new_data_root,
            old_null_root: tx.old_null_root,
            new_null_root: tx.new_null_root,
            old_data_roots_root: tx.data_roots_root,
            new_data_roots_root: tx.data_roots_root,
            num_txs: tx.num_txs,
        },
        tx_public_inputs: tx.txs.iter().map(|proof| proof.public_inputs).collect(),
        recursion_output: None,
    }
}

/// Checks the rollup and every transaction proof in it, then proves the
/// inner rollup circuit.
pub fn verify_rollup<P: ProofSystem>(
    tx: &InnerRollupTx,
    cd: &RollupCircuitData<P>,
    system: &P,
) -> Result<RollupVerification, RollupError> {
    if !verify_rollup_logic(tx, cd) {
        return Ok(RollupVerification::rejected());
    }
    for (index, proof) in tx.txs[..tx.num_txs as usize].iter().enumerate() {
        if !system.verify(
            &cd.tx_circuit.verification_key,
            &proof.proof,
            &proof.public_inputs.to_felts(),
        ) {
            tracing::warn!(rollup_id = tx.rollup_id, index, "transaction proof rejected");
            return Ok(RollupVerification::rejected());
        }
    }

    let data = rollup_proof_data(tx, cd.rollup_size);
    let raw = system.prove(&cd.circuit.proving_key, &data.encode_public_inputs())?;
    tracing::info!(
        rollup_id = tx.rollup_id,
        num_txs = tx.num_txs,
        proof_bytes = raw.len(),
        "proved inner rollup"
    );
    Ok(RollupVerification {
        verified: true,
        proof_data: data.to_proof_data(&raw),
    })
}
