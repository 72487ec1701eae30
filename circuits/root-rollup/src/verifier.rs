use rollup_core::{ProofSystem, PublicInputs, RecursionOutput, RollupProofData};
use serde::{Deserialize, Serialize};

use crate::builder::RootRollupTx;
use crate::circuit::RootRollupCircuitData;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
    /// Root public inputs followed by the root proof; empty when not verified.
    pub proof_data: Vec<u8>,
    /// Populated when verified.
    pub public_inputs: Option<PublicInputs>,
}

impl VerificationResult {
    fn rejected() -> Self {
        Self {
            verified: false,
            proof_data: Vec::new(),
            public_inputs: None,
        }
    }
}

fn decode_slots(tx: &RootRollupTx) -> Option<Vec<(RollupProofData, Vec<u8>)>> {
    tx.rollups
        .iter()
        .enumerate()
        .map(|(slot, bytes)| match RollupProofData::from_proof_data(bytes, false) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                tracing::warn!(slot, error = %err, "undecodable inner rollup proof");
                None
            }
        })
        .collect()
}

/// Structural checks on a root rollup. No proof is verified.
pub fn verify_logic<P: ProofSystem>(tx: &RootRollupTx, cd: &RootRollupCircuitData<P>) -> bool {
    check_logic(tx, cd).is_some()
}

/// Runs the structural checks and hands back the decoded slots on success.
fn check_logic<P: ProofSystem>(
    tx: &RootRollupTx,
    cd: &RootRollupCircuitData<P>,
) -> Option<Vec<(RollupProofData, Vec<u8>)>> {
    let rollup_id = tx.rollup_id;
    let capacity = cd.rollups_per_rollup();
    let inner_size = cd.inner_rollup_size();
    if tx.rollups.len() != capacity {
        tracing::warn!(rollup_id, slots = tx.rollups.len(), capacity, "wrong number of slots");
        return None;
    }
    let num_real = tx.num_inner_proofs as usize;
    if num_real == 0 || num_real > capacity {
        tracing::warn!(rollup_id, num_real, capacity, "num_inner_proofs out of range");
        return None;
    }
    let slots = decode_slots(tx)?;
    let real = &slots[..num_real];
    for (slot, (data, _)) in real.iter().enumerate() {
        if data.header.rollup_size as usize != inner_size {
            tracing::warn!(
                rollup_id,
                slot,
                rollup_size = data.header.rollup_size,
                "inner rollup has wrong size"
            );
            return None;
        }
        if data.header.num_txs == 0 || data.header.num_txs as usize > inner_size {
            tracing::warn!(
                rollup_id,
                slot,
                num_txs = data.header.num_txs,
                "inner rollup tx count out of range"
            );
            return None;
        }
        if data.header.old_data_roots_root != tx.old_data_roots_root {
            tracing::warn!(rollup_id, slot, "inner rollup built against a different root tree");
            return None;
        }
    }

    // Chaining across consecutive real rollups.
    for (slot, pair) in real.windows(2).enumerate() {
        let (prev, next) = (&pair[0].0, &pair[1].0);
        if next.header.old_data_root != prev.header.new_data_root {
            tracing::warn!(rollup_id, slot = slot + 1, "data root chain broken");
            return None;
        }
        if next.header.old_null_root != prev.header.new_null_root {
            tracing::warn!(rollup_id, slot = slot + 1, "nullifier root chain broken");
            return None;
        }
        let expected_start = prev.header.data_start_index as u64 + prev.commitment_count() as u64;
        if next.header.data_start_index as u64 != expected_start {
            tracing::warn!(
                rollup_id,
                slot = slot + 1,
                data_start_index = next.header.data_start_index,
                expected_start,
                "data start index is not contiguous"
            );
            return None;
        }
    }

    // Only the last real rollup may be partial.
    for (slot, (data, _)) in real[..num_real - 1].iter().enumerate() {
        if data.header.num_txs as usize != inner_size {
            tracing::warn!(
                rollup_id,
                slot,
                num_txs = data.header.num_txs,
                "partial inner rollup is not last"
            );
            return None;
        }
    }

    let root_depth = cd.root_tree_depth;
    let path = &tx.new_data_roots_path;
    let index = rollup_id as u64;
    if path.depth() != root_depth {
        tracing::warn!(
            rollup_id,
            depth = path.depth(),
            root_depth,
            "root tree path has wrong depth"
        );
        return None;
    }
    if path.compute_root(tx.old_data_roots_leaf, index) != tx.old_data_roots_root {
        tracing::warn!(rollup_id, "root tree path does not open old_data_roots_root");
        return None;
    }
    let last_new_data_root = real[num_real - 1].0.header.new_data_root;
    if path.compute_root(last_new_data_root, index) != tx.new_data_roots_root {
        tracing::warn!(rollup_id, "new_data_roots_root does not record the final data root");
        return None;
    }

    for (slot, bytes) in tx.rollups.iter().enumerate().skip(num_real) {
        if *bytes != cd.padding_proof {
            tracing::warn!(rollup_id, slot, "slot past num_inner_proofs is not padding");
            return None;
        }
    }
    Some(slots)
}

/// Root public inputs for a logically valid transaction whose inner proofs
/// folded into `output`.
fn root_proof_data(
    tx: &RootRollupTx,
    slots: &[(RollupProofData, Vec<u8>)],
    rollup_size: u32,
    output: RecursionOutput,
) -> RollupProofData {
    let real = &slots[..tx.num_inner_proofs as usize];
    let first = &real[0].0.header;
    let last = &real[real.len() - 1].0.header;
    let num_txs = real.iter().map(|(data, _)| data.header.num_txs).sum();
    RollupProofData {
        header: PublicInputs {
            rollup_id: tx.rollup_id,
            rollup_size,
            data_start_index: first.data_start_index,
            old_data_root: first.old_data_root,
            new_data_root: last.new_data_root,
            old_null_root: first.old_null_root,
            new_null_root: last.new_null_root,
            old_data_roots_root: tx.old_data_roots_root,
            new_data_roots_root: tx.new_data_roots_root,
            num_txs,
        },
        tx_public_inputs: slots
            .iter()
            .flat_map(|(data, _)| data.tx_public_inputs.iter().copied())
            .collect(),
        recursion_output: Some(output),
    }
}

/// Logic checks, then the recursive verification of every slot and the proof
/// of the root circuit.
pub fn verify<P: ProofSystem>(
    tx: &RootRollupTx,
    cd: &RootRollupCircuitData<P>,
    system: &P,
) -> VerificationResult {
    let Some(slots) = check_logic(tx, cd) else {
        return VerificationResult::rejected();
    };

    let inner_vk = &cd.inner.circuit.verification_key;
    let mut output = RecursionOutput::identity();
    for (slot, (data, raw)) in slots.iter().enumerate() {
        output = match system.verify_proof(inner_vk, raw, &data.encode_public_inputs(), output) {
            Ok(next) => next,
            Err(err) => {
                tracing::warn!(
                    rollup_id = tx.rollup_id,
                    slot,
                    error = %err,
                    "inner rollup proof rejected"
                );
                return VerificationResult::rejected();
            }
        };
        tracing::debug!(rollup_id = tx.rollup_id, slot, "folded inner rollup proof");
    }
    if !system.pairing_check(&output, inner_vk) {
        tracing::warn!(rollup_id = tx.rollup_id, "deferred pairing check failed");
        return VerificationResult::rejected();
    }

    let data = root_proof_data(tx, &slots, cd.rollup_size(), output);
    let public_inputs = data.encode_public_inputs();
    let raw = match system.prove(&cd.circuit.proving_key, &public_inputs) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(rollup_id = tx.rollup_id, error = %err, "root rollup proving failed");
            return VerificationResult::rejected();
        }
    };
    if !system.verify(&cd.circuit.verification_key, &raw, &public_inputs) {
        tracing::warn!(rollup_id = tx.rollup_id, "root rollup proof rejected");
        return VerificationResult::rejected();
    }

    tracing::info!(
        rollup_id = tx.rollup_id,
        num_txs = data.header.num_txs,
        rollup_size = data.header.rollup_size,
        "verified root rollup"
    );
    VerificationResult {
        verified: true,
        proof_data: data.to_proof_data(&raw),
        public_inputs: Some(data.header),
    }
}

/// Checks a published root proof: the root circuit proof over its public
/// inputs, and the deferred pairing check on the recursion output it carries.
pub fn verify_root_proof<P: ProofSystem>(
    proof_data: &[u8],
    cd: &RootRollupCircuitData<P>,
    system: &P,
) -> Option<PublicInputs> {
    let (data, raw) = match RollupProofData::from_proof_data(proof_data, true) {
        Ok(decoded) => decoded,
        Err(err) => {
            tracing::warn!(error = %err, "undecodable root rollup proof");
            return None;
        }
    };
    if data.header.rollup_size != cd.rollup_size() {
        tracing::warn!(rollup_size = data.header.rollup_size, "root rollup has wrong size");
        return None;
    }
    let output = data.recursion_output?;
    if !system.pairing_check(&output, &cd.inner.circuit.verification_key) {
        tracing::warn!("root rollup recursion output fails pairing check");
        return None;
    }
    if !system.verify(
        &cd.circuit.verification_key,
        &raw,
        &data.encode_public_inputs(),
    ) {
        tracing::warn!("root rollup proof rejected");
        return None;
    }
    Some(data.header)
}
