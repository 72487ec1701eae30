use core::fmt;

use rollup_core::fixtures::compute_transaction_circuit_data;
use rollup_core::hashing::Felt;
use rollup_core::{
    CircuitData, CircuitShape, ProofSystem, PublicInputs, RollupConfig, RollupProofData,
    TxPublicInputs,
};
use winterfell::math::FieldElement;

use crate::error::RollupError;

/// Keys and dimensions of the inner rollup circuit.
pub struct RollupCircuitData<P: ProofSystem> {
    pub circuit: CircuitData<P>,
    /// Keys of the transaction circuit whose proofs the rollup consumes.
    pub tx_circuit: CircuitData<P>,
    pub rollup_size: u32,
    pub data_tree_depth: usize,
    pub null_tree_depth: usize,
    pub root_tree_depth: usize,
}

impl<P: ProofSystem> RollupCircuitData<P> {
    pub fn rollup_size(&self) -> usize {
        self.rollup_size as usize
    }
}

impl<P: ProofSystem> Clone for RollupCircuitData<P> {
    fn clone(&self) -> Self {
        Self {
            circuit: self.circuit.clone(),
            tx_circuit: self.tx_circuit.clone(),
            rollup_size: self.rollup_size,
            data_tree_depth: self.data_tree_depth,
            null_tree_depth: self.null_tree_depth,
            root_tree_depth: self.root_tree_depth,
        }
    }
}

impl<P: ProofSystem> fmt::Debug for RollupCircuitData<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollupCircuitData")
            .field("rollup_size", &self.rollup_size)
            .field("data_tree_depth", &self.data_tree_depth)
            .field("null_tree_depth", &self.null_tree_depth)
            .field("root_tree_depth", &self.root_tree_depth)
            .finish_non_exhaustive()
    }
}

pub fn compute_circuit_data<P: ProofSystem>(
    system: &P,
    config: &RollupConfig,
) -> Result<RollupCircuitData<P>, RollupError> {
    config.validate()?;
    let circuit = system.get_circuit_data(CircuitShape::InnerRollup {
        rollup_size: config.inner_rollup_size,
    });
    tracing::debug!(
        rollup_size = config.inner_rollup_size,
        public_inputs = circuit.num_public_inputs(),
        "computed inner rollup circuit data"
    );
    Ok(RollupCircuitData {
        circuit,
        tx_circuit: compute_transaction_circuit_data(system),
        rollup_size: config.inner_rollup_size,
        data_tree_depth: config.data_tree_depth,
        null_tree_depth: config.null_tree_depth,
        root_tree_depth: config.root_tree_depth,
    })
}

/// Public inputs of the canonical padding rollup: no transactions and
/// every root zero, so it moves no tree.
pub fn padding_proof_data(rollup_size: u32) -> RollupProofData {
    RollupProofData {
        header: PublicInputs {
            rollup_id: 0,
            rollup_size,
            data_start_index: 0,
            old_data_root: Felt::ZERO,
            new_data_root: Felt::ZERO,
            old_null_root: Felt::ZERO,
            new_null_root: Felt::ZERO,
            old_data_roots_root: Felt::ZERO,
            new_data_roots_root: Felt::ZERO,
            num_txs: 0,
        },
        tx_public_inputs: vec![TxPublicInputs::padding(); rollup_size as usize],
        recursion_output: None,
    }
}

/// Proves the padding rollup. The result depends only on the circuit keys.
pub fn create_padding_proof<P: ProofSystem>(
    cd: &RollupCircuitData<P>,
    system: &P,
) -> Result<Vec<u8>, RollupError> {
    let data = padding_proof_data(cd.rollup_size);
    let raw = system.prove(&cd.circuit.proving_key, &data.encode_public_inputs())?;
    Ok(data.to_proof_data(&raw))
}
