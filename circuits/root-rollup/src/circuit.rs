use core::fmt;

use rollup_circuit::{create_padding_proof, RollupCircuitData};
use rollup_core::{CircuitData, CircuitShape, ProofSystem, RollupConfig};

use crate::error::RootRollupError;

pub struct RootRollupCircuitData<P: ProofSystem> {
    pub inner: RollupCircuitData<P>,
    pub circuit: CircuitData<P>,
    pub rollups_per_rollup: u32,
    /// Transaction slots covered by one root proof (`K * M`).
    rollup_size: u32,
    pub root_tree_depth: usize,
    /// Proof data filling every slot past `num_inner_proofs`.
    pub padding_proof: Vec<u8>,
}

impl<P: ProofSystem> RootRollupCircuitData<P> {
    pub fn inner_rollup_size(&self) -> usize {
        self.inner.rollup_size()
    }

    pub fn rollups_per_rollup(&self) -> usize {
        self.rollups_per_rollup as usize
    }

    /// Transaction slots covered by one root proof.
    pub fn rollup_size(&self) -> u32 {
        self.rollup_size
    }
}

impl<P: ProofSystem> Clone for RootRollupCircuitData<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            circuit: self.circuit.clone(),
            rollups_per_rollup: self.rollups_per_rollup,
            rollup_size: self.rollup_size,
            root_tree_depth: self.root_tree_depth,
            padding_proof: self.padding_proof.clone(),
        }
    }
}

impl<P: ProofSystem> fmt::Debug for RootRollupCircuitData<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootRollupCircuitData")
            .field("inner", &self.inner)
            .field("rollups_per_rollup", &self.rollups_per_rollup)
            .field("rollup_size", &self.rollup_size)
            .field("root_tree_depth", &self.root_tree_depth)
            .field("padding_proof_len", &self.padding_proof.len())
            .finish_non_exhaustive()
    }
}

pub fn compute_circuit_data<P: ProofSystem>(
    system: &P,
    inner: RollupCircuitData<P>,
    rollups_per_rollup: u32,
    root_tree_depth: usize,
) -> Result<RootRollupCircuitData<P>, RootRollupError> {
    if rollups_per_rollup == 0 {
        return Err(RootRollupError::NoRollupSlots);
    }
    let rollup_size = inner.rollup_size.checked_mul(rollups_per_rollup).ok_or(
        RootRollupError::RollupSizeOverflow {
            inner: inner.rollup_size,
            outer: rollups_per_rollup,
        },
    )?;
    if inner.root_tree_depth != root_tree_depth {
        return Err(RootRollupError::TreeDepthMismatch {
            tree: "root",
            expected: inner.root_tree_depth,
            actual: root_tree_depth,
        });
    }
    let circuit = system.get_circuit_data(CircuitShape::RootRollup {
        inner_rollup_size: inner.rollup_size,
        rollups_per_rollup,
    });
    let padding_proof = create_padding_proof(&inner, system)?;
    tracing::debug!(
        inner_rollup_size = inner.rollup_size,
        rollups_per_rollup,
        padding_bytes = padding_proof.len(),
        "computed root rollup circuit data"
    );
    Ok(RootRollupCircuitData {
        inner,
        circuit,
        rollups_per_rollup,
        rollup_size,
        root_tree_depth,
        padding_proof,
    })
}

/// Builds inner and root circuit data in one step from a validated config.
pub fn compute_circuit_data_from_config<P: ProofSystem>(
    system: &P,
    config: &RollupConfig,
) -> Result<RootRollupCircuitData<P>, RootRollupError> {
    let inner = rollup_circuit::compute_circuit_data(system, config)?;
    compute_circuit_data(
        system,
        inner,
        config.rollups_per_rollup,
        config.root_tree_depth,
    )
}
