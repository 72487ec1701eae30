//! Interface between the rollup circuits and the underlying proof system.

use core::fmt;

use serde::{Deserialize, Serialize};
use winterfell::math::FieldElement;

use crate::constants::{RECURSION_OUTPUT_LEN, ROLLUP_HEADER_LEN, TX_PUBLIC_INPUTS_LEN};
use crate::error::ProofSystemError;
use crate::hashing::{serde_felt, Felt};

/// Which circuit a key pair belongs to, together with the dimensions that
/// fix its public-input layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitShape {
    Transaction,
    InnerRollup {
        rollup_size: u32,
    },
    RootRollup {
        inner_rollup_size: u32,
        rollups_per_rollup: u32,
    },
}

impl CircuitShape {
    pub fn num_public_inputs(&self) -> usize {
        match *self {
            CircuitShape::Transaction => TX_PUBLIC_INPUTS_LEN,
            CircuitShape::InnerRollup { rollup_size } => {
                ROLLUP_HEADER_LEN + rollup_size as usize * TX_PUBLIC_INPUTS_LEN
            }
            CircuitShape::RootRollup {
                inner_rollup_size,
                rollups_per_rollup,
            } => {
                ROLLUP_HEADER_LEN
                    + inner_rollup_size as usize
                        * rollups_per_rollup as usize
                        * TX_PUBLIC_INPUTS_LEN
                    + RECURSION_OUTPUT_LEN
            }
        }
    }
}

/// Running partial pairing terms accumulated while verifying proofs
/// in-circuit. Only the final output is checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursionOutput {
    #[serde(with = "serde_felt")]
    pub p0: Felt,
    #[serde(with = "serde_felt")]
    pub p1: Felt,
}

impl RecursionOutput {
    pub fn identity() -> Self {
        Self {
            p0: Felt::ZERO,
            p1: Felt::ZERO,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    pub fn to_felts(&self) -> [Felt; RECURSION_OUTPUT_LEN] {
        [self.p0, self.p1]
    }
}

impl Default for RecursionOutput {
    fn default() -> Self {
        Self::identity()
    }
}

/// A proof system able to prove and recursively verify rollup circuits.
pub trait ProofSystem {
    type ProvingKey: Clone + fmt::Debug;
    type VerificationKey: Clone + fmt::Debug;

    fn get_circuit_data(&self, shape: CircuitShape) -> CircuitData<Self>;

    fn prove(
        &self,
        proving_key: &Self::ProvingKey,
        public_inputs: &[Felt],
    ) -> Result<Vec<u8>, ProofSystemError>;

    /// Checks `proof` against `public_inputs` and folds its pairing terms
    /// into `output`. A returned output still needs `pairing_check`.
    fn verify_proof(
        &self,
        verification_key: &Self::VerificationKey,
        proof: &[u8],
        public_inputs: &[Felt],
        output: RecursionOutput,
    ) -> Result<RecursionOutput, ProofSystemError>;

    fn pairing_check(&self, output: &RecursionOutput, verification_key: &Self::VerificationKey)
        -> bool;

    /// Verifies a single proof outside any aggregation.
    fn verify(
        &self,
        verification_key: &Self::VerificationKey,
        proof: &[u8],
        public_inputs: &[Felt],
    ) -> bool {
        match self.verify_proof(
            verification_key,
            proof,
            public_inputs,
            RecursionOutput::identity(),
        ) {
            Ok(output) => self.pairing_check(&output, verification_key),
            Err(_) => false,
        }
    }
}

pub struct CircuitData<P: ProofSystem + ?Sized> {
    pub shape: CircuitShape,
    pub proving_key: P::ProvingKey,
    pub verification_key: P::VerificationKey,
}

impl<P: ProofSystem + ?Sized> CircuitData<P> {
    pub fn num_public_inputs(&self) -> usize {
        self.shape.num_public_inputs()
    }
}

impl<P: ProofSystem + ?Sized> Clone for CircuitData<P> {
    fn clone(&self) -> Self {
        Self {
            shape: self.shape,
            proving_key: self.proving_key.clone(),
            verification_key: self.verification_key.clone(),
        }
    }
}

impl<P: ProofSystem + ?Sized> fmt::Debug for CircuitData<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitData")
            .field("shape", &self.shape)
            .field("proving_key", &self.proving_key)
            .field("verification_key", &self.verification_key)
            .finish()
    }
}
