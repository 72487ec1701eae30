//! Deterministic development proof system.
//!
//! Proofs bind a circuit identifier to a public-input vector and carry an
//! opening scaled by the circuit's secret `tau`. Verification folds each
//! proof into a [`RecursionOutput`] with a Fiat-Shamir weight; the deferred
//! check `p0 * tau == p1` then covers every folded proof at once, mirroring a
//! KZG-style accumulated pairing check. This is neither zero-knowledge nor
//! sound against anyone holding the CRS seed; it exists so the rollup
//! pipeline runs end to end without a production SNARK.

pub mod keys;
pub mod proof;

use rollup_core::hashing::{felt_from_digest, public_input_commitment, Felt};
use rollup_core::{CircuitData, CircuitShape, ProofSystem, ProofSystemError, RecursionOutput};
use tracing::trace;
use winterfell::math::FieldElement;

pub use keys::{generate_keys, ReferenceProvingKey, ReferenceVerificationKey};
pub use proof::ReferenceProof;

const TRANSCRIPT_CONTEXT: &str = "rollup reference backend 2024 transcript";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceProofSystem {
    crs_seed: [u8; 32],
}

impl ReferenceProofSystem {
    pub fn new(crs_seed: [u8; 32]) -> Self {
        Self { crs_seed }
    }
}

impl Default for ReferenceProofSystem {
    fn default() -> Self {
        Self::new([0x5a; 32])
    }
}

fn challenge(output: &RecursionOutput, proof: &ReferenceProof) -> Felt {
    let mut hasher = blake3::Hasher::new_derive_key(TRANSCRIPT_CONTEXT);
    for felt in [
        output.p0,
        output.p1,
        proof.circuit_id,
        proof.commitment,
        proof.opening,
    ] {
        hasher.update(&felt.as_int().to_le_bytes());
    }
    let r = felt_from_digest(hasher.finalize().as_bytes());
    if r == Felt::ZERO {
        Felt::ONE
    } else {
        r
    }
}

impl ProofSystem for ReferenceProofSystem {
    type ProvingKey = ReferenceProvingKey;
    type VerificationKey = ReferenceVerificationKey;

    fn get_circuit_data(&self, shape: CircuitShape) -> CircuitData<Self> {
        let (proving_key, verification_key) = generate_keys(&self.crs_seed, shape);
        CircuitData {
            shape,
            proving_key,
            verification_key,
        }
    }

    fn prove(
        &self,
        proving_key: &ReferenceProvingKey,
        public_inputs: &[Felt],
    ) -> Result<Vec<u8>, ProofSystemError> {
        let expected = proving_key.shape.num_public_inputs();
        if public_inputs.len() != expected {
            return Err(ProofSystemError::PublicInputCount {
                expected,
                actual: public_inputs.len(),
            });
        }
        let commitment = public_input_commitment(proving_key.circuit_id, public_inputs);
        let proof = ReferenceProof {
            circuit_id: proving_key.circuit_id,
            commitment,
            opening: proving_key.tau * commitment,
        };
        proof.to_bytes()
    }

    fn verify_proof(
        &self,
        verification_key: &ReferenceVerificationKey,
        proof: &[u8],
        public_inputs: &[Felt],
        output: RecursionOutput,
    ) -> Result<RecursionOutput, ProofSystemError> {
        let proof = ReferenceProof::from_bytes(proof)?;
        if proof.circuit_id != verification_key.circuit_id {
            return Err(ProofSystemError::CircuitMismatch);
        }
        let expected = verification_key.shape.num_public_inputs();
        if public_inputs.len() != expected {
            return Err(ProofSystemError::PublicInputCount {
                expected,
                actual: public_inputs.len(),
            });
        }
        if public_input_commitment(proof.circuit_id, public_inputs) != proof.commitment {
            return Err(ProofSystemError::PublicInputMismatch);
        }
        let r = challenge(&output, &proof);
        trace!(shape = ?verification_key.shape, "folded proof into recursion output");
        Ok(RecursionOutput {
            p0: output.p0 + r * proof.commitment,
            p1: output.p1 + r * proof.opening,
        })
    }

    fn pairing_check(
        &self,
        output: &RecursionOutput,
        verification_key: &ReferenceVerificationKey,
    ) -> bool {
        !output.is_identity() && output.p0 * verification_key.tau == output.p1
    }
}
