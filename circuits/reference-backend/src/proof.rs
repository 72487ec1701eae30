use bincode::Options;
use rollup_core::hashing::{serde_felt, Felt};
use rollup_core::ProofSystemError;
use serde::{Deserialize, Serialize};

/// Fixed-width little-endian encoding; a proof must use every input byte.
fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceProof {
    #[serde(with = "serde_felt")]
    pub circuit_id: Felt,
    /// Commitment to the circuit id and public inputs.
    #[serde(with = "serde_felt")]
    pub commitment: Felt,
    #[serde(with = "serde_felt")]
    pub opening: Felt,
}

impl ReferenceProof {
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProofSystemError> {
        codec().serialize(self).map_err(|err| ProofSystemError::MalformedProof(err.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProofSystemError> {
        codec().deserialize(bytes).map_err(|err| ProofSystemError::MalformedProof(err.to_string()))
    }
}
