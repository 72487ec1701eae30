//! Transaction proof blobs as they enter an inner rollup.

use winterfell::math::FieldElement;

use crate::constants::{MAX_INPUTS, MAX_OUTPUTS, PUBLIC_INPUT_WORD_BYTES, TX_PUBLIC_INPUTS_LEN};
use crate::error::ProofDataError;
use crate::hashing::{bytes32_to_felt, felt_to_bytes32, Felt};

/// Public inputs of a single transaction proof.
///
/// A zero nullifier or commitment slot means the transaction does not use it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxPublicInputs {
    pub nullifiers: [Felt; MAX_INPUTS],
    pub commitments: [Felt; MAX_OUTPUTS],
    /// Data tree root the transaction's input notes were proven against.
    pub data_root: Felt,
}

impl TxPublicInputs {
    /// The fixed no-op entry used for unused rollup slots.
    pub fn padding() -> Self {
        Self {
            nullifiers: [Felt::ZERO; MAX_INPUTS],
            commitments: [Felt::ZERO; MAX_OUTPUTS],
            data_root: Felt::ZERO,
        }
    }

    pub fn is_padding(&self) -> bool {
        *self == Self::padding()
    }

    pub fn active_nullifiers(&self) -> impl Iterator<Item = Felt> + '_ {
        self.nullifiers.iter().copied().filter(|n| *n != Felt::ZERO)
    }

    pub fn active_commitments(&self) -> impl Iterator<Item = Felt> + '_ {
        self.commitments.iter().copied().filter(|c| *c != Felt::ZERO)
    }

    pub fn to_felts(&self) -> [Felt; TX_PUBLIC_INPUTS_LEN] {
        let mut out = [Felt::ZERO; TX_PUBLIC_INPUTS_LEN];
        out[..MAX_INPUTS].copy_from_slice(&self.nullifiers);
        out[MAX_INPUTS..MAX_INPUTS + MAX_OUTPUTS].copy_from_slice(&self.commitments);
        out[MAX_INPUTS + MAX_OUTPUTS] = self.data_root;
        out
    }

    /// Reads one entry from the front of `felts`.
    pub fn from_felts(felts: &[Felt]) -> Option<Self> {
        if felts.len() < TX_PUBLIC_INPUTS_LEN {
            return None;
        }
        let mut nullifiers = [Felt::ZERO; MAX_INPUTS];
        nullifiers.copy_from_slice(&felts[..MAX_INPUTS]);
        let mut commitments = [Felt::ZERO; MAX_OUTPUTS];
        commitments.copy_from_slice(&felts[MAX_INPUTS..MAX_INPUTS + MAX_OUTPUTS]);
        Some(Self {
            nullifiers,
            commitments,
            data_root: felts[MAX_INPUTS + MAX_OUTPUTS],
        })
    }
}

impl Default for TxPublicInputs {
    fn default() -> Self {
        Self::padding()
    }
}

/// A proven transaction: its public inputs followed by the raw proof bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionProof {
    pub public_inputs: TxPublicInputs,
    pub proof: Vec<u8>,
}

impl TransactionProof {
    pub fn padding() -> Self {
        Self {
            public_inputs: TxPublicInputs::padding(),
            proof: Vec::new(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(TX_PUBLIC_INPUTS_LEN * PUBLIC_INPUT_WORD_BYTES + self.proof.len());
        for felt in self.public_inputs.to_felts() {
            out.extend_from_slice(&felt_to_bytes32(felt));
        }
        out.extend_from_slice(&self.proof);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProofDataError> {
        let header_len = TX_PUBLIC_INPUTS_LEN * PUBLIC_INPUT_WORD_BYTES;
        if bytes.len() < header_len {
            return Err(ProofDataError::Truncated {
                expected: header_len,
                actual: bytes.len(),
            });
        }
        let mut felts = [Felt::ZERO; TX_PUBLIC_INPUTS_LEN];
        for (index, (slot, word)) in felts
            .iter_mut()
            .zip(bytes[..header_len].chunks_exact(PUBLIC_INPUT_WORD_BYTES))
            .enumerate()
        {
            let mut buf = [0u8; 32];
            buf.copy_from_slice(word);
            *slot = bytes32_to_felt(&buf).ok_or(ProofDataError::NonCanonicalWord { index })?;
        }
        let public_inputs =
            TxPublicInputs::from_felts(&felts).ok_or(ProofDataError::Truncated {
                expected: header_len,
                actual: bytes.len(),
            })?;
        Ok(Self {
            public_inputs,
            proof: bytes[header_len..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TransactionProof {
        TransactionProof {
            public_inputs: TxPublicInputs {
                nullifiers: [Felt::new(11), Felt::ZERO],
                commitments: [Felt::new(21), Felt::new(22)],
                data_root: Felt::new(99),
            },
            proof: vec![1, 2, 3, 4],
        }
    }

    #[test]
    fn blob_keeps_words_then_proof() {
        let proof = sample();
        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), TX_PUBLIC_INPUTS_LEN * 32 + 4);
        assert_eq!(&bytes[bytes.len() - 4..], &[1, 2, 3, 4]);
        assert_eq!(TransactionProof::from_bytes(&bytes).expect("decode"), proof);
    }

    #[test]
    fn active_slots_skip_zero() {
        let inputs = sample().public_inputs;
        assert_eq!(inputs.active_nullifiers().count(), 1);
        assert_eq!(inputs.active_commitments().count(), 2);
        assert!(TxPublicInputs::padding().is_padding());
        assert!(!inputs.is_padding());
    }

    #[test]
    fn short_or_non_canonical_blobs_are_rejected() {
        let bytes = sample().to_bytes();
        assert!(matches!(
            TransactionProof::from_bytes(&bytes[..100]),
            Err(ProofDataError::Truncated { .. })
        ));
        let mut tampered = bytes.clone();
        tampered[32] = 0xff;
        assert_eq!(
            TransactionProof::from_bytes(&tampered),
            Err(ProofDataError::NonCanonicalWord { index: 1 })
        );
    }
}
