//! Fixed layout of rollup public inputs and the proof-data blobs built from them.
//!
//! Every public input is a 32-byte big-endian word. A rollup proof-data blob is
//! the header, then `rollup_size` transaction entries, then (root proofs only)
//! the recursion output, followed by the raw proof bytes.

use serde::{Deserialize, Serialize};
use winterfell::math::FieldElement;

use crate::constants::{
    PUBLIC_INPUT_WORD_BYTES, RECURSION_OUTPUT_LEN, ROLLUP_HEADER_LEN, TX_PUBLIC_INPUTS_LEN,
};
use crate::error::ProofDataError;
use crate::hashing::{bytes32_to_felt, felt_to_bytes32, serde_felt, Felt};
use crate::proof_system::RecursionOutput;
use crate::transaction::TxPublicInputs;

/// The rollup header shared by inner and root rollup proofs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInputs {
    pub rollup_id: u32,
    pub rollup_size: u32,
    pub data_start_index: u32,
    #[serde(with = "serde_felt")]
    pub old_data_root: Felt,
    #[serde(with = "serde_felt")]
    pub new_data_root: Felt,
    #[serde(with = "serde_felt")]
    pub old_null_root: Felt,
    #[serde(with = "serde_felt")]
    pub new_null_root: Felt,
    #[serde(with = "serde_felt")]
    pub old_data_roots_root: Felt,
    #[serde(with = "serde_felt")]
    pub new_data_roots_root: Felt,
    pub num_txs: u32,
}

impl PublicInputs {
    pub fn to_felts(&self) -> [Felt; ROLLUP_HEADER_LEN] {
        [
            Felt::new(self.rollup_id as u64),
            Felt::new(self.rollup_size as u64),
            Felt::new(self.data_start_index as u64),
            self.old_data_root,
            self.new_data_root,
            self.old_null_root,
            self.new_null_root,
            self.old_data_roots_root,
            self.new_data_roots_root,
            Felt::new(self.num_txs as u64),
        ]
    }

    pub fn from_felts(felts: &[Felt; ROLLUP_HEADER_LEN]) -> Result<Self, ProofDataError> {
        Ok(Self {
            rollup_id: felt_to_u32("rollup_id", felts[0])?,
            rollup_size: felt_to_u32("rollup_size", felts[1])?,
            data_start_index: felt_to_u32("data_start_index", felts[2])?,
            old_data_root: felts[3],
            new_data_root: felts[4],
            old_null_root: felts[5],
            new_null_root: felts[6],
            old_data_roots_root: felts[7],
            new_data_roots_root: felts[8],
            num_txs: felt_to_u32("num_txs", felts[9])?,
        })
    }
}

fn felt_to_u32(field: &'static str, felt: Felt) -> Result<u32, ProofDataError> {
    let value = felt.as_int();
    u32::try_from(value).map_err(|_| ProofDataError::CountOutOfRange { field, value })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollupProofData {
    pub header: PublicInputs,
    /// Exactly `header.rollup_size` entries; unused slots hold padding.
    pub tx_public_inputs: Vec<TxPublicInputs>,
    /// Present on root rollup proofs only.
    pub recursion_output: Option<RecursionOutput>,
}

impl RollupProofData {
    pub fn encode_public_inputs(&self) -> Vec<Felt> {
        let mut out = Vec::with_capacity(
            ROLLUP_HEADER_LEN
                + self.tx_public_inputs.len() * TX_PUBLIC_INPUTS_LEN
                + RECURSION_OUTPUT_LEN,
        );
        out.extend_from_slice(&self.header.to_felts());
        for entry in &self.tx_public_inputs {
            out.extend_from_slice(&entry.to_felts());
        }
        if let Some(output) = &self.recursion_output {
            out.extend_from_slice(&output.to_felts());
        }
        out
    }

    pub fn to_proof_data(&self, raw_proof: &[u8]) -> Vec<u8> {
        let inputs = self.encode_public_inputs();
        let mut out = Vec::with_capacity(inputs.len() * PUBLIC_INPUT_WORD_BYTES + raw_proof.len());
        for felt in inputs {
            out.extend_from_slice(&felt_to_bytes32(felt));
        }
        out.extend_from_slice(raw_proof);
        out
    }

    /// Decodes a proof-data blob, returning the structured inputs and the
    /// trailing raw proof bytes.
    pub fn from_proof_data(
        bytes: &[u8],
        has_recursion_output: bool,
    ) -> Result<(Self, Vec<u8>), ProofDataError> {
        let header_bytes = ROLLUP_HEADER_LEN * PUBLIC_INPUT_WORD_BYTES;
        if bytes.len() < header_bytes {
            return Err(ProofDataError::Truncated {
                expected: header_bytes,
                actual: bytes.len(),
            });
        }
        let mut header_felts = [Felt::ZERO; ROLLUP_HEADER_LEN];
        for (index, slot) in header_felts.iter_mut().enumerate() {
            *slot = read_word(bytes, index)?;
        }
        let header = PublicInputs::from_felts(&header_felts)?;

        let entries = header.rollup_size as usize;
        let trailer = if has_recursion_output {
            RECURSION_OUTPUT_LEN
        } else {
            0
        };
        let total_words = entries
            .checked_mul(TX_PUBLIC_INPUTS_LEN)
            .and_then(|words| words.checked_add(ROLLUP_HEADER_LEN + trailer))
            .ok_or(ProofDataError::RollupSizeTooLarge(header.rollup_size))?;
        let words_bytes = total_words
            .checked_mul(PUBLIC_INPUT_WORD_BYTES)
            .ok_or(ProofDataError::RollupSizeTooLarge(header.rollup_size))?;
        if bytes.len() < words_bytes {
            return Err(ProofDataError::Truncated {
                expected: words_bytes,
                actual: bytes.len(),
            });
        }

        let mut tx_public_inputs = Vec::with_capacity(entries);
        let mut entry = [Felt::ZERO; TX_PUBLIC_INPUTS_LEN];
        for slot in 0..entries {
            let base = ROLLUP_HEADER_LEN + slot * TX_PUBLIC_INPUTS_LEN;
            for (offset, value) in entry.iter_mut().enumerate() {
                *value = read_word(bytes, base + offset)?;
            }
            tx_public_inputs.push(TxPublicInputs::from_felts(&entry).ok_or(
                ProofDataError::EntryCountMismatch {
                    expected: entries,
                    actual: slot,
                },
            )?);
        }

        let recursion_output = if has_recursion_output {
            let base = ROLLUP_HEADER_LEN + entries * TX_PUBLIC_INPUTS_LEN;
            Some(RecursionOutput {
                p0: read_word(bytes, base)?,
                p1: read_word(bytes, base + 1)?,
            })
        } else {
            None
        };

        Ok((
            Self {
                header,
                tx_public_inputs,
                recursion_output,
            },
            bytes[words_bytes..].to_vec(),
        ))
    }

    /// Number of note commitments the real transactions append to the data tree.
    pub fn commitment_count(&self) -> usize {
        self.tx_public_inputs
            .iter()
            .map(|entry| entry.active_commitments().count())
            .sum()
    }
}

fn read_word(bytes: &[u8], index: usize) -> Result<Felt, ProofDataError> {
    let start = index * PUBLIC_INPUT_WORD_BYTES;
    let mut word = [0u8; PUBLIC_INPUT_WORD_BYTES];
    word.copy_from_slice(&bytes[start..start + PUBLIC_INPUT_WORD_BYTES]);
    bytes32_to_felt(&word).ok_or(ProofDataError::NonCanonicalWord { index })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(rollup_size: u32) -> PublicInputs {
        PublicInputs {
            rollup_id: 4,
            rollup_size,
            data_start_index: 8,
            old_data_root: Felt::new(1),
            new_data_root: Felt::new(2),
            old_null_root: Felt::new(3),
            new_null_root: Felt::new(4),
            old_data_roots_root: Felt::new(5),
            new_data_roots_root: Felt::new(6),
            num_txs: 1,
        }
    }

    fn inner_data() -> RollupProofData {
        let mut real = TxPublicInputs::padding();
        real.nullifiers[0] = Felt::new(77);
        real.commitments = [Felt::new(10), Felt::new(11)];
        real.data_root = Felt::new(1);
        RollupProofData {
            header: header(2),
            tx_public_inputs: vec![real, TxPublicInputs::padding()],
            recursion_output: None,
        }
    }

    #[test]
    fn inner_proof_data_decodes_with_trailing_proof() {
        let data = inner_data();
        let blob = data.to_proof_data(b"raw-proof");
        assert_eq!(blob.len(), (10 + 2 * 5) * 32 + 9);
        let (decoded, raw) = RollupProofData::from_proof_data(&blob, false).expect("decode");
        assert_eq!(decoded, data);
        assert_eq!(raw, b"raw-proof");
        assert_eq!(decoded.commitment_count(), 2);
    }

    #[test]
    fn root_proof_data_carries_recursion_output() {
        let mut data = inner_data();
        data.recursion_output = Some(RecursionOutput {
            p0: Felt::new(123),
            p1: Felt::new(456),
        });
        let blob = data.to_proof_data(&[]);
        let (decoded, raw) = RollupProofData::from_proof_data(&blob, true).expect("decode");
        assert_eq!(decoded.recursion_output, data.recursion_output);
        assert!(raw.is_empty());
    }

    #[test]
    fn counts_must_fit_u32() {
        let data = inner_data();
        let mut blob = data.to_proof_data(&[]);
        // rollup_id word: push a value above u32::MAX into the low limb.
        blob[24..32].copy_from_slice(&(u32::MAX as u64 + 1).to_be_bytes());
        assert!(matches!(
            RollupProofData::from_proof_data(&blob, false),
            Err(ProofDataError::CountOutOfRange {
                field: "rollup_id",
                ..
            })
        ));
    }

    #[test]
    fn truncated_entries_are_rejected() {
        let blob = inner_data().to_proof_data(&[]);
        assert!(matches!(
            RollupProofData::from_proof_data(&blob[..blob.len() - 32], false),
            Err(ProofDataError::Truncated { .. })
        ));
        assert!(matches!(
            RollupProofData::from_proof_data(&blob[..64], false),
            Err(ProofDataError::Truncated { .. })
        ));
    }
}
