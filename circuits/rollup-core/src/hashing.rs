use winterfell::math::{fields::f64::BaseElement, FieldElement};

use crate::constants::{
    ACCOUNT_DOMAIN_TAG, FIELD_MODULUS, MERKLE_DOMAIN_TAG, NOTE_DOMAIN_TAG, NULLIFIER_DOMAIN_TAG,
    POSEIDON_ROUNDS, POSEIDON_WIDTH, PUBLIC_INPUT_DOMAIN_TAG,
};

pub type Felt = BaseElement;

const SPONGE_RATE: usize = POSEIDON_WIDTH - 1;

fn round_constant(round: usize, position: usize) -> Felt {
    let r = round as u64 + 1;
    let p = position as u64 + 1;
    Felt::new(r.wrapping_mul(0x9e37_79b9) ^ p.wrapping_mul(0x7f4a_7c15))
}

/// Width-3 sponge over the x^5 permutation: two rate lanes, one capacity lane.
struct Sponge {
    state: [Felt; POSEIDON_WIDTH],
}

impl Sponge {
    fn new(domain_tag: u64) -> Self {
        Self {
            state: [Felt::new(domain_tag), Felt::ZERO, Felt::ONE],
        }
    }

    fn permute(&mut self) {
        for round in 0..POSEIDON_ROUNDS {
            for (position, lane) in self.state.iter_mut().enumerate() {
                *lane = (*lane + round_constant(round, position)).exp(5u64);
            }
            // MDS [[2,1,1],[1,2,1],[1,1,2]]: each lane gains the sum of all lanes.
            let sum = self.state.iter().fold(Felt::ZERO, |acc, lane| acc + *lane);
            for lane in self.state.iter_mut() {
                *lane += sum;
            }
        }
    }

    fn absorb(&mut self, inputs: &[Felt]) {
        for chunk in inputs.chunks(SPONGE_RATE) {
            for (lane, value) in self.state.iter_mut().zip(chunk) {
                *lane += *value;
            }
            self.permute();
        }
        // An empty absorb still permutes so no output equals a bare tag.
        if inputs.is_empty() {
            self.permute();
        }
    }

    fn squeeze(&self) -> Felt {
        self.state[0]
    }
}

fn sponge(domain_tag: u64, inputs: &[Felt]) -> Felt {
    let mut sponge = Sponge::new(domain_tag);
    sponge.absorb(inputs);
    sponge.squeeze()
}

pub fn merkle_node(left: Felt, right: Felt) -> Felt {
    sponge(MERKLE_DOMAIN_TAG, &[left, right])
}

pub fn note_commitment(value: u64, owner: Felt, secret: Felt) -> Felt {
    sponge(NOTE_DOMAIN_TAG, &[Felt::new(value), owner, secret])
}

pub fn nullifier(spending_key: Felt, note_secret: Felt) -> Felt {
    sponge(NULLIFIER_DOMAIN_TAG, &[spending_key, note_secret])
}

pub fn account_public_key(spending_key: Felt) -> Felt {
    sponge(ACCOUNT_DOMAIN_TAG, &[spending_key])
}

/// Binds a circuit identifier to an ordered public-input vector.
pub fn public_input_commitment(circuit_id: Felt, public_inputs: &[Felt]) -> Felt {
    let mut inputs = Vec::with_capacity(public_inputs.len() + 2);
    inputs.push(circuit_id);
    inputs.push(Felt::new(public_inputs.len() as u64));
    inputs.extend_from_slice(public_inputs);
    sponge(PUBLIC_INPUT_DOMAIN_TAG, &inputs)
}

/// Reduce a 32-byte digest into a field element (little-endian low limb).
pub fn felt_from_digest(digest: &[u8; 32]) -> Felt {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest[..8]);
    Felt::new(u64::from_le_bytes(buf))
}

/// Convert a field element to 32 bytes (left-padded with zeros).
/// This is the canonical serialization for every public-input word.
pub fn felt_to_bytes32(felt: Felt) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[24..32].copy_from_slice(&felt.as_int().to_be_bytes());
    out
}

/// Returns true if the 32-byte value is a canonical field encoding.
pub fn is_canonical_bytes32(bytes: &[u8; 32]) -> bool {
    if !bytes[..24].iter().all(|byte| *byte == 0) {
        return false;
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[24..32]);
    (u64::from_be_bytes(buf) as u128) < FIELD_MODULUS
}

/// Convert a canonical 32-byte encoding into a field element.
pub fn bytes32_to_felt(bytes: &[u8; 32]) -> Option<Felt> {
    if !is_canonical_bytes32(bytes) {
        return None;
    }

    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[24..32]);
    Some(Felt::new(u64::from_be_bytes(buf)))
}

pub mod serde_felt {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Felt;

    pub fn serialize<S>(value: &Felt, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_int())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Felt, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u64::deserialize(deserializer)?;
        if value as u128 >= crate::constants::FIELD_MODULUS {
            return Err(serde::de::Error::custom("non-canonical field element"));
        }
        Ok(Felt::new(value))
    }
}

pub mod serde_vec_felt {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Felt;

    pub fn serialize<S>(values: &[Felt], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut bytes = Vec::with_capacity(values.len() * 8);
        for value in values {
            bytes.extend_from_slice(&value.as_int().to_be_bytes());
        }
        serializer.serialize_bytes(&bytes)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Felt>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Deserialize::deserialize(deserializer)?;
        if bytes.len() % 8 != 0 {
            return Err(serde::de::Error::custom("invalid field encoding"));
        }
        bytes
            .chunks(8)
            .map(|chunk| {
                let mut array = [0u8; 8];
                array.copy_from_slice(chunk);
                let value = u64::from_be_bytes(array);
                if value as u128 >= crate::constants::FIELD_MODULUS {
                    return Err(serde::de::Error::custom("non-canonical field element"));
                }
                Ok(Felt::new(value))
            })
            .collect()
    }
}
