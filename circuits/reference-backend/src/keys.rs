use rollup_core::hashing::{felt_from_digest, serde_felt, Felt};
use rollup_core::CircuitShape;
use serde::{Deserialize, Serialize};
use winterfell::math::FieldElement;

const CIRCUIT_ID_CONTEXT: &str = "rollup reference backend 2024 circuit id";
const TAU_CONTEXT: &str = "rollup reference backend 2024 tau";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceProvingKey {
    pub shape: CircuitShape,
    #[serde(with = "serde_felt")]
    pub circuit_id: Felt,
    #[serde(with = "serde_felt")]
    pub tau: Felt,
}

/// Verification key. `tau` stands in for the trusted-setup element the
/// pairing check is taken against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceVerificationKey {
    pub shape: CircuitShape,
    #[serde(with = "serde_felt")]
    pub circuit_id: Felt,
    #[serde(with = "serde_felt")]
    pub tau: Felt,
}

fn shape_bytes(shape: CircuitShape) -> Vec<u8> {
    let mut out = Vec::with_capacity(9);
    match shape {
        CircuitShape::Transaction => out.push(0),
        CircuitShape::InnerRollup { rollup_size } => {
            out.push(1);
            out.extend_from_slice(&rollup_size.to_le_bytes());
        }
        CircuitShape::RootRollup {
            inner_rollup_size,
            rollups_per_rollup,
        } => {
            out.push(2);
            out.extend_from_slice(&inner_rollup_size.to_le_bytes());
            out.extend_from_slice(&rollups_per_rollup.to_le_bytes());
        }
    }
    out
}

fn derive_felt(context: &str, crs_seed: &[u8; 32], shape: CircuitShape) -> Felt {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(crs_seed);
    hasher.update(&shape_bytes(shape));
    let value = felt_from_digest(hasher.finalize().as_bytes());
    if value == Felt::ZERO {
        Felt::ONE
    } else {
        value
    }
}

pub fn generate_keys(
    crs_seed: &[u8; 32],
    shape: CircuitShape,
) -> (ReferenceProvingKey, ReferenceVerificationKey) {
    let circuit_id = derive_felt(CIRCUIT_ID_CONTEXT, crs_seed, shape);
    let tau = derive_felt(TAU_CONTEXT, crs_seed, shape);
    let proving = ReferenceProvingKey {
        shape,
        circuit_id,
        tau,
    };
    let verifying = ReferenceVerificationKey {
        shape,
        circuit_id,
        tau,
    };
    (proving, verifying)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_depend_on_seed_and_shape() {
        let inner = CircuitShape::InnerRollup { rollup_size: 2 };
        let (pk, vk) = generate_keys(&[1u8; 32], inner);
        assert_eq!(pk.circuit_id, vk.circuit_id);
        assert_eq!(pk.tau, vk.tau);
        assert_eq!(generate_keys(&[1u8; 32], inner).1, vk);
        assert_ne!(generate_keys(&[2u8; 32], inner).1.circuit_id, vk.circuit_id);
        assert_ne!(
            generate_keys(&[1u8; 32], CircuitShape::InnerRollup { rollup_size: 4 })
                .1
                .circuit_id,
            vk.circuit_id
        );
    }
}
