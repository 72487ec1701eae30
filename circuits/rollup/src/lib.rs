//! Inner rollup circuit.
//!
//! An inner rollup takes up to `K` transaction proofs, applies their
//! nullifiers and note commitments to the nullifier and data trees, and
//! produces a single proof whose public inputs carry the old and new roots
//! together with every transaction's public inputs. Unused slots hold the
//! padding transaction, which touches neither tree.

pub mod builder;
pub mod circuit;
pub mod error;
pub mod verifier;

pub use builder::{create_rollup_tx, nullifier_index, InnerRollupTx, LeafUpdate};
pub use circuit::{
    compute_circuit_data, create_padding_proof, padding_proof_data, RollupCircuitData,
};
pub use error::RollupError;
pub use verifier::{rollup_proof_data, verify_rollup, verify_rollup_logic, RollupVerification};
