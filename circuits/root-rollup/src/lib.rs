//! Root rollup circuit.
//!
//! A root rollup verifies up to `M` inner rollup proofs inside one circuit.
//! Real inner rollups come first and must chain root to root; only the last
//! may be partial, and every remaining slot holds the canonical padding
//! proof. Inner proofs are folded into a single recursion output whose
//! pairing check is deferred to the end, and the final data root is recorded
//! in the root tree at `rollup_id`.

pub mod builder;
pub mod circuit;
pub mod error;
pub mod verifier;

pub use builder::{create_root_rollup_tx, RootRollupTx};
pub use circuit::{compute_circuit_data, compute_circuit_data_from_config, RootRollupCircuitData};
pub use error::RootRollupError;
pub use verifier::{verify, verify_logic, verify_root_proof, VerificationResult};
