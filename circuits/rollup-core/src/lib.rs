//! Shared rollup core.
//!
//! Field and hashing primitives, the fixed public-input layouts of transaction
//! and rollup proofs, the proof-system interface the rollup circuits are
//! written against, and the deterministic fixtures used to drive them.

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod fixtures;
pub mod hashing;
pub mod proof_data;
pub mod proof_system;
pub mod transaction;

pub use cache::{compute_or_load, MemoryProofCache, ProofCache};
pub use config::RollupConfig;
pub use error::{ConfigError, ProofDataError, ProofSystemError};
pub use fixtures::{RollupContext, UserContext};
pub use hashing::Felt;
pub use proof_data::{PublicInputs, RollupProofData};
pub use proof_system::{CircuitData, CircuitShape, ProofSystem, RecursionOutput};
pub use transaction::{TransactionProof, TxPublicInputs};
