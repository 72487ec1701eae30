use rollup_core::hashing::Felt;
use rollup_core::{ConfigError, ProofDataError, ProofSystemError};
use state_merkle::MerkleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RollupError {
    #[error("rollup must contain at least one transaction")]
    EmptyBatch,
    #[error("rollup of {count} transactions exceeds the circuit size {max}")]
    BatchTooLarge { count: usize, max: usize },
    #[error("{tree} tree depth {actual} does not match circuit depth {expected}")]
    TreeDepthMismatch {
        tree: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("transaction at index {index} could not be decoded: {source}")]
    InvalidTransaction {
        index: usize,
        #[source]
        source: ProofDataError,
    },
    #[error("transaction at index {index} is anchored to unknown data root {anchor:?}")]
    UnknownAnchor { index: usize, anchor: Felt },
    #[error("transaction at index {index} spends already-spent nullifier {nullifier:?}")]
    NullifierAlreadySpent { index: usize, nullifier: Felt },
    #[error("duplicate nullifier {0:?} encountered in rollup")]
    DuplicateNullifier(Felt),
    #[error("data tree index {0} does not fit in u32")]
    DataTreeIndexOverflow(u64),
    #[error("{required} data tree leaves needed but depth {depth} holds {capacity}")]
    DataTreeFull {
        required: u64,
        capacity: u64,
        depth: usize,
    },
    #[error("nullifiers {first:?} and {second:?} share nullifier tree leaf {leaf}")]
    NullifierIndexCollision { first: Felt, second: Felt, leaf: u64 },
    #[error(transparent)]
    Merkle(#[from] MerkleError),
    #[error(transparent)]
    ProofSystem(#[from] ProofSystemError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
