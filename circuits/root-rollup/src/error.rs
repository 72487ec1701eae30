use rollup_circuit::RollupError;
use rollup_core::{ProofDataError, ProofSystemError};
use state_merkle::MerkleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RootRollupError {
    #[error("root rollup must contain at least one inner rollup proof")]
    EmptyBatch,
    #[error("{count} inner rollup proofs exceed the {max} slots of the root circuit")]
    TooManyRollups { count: usize, max: usize },
    #[error("root circuit needs at least one inner rollup slot")]
    NoRollupSlots,
    #[error("root rollup size {inner} * {outer} overflows u32")]
    RollupSizeOverflow { inner: u32, outer: u32 },
    #[error("{tree} tree depth {actual} does not match circuit depth {expected}")]
    TreeDepthMismatch {
        tree: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("inner rollup proof at index {index} could not be decoded: {source}")]
    InvalidRollupProof {
        index: usize,
        #[source]
        source: ProofDataError,
    },
    #[error("failed to encode root rollup transaction: {0}")]
    Codec(#[from] bincode::Error),
    #[error(transparent)]
    Merkle(#[from] MerkleError),
    #[error(transparent)]
    ProofSystem(#[from] ProofSystemError),
    #[error(transparent)]
    Rollup(#[from] RollupError),
}
