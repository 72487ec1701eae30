use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProofDataError {
    #[error("proof data is {actual} bytes but at least {expected} are required")]
    Truncated { expected: usize, actual: usize },
    #[error("public input word {index} is not a canonical field element")]
    NonCanonicalWord { index: usize },
    #[error("{field} value {value} does not fit in u32")]
    CountOutOfRange { field: &'static str, value: u64 },
    #[error("expected {expected} transaction entries, found {actual}")]
    EntryCountMismatch { expected: usize, actual: usize },
    #[error("rollup size {0} exceeds the supported maximum")]
    RollupSizeTooLarge(u32),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProofSystemError {
    #[error("malformed proof: {0}")]
    MalformedProof(String),
    #[error("proof was produced for a different circuit")]
    CircuitMismatch,
    #[error("circuit expects {expected} public inputs, received {actual}")]
    PublicInputCount { expected: usize, actual: usize },
    #[error("proof does not bind the supplied public inputs")]
    PublicInputMismatch,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
    #[error("{field} depth {depth} is outside 1..=64")]
    InvalidDepth { field: &'static str, depth: usize },
    #[error("rollup size {inner} * {outer} overflows u32")]
    RollupSizeOverflow { inner: u32, outer: u32 },
    #[error("data tree depth {data_tree_depth} cannot index rollup of {rollup_size} commitments")]
    DataTreeTooShallow {
        data_tree_depth: usize,
        rollup_size: u64,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
