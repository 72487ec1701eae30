//! Core constants shared by the rollup circuits.

/// Number of nullifiers a transaction may consume.
pub const MAX_INPUTS: usize = 2;

/// Number of note commitments a transaction may create.
pub const MAX_OUTPUTS: usize = 2;

/// Goldilocks field modulus: 2^64 - 2^32 + 1.
pub const FIELD_MODULUS: u128 = (1u128 << 64) - (1u128 << 32) + 1;

/// Poseidon-like permutation width used by the sponge.
pub const POSEIDON_WIDTH: usize = 3;

/// Number of rounds for the poseidon-like permutation.
pub const POSEIDON_ROUNDS: usize = 8;

/// Domain separation tag for note commitments.
pub const NOTE_DOMAIN_TAG: u64 = 1;

/// Domain separation tag for nullifiers.
pub const NULLIFIER_DOMAIN_TAG: u64 = 2;

/// Domain separation tag for public-input commitments inside proofs.
pub const PUBLIC_INPUT_DOMAIN_TAG: u64 = 3;

/// Domain separation tag for Merkle tree nodes.
pub const MERKLE_DOMAIN_TAG: u64 = 4;

/// Domain separation tag for spending-key to public-key derivation.
pub const ACCOUNT_DOMAIN_TAG: u64 = 5;

/// Data tree depth (note commitments).
pub const DATA_TREE_DEPTH: usize = 32;

/// Nullifier tree depth. Covers the full canonical range of a field element.
pub const NULL_TREE_DEPTH: usize = 64;

/// Root tree depth (data-tree roots indexed by rollup id).
pub const ROOT_TREE_DEPTH: usize = 28;

/// Leaf value written into the nullifier tree for a spent note.
pub const NULLIFIER_SPENT_MARKER: u64 = 1;

/// Width of one encoded public input in proof data.
pub const PUBLIC_INPUT_WORD_BYTES: usize = 32;

/// Field elements per transaction in rollup public inputs:
/// two nullifiers, two commitments and the data-root anchor.
pub const TX_PUBLIC_INPUTS_LEN: usize = MAX_INPUTS + MAX_OUTPUTS + 1;

/// Field elements in the fixed rollup header.
pub const ROLLUP_HEADER_LEN: usize = 10;

/// Field elements in an encoded recursion output.
pub const RECURSION_OUTPUT_LEN: usize = 2;
