//! Deterministic keys, randomness and transaction proofs for building rollups
//! in tests and tooling.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::debug;

use crate::cache::{MemoryProofCache, ProofCache};
use crate::constants::{FIELD_MODULUS, MAX_INPUTS, MAX_OUTPUTS};
use crate::error::ProofSystemError;
use crate::hashing::{account_public_key, note_commitment, nullifier, Felt};
use crate::proof_system::{CircuitData, CircuitShape, ProofSystem};
use crate::transaction::{TransactionProof, TxPublicInputs};

/// Samples a uniformly random non-zero field element.
pub fn random_felt<R: RngCore>(rng: &mut R) -> Felt {
    Felt::new(rng.gen_range(1..FIELD_MODULUS as u64))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserContext {
    pub spending_key: Felt,
    pub public_key: Felt,
}

impl UserContext {
    pub fn generate<R: RngCore>(rng: &mut R) -> Self {
        let spending_key = random_felt(rng);
        Self {
            spending_key,
            public_key: account_public_key(spending_key),
        }
    }
}

/// Everything a rollup builder needs besides the trees: a seeded RNG, the
/// acting user, and a proof cache.
pub struct RollupContext {
    pub rng: ChaCha20Rng,
    pub user: UserContext,
    pub cache: Box<dyn ProofCache>,
}

impl RollupContext {
    pub fn from_seed(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let user = UserContext::generate(&mut rng);
        Self {
            rng,
            user,
            cache: Box::new(MemoryProofCache::new()),
        }
    }

    pub fn with_cache(mut self, cache: Box<dyn ProofCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn random_felt(&mut self) -> Felt {
        random_felt(&mut self.rng)
    }
}

pub fn compute_transaction_circuit_data<P: ProofSystem>(system: &P) -> CircuitData<P> {
    system.get_circuit_data(CircuitShape::Transaction)
}

/// Proves a zero-value transfer: two fresh nullifiers and two zero-value
/// output notes owned by the context user, anchored at `anchor`.
pub fn create_noop_transaction_proof<P: ProofSystem>(
    ctx: &mut RollupContext,
    system: &P,
    tx_cd: &CircuitData<P>,
    anchor: Felt,
) -> Result<TransactionProof, ProofSystemError> {
    let mut nullifiers = [Felt::new(0); MAX_INPUTS];
    for slot in nullifiers.iter_mut() {
        let note_secret = ctx.random_felt();
        *slot = nullifier(ctx.user.spending_key, note_secret);
    }
    let mut commitments = [Felt::new(0); MAX_OUTPUTS];
    for slot in commitments.iter_mut() {
        let note_secret = ctx.random_felt();
        *slot = note_commitment(0, ctx.user.public_key, note_secret);
    }
    let public_inputs = TxPublicInputs {
        nullifiers,
        commitments,
        data_root: anchor,
    };
    let proof = system.prove(&tx_cd.proving_key, &public_inputs.to_felts())?;
    debug!(
        nullifier = nullifiers[0].as_int(),
        bytes = proof.len(),
        "proved noop transaction"
    );
    Ok(TransactionProof {
        public_inputs,
        proof,
    })
}
